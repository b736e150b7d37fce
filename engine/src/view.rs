//! View models produced by the renderer and drawn by the front end.
//!
//! Nothing here knows about terminals. A front end walks a [`Screen`] and
//! decides how each piece looks.

use bulwark_types::{BuildMode, PageContent, RoutePath, SegmentId};

use crate::recovery::RecoveryHandle;

/// A user action exposed by a fallback view.
#[derive(Debug, Clone)]
pub enum FallbackAction {
    /// Ask the renderer to discard and remount the faulted content.
    Retry(RecoveryHandle),
    /// Soft navigation through the shell's router.
    Navigate(RoutePath),
    /// Tear down the whole document and mount the route from scratch.
    HardReload(RoutePath),
    /// External contact link (mail address).
    Contact(String),
}

impl FallbackAction {
    #[must_use]
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry(_))
    }

    #[must_use]
    pub fn route(&self) -> Option<&RoutePath> {
        match self {
            Self::Navigate(route) | Self::HardReload(route) => Some(route),
            Self::Retry(_) | Self::Contact(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionView {
    pub label: &'static str,
    pub action: FallbackAction,
}

impl ActionView {
    pub(crate) fn new(label: &'static str, action: FallbackAction) -> Self {
        Self { label, action }
    }
}

/// Raw diagnostics; only ever built in development mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    Error(String),
    Digest(String),
    Trace(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Error,
    Critical,
}

/// Body of an error boundary's fallback.
#[derive(Debug, Clone)]
pub struct FallbackView {
    pub tone: Tone,
    pub title: &'static str,
    pub description: &'static str,
    pub details: Vec<Detail>,
    pub actions: Vec<ActionView>,
    /// Support line, e.g. "Need help? Contact Support <support@example.com>".
    pub footer: Option<String>,
}

impl FallbackView {
    /// Every user-visible string, in display order.
    #[must_use]
    pub fn text(&self) -> Vec<String> {
        let mut out = vec![self.title.to_string(), self.description.to_string()];
        for detail in &self.details {
            match detail {
                Detail::Error(message) => out.push(format!("Error: {message}")),
                Detail::Digest(digest) => out.push(format!("Digest: {digest}")),
                Detail::Trace(lines) => out.extend(lines.iter().cloned()),
            }
        }
        out.extend(self.actions.iter().map(|action| action.label.to_string()));
        out.extend(self.footer.iter().cloned());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHead {
    pub title: &'static str,
    pub lang: &'static str,
}

/// Standalone document rendered by the root boundary.
///
/// Carries its own head and body; a front end must draw it without any shell
/// chrome, theme, or navigation state.
#[derive(Debug, Clone)]
pub struct RootDocument {
    pub head: DocumentHead,
    pub body: FallbackView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderView {
    pub title: String,
    pub subtitle: String,
    /// Monotonic animation phase; the front end maps it to a spinner frame.
    pub phase: usize,
}

#[derive(Debug, Clone)]
pub struct NotFoundPage {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub primary: ActionView,
    pub secondary: Vec<ActionView>,
}

impl NotFoundPage {
    /// Primary action first, then secondary ones.
    pub fn actions(&self) -> impl Iterator<Item = &ActionView> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }
}

/// Navigation and chrome supplied by the application shell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellContext {
    pub title: String,
    pub nav: Vec<NavLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub hotkey: char,
    pub label: String,
    pub route: RoutePath,
}

#[derive(Debug, Clone)]
pub enum SlotBody {
    Content(PageContent),
    Loading(PlaceholderView),
    NotFound(NotFoundPage),
    Fallback(FallbackView),
}

#[derive(Debug, Clone)]
pub struct SlotView {
    /// `None` when the route matched no segments at all.
    pub segment: Option<SegmentId>,
    pub route: RoutePath,
    /// Nesting depth in the mounted tree (root segment is 0).
    pub depth: usize,
    pub body: SlotBody,
}

#[derive(Debug, Clone)]
pub struct DocumentView {
    pub route: RoutePath,
    pub build_mode: BuildMode,
    pub shell: ShellContext,
    pub slots: Vec<SlotView>,
}

/// Output tree of one render pass.
#[derive(Debug, Clone)]
pub enum Screen {
    Document(DocumentView),
    RootFallback(RootDocument),
}

impl Screen {
    /// Actions in display order, for front ends that number them.
    #[must_use]
    pub fn actions(&self) -> Vec<&ActionView> {
        let document = match self {
            Self::RootFallback(document) => return document.body.actions.iter().collect(),
            Self::Document(document) => document,
        };

        let mut actions = Vec::new();
        for slot in &document.slots {
            match &slot.body {
                SlotBody::Fallback(view) => actions.extend(view.actions.iter()),
                SlotBody::NotFound(page) => actions.extend(page.actions()),
                SlotBody::Content(_) | SlotBody::Loading(_) => {}
            }
        }
        actions
    }

    /// Flattened visible text, used by tests and accessibility output.
    #[must_use]
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        match self {
            Self::RootFallback(document) => {
                lines.push(document.head.title.to_string());
                lines.extend(document.body.text());
            }
            Self::Document(document) => {
                lines.push(document.shell.title.clone());
                for slot in &document.slots {
                    match &slot.body {
                        SlotBody::Content(content) => {
                            lines.push(content.title.clone());
                            lines.extend(content.body.iter().cloned());
                        }
                        SlotBody::Loading(view) => {
                            lines.push(view.title.clone());
                            lines.push(view.subtitle.clone());
                        }
                        SlotBody::NotFound(page) => {
                            lines.push(page.code.to_string());
                            lines.push(page.title.to_string());
                            lines.push(page.description.to_string());
                            lines.extend(page.actions().map(|action| action.label.to_string()));
                        }
                        SlotBody::Fallback(view) => lines.extend(view.text()),
                    }
                }
            }
        }
        lines.join("\n")
    }
}
