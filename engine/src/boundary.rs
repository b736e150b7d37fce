//! The two error boundaries.
//!
//! [`SubtreeErrorBoundary`] replaces one segment's subtree and leans on the
//! shell for navigation. [`RootErrorBoundary`] replaces the whole document and
//! leans on nothing, so it still renders when the shell itself is broken.

use thiserror::Error;

use bulwark_types::{BuildMode, FaultRecord, RoutePath, sanitize_terminal_text};

use crate::recovery::RecoveryHandle;
use crate::view::{
    ActionView, Detail, DocumentHead, FallbackAction, FallbackView, RootDocument, ShellContext,
    Tone,
};

const SUBTREE_TITLE: &str = "Oops! Something went wrong";
const SUBTREE_DESCRIPTION: &str =
    "We encountered an unexpected error. This has been logged and we'll look into it.";

const ROOT_TITLE: &str = "Critical Application Error";
const ROOT_DESCRIPTION: &str = "A critical error occurred that prevented the application from loading. Please try refreshing the page.";

pub const TRY_AGAIN: &str = "Try Again";
pub const GO_HOME: &str = "Go Home";
pub const RELOAD_APPLICATION: &str = "Reload Application";
pub const CONTACT_SUPPORT: &str = "Contact Support";

#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The shell's navigation/styling context could not be obtained.
    #[error("shell context unavailable")]
    ShellUnavailable,
}

/// Static support contact shown in production fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SupportContact {
    pub email: Option<String>,
}

impl SupportContact {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
        }
    }

    fn footer(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|email| format!("Need help? {CONTACT_SUPPORT} <{email}>"))
    }

    fn action(&self) -> Option<ActionView> {
        self.email.as_ref().map(|email| {
            ActionView::new(CONTACT_SUPPORT, FallbackAction::Contact(format!("mailto:{email}")))
        })
    }
}

/// Fallback for a fault confined to one route segment's subtree.
#[derive(Debug, Clone)]
pub struct SubtreeErrorBoundary {
    mode: BuildMode,
    support: SupportContact,
}

impl SubtreeErrorBoundary {
    #[must_use]
    pub fn new(mode: BuildMode, support: SupportContact) -> Self {
        Self { mode, support }
    }

    #[must_use]
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Render the fallback for `fault`.
    ///
    /// "Go Home" is a soft navigation to the application root, which runs
    /// through the shell; without a shell context there is nothing to render
    /// and the caller must escalate.
    pub fn render(
        &self,
        fault: &FaultRecord,
        recovery: RecoveryHandle,
        shell: Option<&ShellContext>,
    ) -> Result<FallbackView, BoundaryError> {
        if shell.is_none() {
            return Err(BoundaryError::ShellUnavailable);
        }

        let mut actions = vec![
            ActionView::new(TRY_AGAIN, FallbackAction::Retry(recovery)),
            ActionView::new(GO_HOME, FallbackAction::Navigate(RoutePath::root())),
        ];

        let (details, footer) = if self.mode.exposes_diagnostics() {
            (fault_details(fault, false), None)
        } else {
            actions.extend(self.support.action());
            (Vec::new(), self.support.footer())
        };

        Ok(FallbackView {
            tone: Tone::Error,
            title: SUBTREE_TITLE,
            description: SUBTREE_DESCRIPTION,
            details,
            actions,
            footer,
        })
    }
}

/// Last-resort fallback that owns the entire document.
///
/// The support contact is plain configuration captured at construction, so
/// nothing here reaches back into the shell.
#[derive(Debug, Clone)]
pub struct RootErrorBoundary {
    mode: BuildMode,
    support: SupportContact,
}

impl RootErrorBoundary {
    #[must_use]
    pub fn new(mode: BuildMode, support: SupportContact) -> Self {
        Self { mode, support }
    }

    /// Infallible, and takes no shell input.
    #[must_use]
    pub fn render(&self, fault: &FaultRecord, recovery: RecoveryHandle) -> RootDocument {
        let mut actions = vec![
            ActionView::new(TRY_AGAIN, FallbackAction::Retry(recovery)),
            ActionView::new(
                RELOAD_APPLICATION,
                FallbackAction::HardReload(RoutePath::root()),
            ),
        ];
        let (details, footer) = if self.mode.exposes_diagnostics() {
            (fault_details(fault, true), None)
        } else {
            actions.extend(self.support.action());
            (Vec::new(), self.support.footer())
        };

        RootDocument {
            head: DocumentHead {
                title: ROOT_TITLE,
                lang: "en",
            },
            body: FallbackView {
                tone: Tone::Critical,
                title: ROOT_TITLE,
                description: ROOT_DESCRIPTION,
                details,
                actions,
                footer,
            },
        }
    }
}

fn fault_details(fault: &FaultRecord, with_trace: bool) -> Vec<Detail> {
    let mut details = vec![Detail::Error(
        sanitize_terminal_text(fault.display_message()).into_owned(),
    )];
    if let Some(identifier) = fault.identifier() {
        details.push(Detail::Digest(
            sanitize_terminal_text(identifier).into_owned(),
        ));
    }
    if with_trace && let Some(trace) = fault.trace() {
        let lines = sanitize_terminal_text(trace)
            .lines()
            .map(str::to_string)
            .collect();
        details.push(Detail::Trace(lines));
    }
    details
}

#[cfg(test)]
mod tests {
    use bulwark_types::FaultInput;
    use tokio::sync::mpsc;

    use super::*;
    use crate::recovery::RecoveryTarget;

    fn handle() -> RecoveryHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        RecoveryHandle::new(RecoveryTarget::Document, tx)
    }

    fn shell() -> ShellContext {
        ShellContext {
            title: "Test".to_string(),
            nav: Vec::new(),
        }
    }

    fn fault(mode: BuildMode) -> FaultRecord {
        FaultRecord::capture(
            FaultInput::new("db timeout")
                .with_identifier("d1g3st")
                .with_trace("at load()\nat main()"),
            mode,
        )
    }

    #[test]
    fn subtree_development_shows_message_and_digest() {
        let boundary = SubtreeErrorBoundary::new(BuildMode::Development, SupportContact::default());
        let view = boundary
            .render(&fault(BuildMode::Development), handle(), Some(&shell()))
            .expect("renders");

        assert_eq!(
            view.details,
            vec![
                Detail::Error("db timeout".to_string()),
                Detail::Digest("d1g3st".to_string())
            ]
        );
        assert_eq!(view.footer, None);
        let labels: Vec<_> = view.actions.iter().map(|a| a.label).collect();
        assert_eq!(labels, [TRY_AGAIN, GO_HOME]);
    }

    #[test]
    fn subtree_production_hides_internals_and_offers_support() {
        let boundary = SubtreeErrorBoundary::new(
            BuildMode::Production,
            SupportContact::email("help@example.org"),
        );
        let view = boundary
            .render(&fault(BuildMode::Production), handle(), Some(&shell()))
            .expect("renders");

        let text = view.text().join("\n");
        assert!(!text.contains("db timeout"));
        assert!(!text.contains("d1g3st"));
        assert!(text.contains("help@example.org"));
        assert!(view.details.is_empty());
        assert!(matches!(
            view.actions.last().map(|a| &a.action),
            Some(FallbackAction::Contact(link)) if link == "mailto:help@example.org"
        ));
    }

    #[test]
    fn subtree_go_home_navigates_to_application_root() {
        let boundary = SubtreeErrorBoundary::new(BuildMode::Production, SupportContact::default());
        let view = boundary
            .render(&fault(BuildMode::Production), handle(), Some(&shell()))
            .expect("renders");
        assert!(matches!(
            &view.actions[1].action,
            FallbackAction::Navigate(route) if route.is_root()
        ));
    }

    #[test]
    fn subtree_without_shell_fails_to_render() {
        let boundary = SubtreeErrorBoundary::new(BuildMode::Development, SupportContact::default());
        let result = boundary.render(&fault(BuildMode::Development), handle(), None);
        assert!(matches!(result, Err(BoundaryError::ShellUnavailable)));
    }

    #[test]
    fn root_development_includes_trace() {
        let boundary = RootErrorBoundary::new(BuildMode::Development, SupportContact::default());
        let document = boundary.render(&fault(BuildMode::Development), handle());

        assert_eq!(document.head.title, ROOT_TITLE);
        assert_eq!(document.head.lang, "en");
        assert!(document.body.details.contains(&Detail::Trace(vec![
            "at load()".to_string(),
            "at main()".to_string()
        ])));
    }

    #[test]
    fn root_offers_hard_reload_to_root() {
        let boundary = RootErrorBoundary::new(
            BuildMode::Production,
            SupportContact::email("help@example.org"),
        );
        let document = boundary.render(&fault(BuildMode::Production), handle());

        assert!(document.body.details.is_empty());
        assert_eq!(
            document.body.footer.as_deref(),
            Some("Need help? Contact Support <help@example.org>")
        );
        assert_eq!(document.body.actions[2].label, CONTACT_SUPPORT);
        assert!(document.body.actions[0].action.is_retry());
        assert!(matches!(
            &document.body.actions[1].action,
            FallbackAction::HardReload(route) if route.is_root()
        ));
        assert_eq!(document.body.actions[1].label, RELOAD_APPLICATION);
    }

    #[test]
    fn diagnostics_are_sanitized() {
        let boundary = RootErrorBoundary::new(BuildMode::Development, SupportContact::default());
        let record = FaultRecord::capture(
            FaultInput::new("bad\x1b[2J output"),
            BuildMode::Development,
        );
        let document = boundary.render(&record, handle());
        assert_eq!(
            document.body.details[0],
            Detail::Error("bad output".to_string())
        );
    }
}
