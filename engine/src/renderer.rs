//! The hosting renderer: one state machine for the shell and every segment.
//!
//! ```text
//! navigate(route) ──> mount_document ──> shell() ──Err──> root boundary
//!                          │
//!                          └─> per segment: resolve ─┬─ Pending  ──> LoadingPlaceholder (re-resolved on tick)
//!                                                    ├─ NotFound ──> NotFoundView
//!                                                    └─ Ready ─> render ─┬─ Ok  ──> content, mount children
//!                                                                        └─ Err ──> on_fault ──> mount_boundary
//! ```
//!
//! A fault goes to the narrowest enclosing subtree boundary. With no enclosing
//! boundary, or when that boundary cannot render its fallback, the fault
//! escalates to the root boundary, which replaces the whole document. Nothing
//! escalates past the root.
//!
//! A segment that is not ready hides its descendants: they are unmounted until
//! it becomes ready again.

use std::collections::HashMap;

use tokio::sync::mpsc;

use bulwark_types::{
    BuildMode, FaultInput, FaultKey, FaultRecord, FaultScope, MountEpoch, Resolution, RoutePath,
    SegmentId, SegmentState,
};

use crate::boundary::{RootErrorBoundary, SubtreeErrorBoundary, SupportContact};
use crate::diagnostics::{DiagnosticRegistry, FaultSink, NoopSink};
use crate::placeholder::{LoadingCopy, LoadingPlaceholder, NotFoundLinks, NotFoundView};
use crate::recovery::{RecoveryHandle, RecoveryTarget, RenderCommand};
use crate::source::{SegmentSource, SegmentSpec};
use crate::view::{
    DocumentView, FallbackAction, FallbackView, RootDocument, Screen, ShellContext, SlotBody,
    SlotView,
};

/// Construction-time settings for a [`Renderer`].
#[derive(Debug, Clone, Default)]
pub struct RendererOptions {
    pub build_mode: BuildMode,
    pub support: SupportContact,
    pub not_found: NotFoundLinks,
    pub loading: LoadingCopy,
}

/// What activating a fallback action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A recovery request was queued; it runs on the next tick.
    RecoveryQueued,
    Navigated(RoutePath),
    Reloaded(RoutePath),
    /// Outside the application (e.g. a `mailto:` link); the host decides.
    External(String),
}

#[derive(Debug)]
struct MountedFallback {
    key: FaultKey,
    epoch: MountEpoch,
    view: FallbackView,
}

#[derive(Debug)]
struct SegmentNode {
    id: SegmentId,
    spec: SegmentSpec,
    depth: usize,
    mounted: bool,
    state: SegmentState,
    fallback: Option<MountedFallback>,
}

#[derive(Debug)]
struct RootFault {
    key: FaultKey,
    document: RootDocument,
}

#[derive(Debug)]
enum ShellState {
    Healthy,
    Faulted(RootFault),
}

pub struct Renderer {
    source: Box<dyn SegmentSource>,
    mode: BuildMode,
    subtree: SubtreeErrorBoundary,
    root: RootErrorBoundary,
    loading: LoadingPlaceholder,
    not_found: NotFoundView,
    shell: ShellState,
    shell_context: Option<ShellContext>,
    route: RoutePath,
    matched: bool,
    segments: Vec<SegmentNode>,
    next_segment: u64,
    epoch: MountEpoch,
    diagnostics: DiagnosticRegistry,
    commands_tx: mpsc::UnboundedSender<RenderCommand>,
    commands_rx: mpsc::UnboundedReceiver<RenderCommand>,
    tick: usize,
    recovery_attempts: u64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("mode", &self.mode)
            .field("route", &self.route)
            .field("shell", &self.shell)
            .field("segments", &self.segments)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer. Nothing is mounted until the first [`Renderer::navigate`].
    #[must_use]
    pub fn new(source: Box<dyn SegmentSource>, options: RendererOptions) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let mode = options.build_mode;
        Self {
            source,
            mode,
            subtree: SubtreeErrorBoundary::new(mode, options.support.clone()),
            root: RootErrorBoundary::new(mode, options.support),
            loading: LoadingPlaceholder::new(options.loading),
            not_found: NotFoundView::new(options.not_found),
            shell: ShellState::Healthy,
            shell_context: None,
            route: RoutePath::root(),
            matched: false,
            segments: Vec::new(),
            next_segment: 1,
            epoch: MountEpoch::default(),
            diagnostics: DiagnosticRegistry::new(mode, Box::new(NoopSink)),
            commands_tx,
            commands_rx,
            tick: 0,
            recovery_attempts: 0,
        }
    }

    /// Replace the external fault sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn FaultSink>) -> Self {
        self.diagnostics = DiagnosticRegistry::new(self.mode, sink);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    #[must_use]
    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    #[must_use]
    pub fn is_shell_faulted(&self) -> bool {
        matches!(self.shell, ShellState::Faulted(_))
    }

    #[must_use]
    pub fn shell_context(&self) -> Option<&ShellContext> {
        self.shell_context.as_ref()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticRegistry {
        &self.diagnostics
    }

    /// Recovery attempts actually executed (stale requests excluded).
    #[must_use]
    pub fn recovery_attempts(&self) -> u64 {
        self.recovery_attempts
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick
    }

    /// Id of the mounted segment serving `route`.
    #[must_use]
    pub fn segment_at(&self, route: &RoutePath) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|node| node.mounted && &node.spec.route == route)
            .map(|node| node.id)
    }

    #[must_use]
    pub fn segment_state(&self, id: SegmentId) -> Option<&SegmentState> {
        self.node(id).map(|node| &node.state)
    }

    #[must_use]
    pub fn is_mounted(&self, id: SegmentId) -> bool {
        self.node(id).is_some_and(|node| node.mounted)
    }

    fn node(&self, id: SegmentId) -> Option<&SegmentNode> {
        self.segments.iter().find(|node| node.id == id)
    }

    fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|node| node.id == id)
    }

    // ========================================================================
    // Resolution and mounting
    // ========================================================================

    /// Resolution of the leaf segment serving `route`.
    pub fn resolve_segment(&mut self, route: &RoutePath) -> Resolution {
        match self.source.segments_for(route) {
            Some(specs) => match specs.last() {
                Some(leaf) => self.source.resolve(leaf),
                None => Resolution::NotFound,
            },
            None => Resolution::NotFound,
        }
    }

    /// Soft navigation: unmount the current tree and mount `route`.
    ///
    /// Refused while the root boundary is showing; soft navigation runs
    /// through the shell, which is not trusted at that point.
    pub fn navigate(&mut self, route: impl Into<RoutePath>) {
        let route = route.into();
        if self.is_shell_faulted() {
            tracing::warn!(route = %route, "Soft navigation refused while root boundary is active");
            return;
        }
        tracing::info!(from = %self.route, to = %route, "Navigating");
        self.unmount_all();
        self.route = route;
        self.mount_document();
    }

    /// Tear everything down and mount `route` from scratch.
    pub fn hard_reload(&mut self, route: impl Into<RoutePath>) {
        let route = route.into();
        tracing::info!(route = %route, "Hard reload");
        self.shell = ShellState::Healthy;
        self.shell_context = None;
        self.unmount_all();
        self.diagnostics.clear();
        // Requests queued against the discarded document are meaningless now.
        while self.commands_rx.try_recv().is_ok() {}
        self.route = route;
        self.mount_document();
    }

    fn unmount_all(&mut self) {
        for node in self.segments.drain(..) {
            if let Some(fallback) = node.fallback {
                self.diagnostics.release(&fallback.key);
            }
        }
        self.matched = false;
    }

    fn mount_document(&mut self) {
        self.epoch = self.epoch.next();
        match self.source.shell(&self.route) {
            Ok(context) => self.shell_context = Some(context),
            Err(input) => {
                self.shell_context = None;
                self.on_shell_fault(input);
                return;
            }
        }

        let Some(specs) = self.source.segments_for(&self.route) else {
            tracing::info!(route = %self.route, "No route match");
            return;
        };
        self.matched = true;

        for (index, mut spec) in specs.into_iter().enumerate() {
            if spec.parent.is_some_and(|parent| parent >= index) {
                tracing::warn!(segment = %spec.name, "Segment parent must precede it; mounting at top level");
                spec.parent = None;
            }
            let depth = spec
                .parent
                .and_then(|parent| self.segments.get(parent))
                .map_or(0, |parent| parent.depth + 1);
            let id = SegmentId::new(self.next_segment);
            self.next_segment += 1;
            self.segments.push(SegmentNode {
                id,
                spec,
                depth,
                mounted: false,
                state: SegmentState::Pending,
                fallback: None,
            });
        }

        let roots: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, node)| node.spec.parent.is_none())
            .map(|(index, _)| index)
            .collect();
        for index in roots {
            if self.is_shell_faulted() {
                return;
            }
            self.mount_segment(index);
        }
    }

    /// Resolve and render one segment, then its children if it became ready.
    fn mount_segment(&mut self, index: usize) {
        self.epoch = self.epoch.next();
        let resolution = {
            let Some(node) = self.segments.get_mut(index) else {
                return;
            };
            node.mounted = true;
            node.state = SegmentState::Pending;
            self.source.resolve(&node.spec)
        };

        match resolution {
            Resolution::Pending => {}
            Resolution::NotFound => self.segments[index].state = SegmentState::NotFound,
            Resolution::Ready => match self.source.render(&self.segments[index].spec) {
                Ok(content) => {
                    self.segments[index].state = SegmentState::Ready(content);
                    for child in self.children(index) {
                        self.mount_segment(child);
                        let still_ready = !self.is_shell_faulted()
                            && matches!(
                                self.segments.get(index).map(|node| &node.state),
                                Some(SegmentState::Ready(_))
                            );
                        if !still_ready {
                            return;
                        }
                    }
                }
                Err(input) => {
                    let id = self.segments[index].id;
                    self.on_fault(id, input);
                }
            },
        }
    }

    fn children(&self, index: usize) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, node)| node.spec.parent == Some(index))
            .map(|(child, _)| child)
            .collect()
    }

    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut frontier = self.children(index);
        while let Some(next) = frontier.pop() {
            frontier.extend(self.children(next));
            out.push(next);
        }
        out
    }

    fn unmount_descendants(&mut self, index: usize) {
        for descendant in self.descendants(index) {
            let node = &mut self.segments[descendant];
            node.mounted = false;
            node.state = SegmentState::Pending;
            if let Some(fallback) = node.fallback.take() {
                self.diagnostics.release(&fallback.key);
            }
        }
    }

    /// Nearest segment at or above `index` wrapped by a subtree boundary.
    fn capturing_boundary(&self, index: usize) -> Option<usize> {
        let mut current = Some(index);
        while let Some(at) = current {
            let node = self.segments.get(at)?;
            if node.spec.bounded {
                return Some(at);
            }
            current = node.spec.parent;
        }
        None
    }

    // ========================================================================
    // Faults
    // ========================================================================

    /// Record a fault raised by a segment and hand it to a boundary.
    ///
    /// A segment that is not mounted counts as outside every boundary.
    pub fn on_fault(&mut self, segment: SegmentId, input: FaultInput) -> FaultRecord {
        let record = FaultRecord::capture(input, self.mode);
        tracing::debug!(segment = %segment, "Fault captured");
        self.mount_boundary(segment, record.clone());
        record
    }

    /// Record a fault raised by the shell itself.
    pub fn on_shell_fault(&mut self, input: FaultInput) -> FaultRecord {
        let record = FaultRecord::capture(input, self.mode);
        tracing::debug!("Shell fault captured");
        self.mount_root_boundary(record.clone());
        record
    }

    /// Select and mount the boundary for a fault raised in `origin`.
    ///
    /// The fault is registered with the diagnostic registry before the
    /// fallback is first shown. A boundary that fails to render registers
    /// nothing; the root boundary reports the escalated fault instead.
    /// Returns where the fault was contained.
    pub fn mount_boundary(&mut self, origin: SegmentId, record: FaultRecord) -> FaultScope {
        let capture = self
            .index_of(origin)
            .filter(|&index| self.segments[index].mounted)
            .and_then(|index| self.capturing_boundary(index));
        let Some(index) = capture else {
            self.mount_root_boundary(record);
            return FaultScope::Shell;
        };

        let id = self.segments[index].id;
        let scope = FaultScope::Segment(id);
        let epoch = self.epoch;
        let key = FaultKey::derive(&record, epoch);

        // The subtree fallback navigates through the shell; read its current state.
        let shell_failure = match self.source.shell(&self.route) {
            Ok(context) => {
                self.shell_context = Some(context);
                None
            }
            Err(input) => {
                self.shell_context = None;
                Some(input)
            }
        };

        let handle = RecoveryHandle::new(
            RecoveryTarget::Segment(id, epoch),
            self.commands_tx.clone(),
        );
        match self
            .subtree
            .render(&record, handle, self.shell_context.as_ref())
        {
            Ok(view) => {
                self.diagnostics.register(&key, scope, &record);
                self.unmount_descendants(index);
                let node = &mut self.segments[index];
                let fallback = MountedFallback { key, epoch, view };
                if let Some(previous) = node.fallback.replace(fallback) {
                    self.diagnostics.release(&previous.key);
                }
                node.mounted = true;
                node.state = SegmentState::Fault(record);
                scope
            }
            Err(err) => {
                tracing::warn!(segment = %id, "Error boundary failed to render: {err}; escalating");
                let escalated = boundary_failure(&record, &err, shell_failure);
                self.on_shell_fault(escalated);
                FaultScope::Shell
            }
        }
    }

    fn mount_root_boundary(&mut self, record: FaultRecord) {
        let key = FaultKey::derive(&record, self.epoch);
        self.diagnostics.register(&key, FaultScope::Shell, &record);

        let handle = RecoveryHandle::new(RecoveryTarget::Document, self.commands_tx.clone());
        let document = self.root.render(&record, handle);
        self.unmount_all();
        if let ShellState::Faulted(previous) = std::mem::replace(
            &mut self.shell,
            ShellState::Faulted(RootFault { key, document }),
        ) {
            self.diagnostics.release(&previous.key);
        }
    }

    // ========================================================================
    // Recovery and the frame loop
    // ========================================================================

    /// Process queued requests, then re-resolve pending segments.
    ///
    /// Requests queued since the last tick were all issued against the
    /// fallbacks shown in that frame, so repeated clicks on one fallback
    /// each count as an attempt even after the first one remounts it.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let shown = self.shown_fallbacks();
        while let Ok(command) = self.commands_rx.try_recv() {
            match command {
                RenderCommand::Recover(RecoveryTarget::Segment(id, epoch)) => {
                    if shown.get(&id) == Some(&epoch) {
                        self.recover_segment(id);
                    } else {
                        tracing::debug!(segment = %id, epoch = %epoch, "Recovery dropped: fallback no longer shown");
                    }
                }
                RenderCommand::Recover(RecoveryTarget::Document) => self.recover_document(),
            }
        }
        self.refresh_pending();
    }

    fn shown_fallbacks(&self) -> HashMap<SegmentId, MountEpoch> {
        self.segments
            .iter()
            .filter_map(|node| node.fallback.as_ref().map(|fallback| (node.id, fallback.epoch)))
            .collect()
    }

    fn refresh_pending(&mut self) {
        let pending: Vec<SegmentId> = self
            .segments
            .iter()
            .filter(|node| node.mounted && node.state.is_pending())
            .map(|node| node.id)
            .collect();

        for id in pending {
            if self.is_shell_faulted() {
                return;
            }
            // An earlier segment in this pass may have unmounted this one.
            let Some(index) = self.index_of(id) else {
                continue;
            };
            let node = &self.segments[index];
            if node.mounted && node.state.is_pending() {
                self.mount_segment(index);
            }
        }
    }

    /// Discard the faulted content behind `target` and render it again.
    ///
    /// Requests for content that is gone, no longer faulted, or showing a
    /// newer fallback than the one the request came from are dropped.
    pub fn recover(&mut self, target: RecoveryTarget) {
        match target {
            RecoveryTarget::Segment(id, epoch) => {
                let shown = self
                    .node(id)
                    .and_then(|node| node.fallback.as_ref())
                    .map(|fallback| fallback.epoch);
                if shown.is_some_and(|shown| shown != epoch) {
                    tracing::debug!(segment = %id, epoch = %epoch, "Recovery dropped: fallback no longer shown");
                    return;
                }
                self.recover_segment(id);
            }
            RecoveryTarget::Document => self.recover_document(),
        }
    }

    fn recover_segment(&mut self, id: SegmentId) {
        if self.is_shell_faulted() {
            tracing::debug!(segment = %id, "Recovery dropped: root boundary active");
            return;
        }
        let Some(index) = self.index_of(id) else {
            tracing::debug!(segment = %id, "Recovery dropped: segment unmounted");
            return;
        };
        let Some(fallback) = self.segments[index].fallback.take() else {
            tracing::debug!(segment = %id, "Recovery dropped: segment not faulted");
            return;
        };
        self.diagnostics.release(&fallback.key);
        self.recovery_attempts += 1;
        tracing::info!(segment = %id, "Recovering segment");
        self.mount_segment(index);
    }

    fn recover_document(&mut self) {
        let ShellState::Faulted(fault) = std::mem::replace(&mut self.shell, ShellState::Healthy)
        else {
            tracing::debug!("Recovery dropped: document not faulted");
            return;
        };
        self.diagnostics.release(&fault.key);
        self.recovery_attempts += 1;
        tracing::info!(route = %self.route, "Recovering document");
        self.unmount_all();
        self.mount_document();
    }

    /// Execute a user action taken on a fallback or not-found view.
    pub fn activate(&mut self, action: &FallbackAction) -> Activation {
        match action {
            FallbackAction::Retry(handle) => {
                handle.invoke();
                Activation::RecoveryQueued
            }
            FallbackAction::Navigate(route) => {
                self.navigate(route.clone());
                Activation::Navigated(route.clone())
            }
            FallbackAction::HardReload(route) => {
                self.hard_reload(route.clone());
                Activation::Reloaded(route.clone())
            }
            FallbackAction::Contact(link) => {
                tracing::info!(link = %link, "Support contact requested");
                Activation::External(link.clone())
            }
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Build the output tree for the current state.
    #[must_use]
    pub fn compose(&self) -> Screen {
        if let ShellState::Faulted(fault) = &self.shell {
            return Screen::RootFallback(fault.document.clone());
        }

        let mut slots = Vec::new();
        if self.matched {
            for node in self.segments.iter().filter(|node| node.mounted) {
                let body = match (&node.fallback, &node.state) {
                    (Some(fallback), _) => SlotBody::Fallback(fallback.view.clone()),
                    (None, SegmentState::Ready(content)) => SlotBody::Content(content.clone()),
                    (None, SegmentState::NotFound) => SlotBody::NotFound(self.not_found.view()),
                    (None, SegmentState::Pending | SegmentState::Fault(_)) => {
                        SlotBody::Loading(self.loading.view(self.tick))
                    }
                };
                slots.push(SlotView {
                    segment: Some(node.id),
                    route: node.spec.route.clone(),
                    depth: node.depth,
                    body,
                });
            }
        } else if self.shell_context.is_some() {
            slots.push(SlotView {
                segment: None,
                route: self.route.clone(),
                depth: 0,
                body: SlotBody::NotFound(self.not_found.view()),
            });
        }

        Screen::Document(DocumentView {
            route: self.route.clone(),
            build_mode: self.mode,
            shell: self.shell_context.clone().unwrap_or_default(),
            slots,
        })
    }
}

/// Fault describing a subtree boundary that could not render its fallback.
fn boundary_failure(
    original: &FaultRecord,
    err: &dyn std::error::Error,
    shell_failure: Option<FaultInput>,
) -> FaultInput {
    let (reason, identifier, shell_trace) = match shell_failure {
        Some(shell) => (shell.message, shell.identifier, shell.trace),
        None => (err.to_string(), None, None),
    };

    let mut trace = format!("while handling: {}", original.display_message());
    if let Some(shell_trace) = shell_trace {
        trace.push('\n');
        trace.push_str(&shell_trace);
    }

    FaultInput {
        message: format!("error boundary failed to render: {reason}"),
        identifier: identifier.or_else(|| original.identifier().map(str::to_string)),
        trace: Some(trace),
    }
}
