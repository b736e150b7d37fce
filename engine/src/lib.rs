//! Rendering engine for Bulwark: route segments, error boundaries, recovery.
//!
//! This crate owns the renderer state machine and produces view models. It has
//! no terminal dependencies; the TUI crate draws whatever [`Renderer::compose`]
//! returns.

mod boundary;
mod diagnostics;
mod placeholder;
mod recovery;
mod renderer;
mod source;
mod view;

pub use boundary::{
    BoundaryError, CONTACT_SUPPORT, GO_HOME, RELOAD_APPLICATION, RootErrorBoundary,
    SubtreeErrorBoundary, SupportContact, TRY_AGAIN,
};
pub use diagnostics::{
    DiagnosticRegistry, FaultReport, FaultSink, JsonLinesSink, NoopSink, SinkError,
};
pub use placeholder::{LoadingCopy, LoadingPlaceholder, NotFoundLinks, NotFoundView, REGISTER};
pub use recovery::{RecoveryHandle, RecoveryTarget, RenderCommand};
pub use renderer::{Activation, Renderer, RendererOptions};
pub use source::{SegmentSource, SegmentSpec};
pub use view::{
    ActionView, Detail, DocumentHead, DocumentView, FallbackAction, FallbackView, NavLink,
    NotFoundPage, PlaceholderView, RootDocument, Screen, ShellContext, SlotBody, SlotView, Tone,
};

pub use bulwark_types::{
    BuildMode, FaultInput, FaultKey, FaultRecord, FaultScope, PageContent, Resolution, RoutePath,
    SegmentId, SegmentState,
};
