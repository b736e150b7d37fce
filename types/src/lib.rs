//! Core domain types for Bulwark.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the renderer
//! state machine, the fault sinks, and the terminal front end.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod fault;
mod ids;
mod route;
mod sanitize;
mod segment;

pub use fault::{
    BuildMode, FaultInput, FaultKey, FaultRecord, FaultScope, Severity, UnknownBuildMode,
};
pub use ids::{MountEpoch, SegmentId};
pub use route::RoutePath;
pub use sanitize::sanitize_terminal_text;
pub use segment::{PageContent, Resolution, SegmentState};

/// UI configuration options derived from config/environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}
