//! Per-segment render state.

use crate::fault::FaultRecord;

/// Rendered content of a ready segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageContent {
    pub title: String,
    pub body: Vec<String>,
}

impl PageContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }
}

/// Outcome of resolving a segment's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ready,
    Pending,
    NotFound,
}

/// What a mounted segment currently shows.
///
/// The renderer drives every transition explicitly; nothing here is derived
/// from unwinding or lifecycle timing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SegmentState {
    Ready(PageContent),
    #[default]
    Pending,
    Fault(FaultRecord),
    NotFound,
}

impl SegmentState {
    #[must_use]
    pub fn fault(&self) -> Option<&FaultRecord> {
        match self {
            Self::Fault(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Pending => "pending",
            Self::Fault(_) => "fault",
            Self::NotFound => "not_found",
        }
    }
}
