//! Fault records and the build mode that gates their exposure.

use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::ids::{MountEpoch, SegmentId};

/// Placeholder shown when a fault carries no usable message.
const UNKNOWN_FAULT: &str = "unknown error";

/// Number of digest bytes kept in a [`FaultKey`].
const FAULT_KEY_BYTES: usize = 8;

/// Build flavor of the running application.
///
/// Only `Development` exposes raw fault diagnostics to the user. The default
/// is `Production` so a missing setting never leaks internals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether fault message, identifier, and trace may be shown to the user.
    #[must_use]
    pub const fn exposes_diagnostics(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown build mode `{0}` (expected `development` or `production`)")]
pub struct UnknownBuildMode(String);

impl FromStr for BuildMode {
    type Err = UnknownBuildMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(UnknownBuildMode(other.to_string())),
        }
    }
}

/// Raw fault data reported by whatever failed to render.
///
/// This is what a segment source hands back when rendering throws. The
/// renderer turns it into an immutable [`FaultRecord`] via
/// [`FaultRecord::capture`], which applies the build-mode policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultInput {
    pub message: String,
    /// Correlation token, present only when the fault crossed a server boundary.
    pub identifier: Option<String>,
    pub trace: Option<String>,
}

impl FaultInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            identifier: None,
            trace: None,
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Build a fault from an error value; the `source()` chain becomes the trace.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut trace = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            if !trace.is_empty() {
                trace.push('\n');
            }
            let _ = write!(trace, "caused by: {cause}");
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            identifier: None,
            trace: (!trace.is_empty()).then_some(trace),
        }
    }
}

/// An observed render/navigation fault.
///
/// Immutable once constructed. The trace survives only in development builds;
/// an absent identifier means no server correlation is available and is never
/// synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    message: String,
    identifier: Option<String>,
    trace: Option<String>,
}

impl FaultRecord {
    #[must_use]
    pub fn capture(input: FaultInput, mode: BuildMode) -> Self {
        let identifier = input.identifier.filter(|id| !id.trim().is_empty());
        let trace = if mode.exposes_diagnostics() {
            input.trace.filter(|trace| !trace.trim().is_empty())
        } else {
            None
        };

        Self {
            message: input.message,
            identifier,
            trace,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message verbatim, or a placeholder when the fault carried none.
    #[must_use]
    pub fn display_message(&self) -> &str {
        if self.message.is_empty() {
            UNKNOWN_FAULT
        } else {
            &self.message
        }
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

/// Identity of one observed fault.
///
/// Derived from the record text plus the mount epoch the fault was observed
/// at, so the same message raised again after a remount is a distinct fault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FaultKey(String);

impl FaultKey {
    #[must_use]
    pub fn derive(record: &FaultRecord, epoch: MountEpoch) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(record.message.as_bytes());
        hasher.update([0u8]);
        if let Some(identifier) = &record.identifier {
            hasher.update(identifier.as_bytes());
        }
        hasher.update([0u8]);
        hasher.update(epoch.value().to_le_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(FAULT_KEY_BYTES * 2);
        for byte in &digest[..FAULT_KEY_BYTES] {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a fault was contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultScope {
    /// Contained by the subtree boundary wrapping this segment.
    Segment(SegmentId),
    /// Reached the root boundary.
    Shell,
}

impl fmt::Display for FaultScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segment(id) => write!(f, "segment:{id}"),
            Self::Shell => f.write_str("shell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn for_scope(scope: FaultScope) -> Self {
        match scope {
            FaultScope::Segment(_) => Self::Error,
            FaultScope::Shell => Self::Critical,
        }
    }
}
