//! One-shot diagnostic reporting for observed faults.
//!
//! Every distinct fault is logged exactly once, no matter how often its
//! fallback is re-rendered. Identity is the [`FaultKey`]; registering a key a
//! second time is a no-op. The optional external sink sees the same single
//! report.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use bulwark_types::{BuildMode, FaultKey, FaultRecord, FaultScope, Severity};

/// Structured report handed to a [`FaultSink`].
#[derive(Debug, Serialize)]
pub struct FaultReport<'a> {
    pub key: &'a FaultKey,
    pub scope: FaultScope,
    pub severity: Severity,
    pub build_mode: BuildMode,
    pub observed_at: String,
    pub fault: &'a FaultRecord,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("fault sink io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode fault report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// External error-reporting sink.
pub trait FaultSink {
    fn report(&mut self, report: &FaultReport<'_>) -> Result<(), SinkError>;
}

/// Sink used when nothing is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl FaultSink for NoopSink {
    fn report(&mut self, _report: &FaultReport<'_>) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Appends one JSON object per fault to a file.
///
/// The file (and its parent directory) is created on the first report.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Option<File>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn open(&self) -> Result<File, SinkError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))
    }

    fn file(&mut self) -> Result<&mut File, SinkError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => self.open()?,
        };
        Ok(self.file.insert(file))
    }
}

impl FaultSink for JsonLinesSink {
    fn report(&mut self, report: &FaultReport<'_>) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(report)?;
        line.push('\n');
        let result = self.file()?.write_all(line.as_bytes());
        result.map_err(|e| self.io_error(e))
    }
}

/// Idempotent registration of observed faults.
pub struct DiagnosticRegistry {
    mode: BuildMode,
    seen: HashSet<FaultKey>,
    sink: Box<dyn FaultSink>,
    emitted: u64,
}

impl std::fmt::Debug for DiagnosticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticRegistry")
            .field("mode", &self.mode)
            .field("seen", &self.seen.len())
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

impl DiagnosticRegistry {
    #[must_use]
    pub fn new(mode: BuildMode, sink: Box<dyn FaultSink>) -> Self {
        Self {
            mode,
            seen: HashSet::new(),
            sink,
            emitted: 0,
        }
    }

    /// Log `record` unless `key` was already registered.
    ///
    /// Returns whether this call emitted.
    pub fn register(&mut self, key: &FaultKey, scope: FaultScope, record: &FaultRecord) -> bool {
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.emitted += 1;

        let severity = Severity::for_scope(scope);
        match severity {
            Severity::Error => tracing::error!(
                key = %key,
                scope = %scope,
                fault_message = record.message(),
                identifier = ?record.identifier(),
                trace = ?record.trace(),
                "Application error"
            ),
            Severity::Critical => tracing::error!(
                key = %key,
                scope = %scope,
                fault_message = record.message(),
                identifier = ?record.identifier(),
                trace = ?record.trace(),
                "Critical application error"
            ),
        }

        let report = FaultReport {
            key,
            scope,
            severity,
            build_mode: self.mode,
            observed_at: chrono::Utc::now().to_rfc3339(),
            fault: record,
        };
        if let Err(err) = self.sink.report(&report) {
            tracing::warn!(key = %key, "Fault sink rejected report: {err}");
        }
        true
    }

    /// Forget a discarded fault.
    pub fn release(&mut self, key: &FaultKey) {
        self.seen.remove(key);
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    #[must_use]
    pub fn is_registered(&self, key: &FaultKey) -> bool {
        self.seen.contains(key)
    }

    /// Faults currently held; released faults are not counted.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Total reports emitted since construction.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
