//! Audit records and sinks.
//!
//! The policy engine reports every decision through [`AuditSink::record`].
//! Sinks swallow their own failures: a broken audit destination is logged,
//! never surfaced to the decision it accompanies.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use docgate_core::error::{DocGateError, Result};

/// Immutable record of one authorization decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    /// Upper-cased capability name (`READ`, `CREATE`, ...).
    pub operation: String,
    pub doctype: String,
    pub allowed: bool,
    pub reason: String,
    pub document_name: Option<String>,
    pub data_keys: Option<Vec<String>>,
    pub field_count: usize,
}

impl AuditRecord {
    /// One-line human rendering used by log-based sinks.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Operation: {} | DocType: {} | Result: {} | Reason: {}",
            self.operation,
            self.doctype,
            if self.allowed { "ALLOWED" } else { "DENIED" },
            self.reason
        );
        if let Some(doc) = &self.document_name {
            line.push_str(&format!(" | Document: {doc}"));
        }
        if let Some(keys) = &self.data_keys {
            line.push_str(&format!(" | Fields: {keys:?}"));
        }
        line
    }
}

/// Narrow "record decision" interface.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Audit disabled.
#[derive(Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

/// Emits decisions as `tracing` events under the `docgate::audit` target.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        let document = record.document_name.as_deref().unwrap_or("");
        if record.allowed {
            tracing::info!(
                target: "docgate::audit",
                operation = %record.operation,
                doctype = %record.doctype,
                document = %document,
                field_count = record.field_count,
                "{}",
                record.summary()
            );
        } else {
            tracing::warn!(
                target: "docgate::audit",
                operation = %record.operation,
                doctype = %record.doctype,
                document = %document,
                field_count = record.field_count,
                "{}",
                record.summary()
            );
        }
    }
}

/// Append-only JSON lines file.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesAuditSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                DocGateError::Config(format!("create audit dir {} failed: {e}", dir.display()))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                DocGateError::Config(format!("open audit log {} failed: {e}", path.display()))
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "audit record serialization failed");
                return;
            }
        };
        // Poisoned mutex: drop the record rather than fail the decision.
        let Ok(mut f) = self.file.lock() else {
            tracing::warn!(path = %self.path.display(), "audit log lock poisoned");
            return;
        };
        if let Err(e) = writeln!(f, "{line}") {
            tracing::warn!(path = %self.path.display(), error = %e, "audit write failed");
        }
    }
}

/// Keeps records in memory, e.g. for embedding hosts that ship them elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        if let Ok(mut r) = self.records.lock() {
            r.push(record.clone());
        }
    }
}
