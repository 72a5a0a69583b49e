//! Policy layer (capabilities, field visibility, value conditions, audit).
//!
//! Compiles the permission configuration into lookup structures the
//! dispatcher consults before any remote call is issued.

pub mod audit;
pub mod conditions;
pub mod engine;

pub use audit::{
    AuditRecord, AuditSink, JsonLinesAuditSink, MemoryAuditSink, NoopAuditSink, TracingAuditSink,
};
pub use engine::{DoctypeSummary, PermissionsExport, PolicyDecision, PolicyEngine};
