//! docgate core: transport-agnostic error types and the operation vocabulary.
//!
//! This crate defines the error surface and the operation identifiers shared by
//! the gateway, its services, and any front end that lists or invokes
//! operations. It intentionally carries no network or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `DocGateError`/`Result` so a malformed
//! operation identifier never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod operation;

/// Shared result type.
pub use error::{ClientCode, DocGateError, Result};
pub use operation::{Capability, OperationKind, ToolDescriptor};
