//! Dispatcher module exports.
//!
//! Re-exports the dispatcher, the route registry, and the service trait so
//! downstream consumers can depend on this module directly.

pub mod args;
pub mod dispatcher;
pub mod registry;

pub use args::Args;
pub use dispatcher::{Dispatcher, OperationCall, OperationOutput, OperationService};
pub use registry::{build_routes, generic_identifier, Route, RouteEntry, SystemOp};
