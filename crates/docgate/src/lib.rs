//! Top-level facade crate for docgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use docgate_core::*;
}

pub mod gateway {
    pub use docgate_gateway::*;
}
