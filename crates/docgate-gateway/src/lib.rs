//! docgate gateway library entry.
//!
//! This crate wires config, policy, the remote request pipeline, the
//! dispatcher, and the built-in services into a mediation layer in front of a
//! document API. It is intended to be consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod policy;
pub mod remote;
pub mod services;
