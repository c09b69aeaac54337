//! Cove HTTP server library.
//!
//! Thin axum transport over `cove-core`: header extraction, the admin
//! credential gate for vault creation, JSON error mapping, and
//! configuration. All vault semantics live in the core crate.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
