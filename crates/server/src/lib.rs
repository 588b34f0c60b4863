//! Barberbook server library.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around the
//! router built by [`routes::app`]. The library is split out so router-level
//! tests can assemble an [`state::AppState`] with in-memory collaborators
//! (enable the `test-support` feature).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
