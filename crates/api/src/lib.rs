//! Tronics API library.
//!
//! Product catalog and user account endpoints, exposed as a library so the
//! CLI and the integration tests can build the same services and router as
//! the server binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
