//! Tronics Core - Shared types library.
//!
//! This crate provides the domain model used by every Tronics component:
//! - `tronics-api` - The HTTP service for products and users
//! - `tronics-cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP. Persistence is described by the [`store::CollectionStore`] trait
//! and implemented elsewhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, emails, products and users
//! - [`validation`] - Field rules that report every violation at once
//! - [`filter`] - Exact-match query filters
//! - [`store`] - The document collection capability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod filter;
pub mod store;
pub mod types;
pub mod validation;

pub use filter::{Filter, FilterBuilder};
pub use store::{CollectionStore, Document, StoreError};
pub use types::*;
pub use validation::{Validate, ValidationErrors};
