//! Domain types for Tronics.
//!
//! Type-safe wrappers for identifiers and emails, plus the catalog and
//! account entities built on them.

pub mod email;
pub mod id;
pub mod product;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use product::{Product, ProductDraft};
pub use user::{Credentials, User, UserResponse};
