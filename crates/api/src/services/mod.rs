//! Business logic services.
//!
//! # Services
//!
//! - `products` - Product catalog CRUD with filter, validation and merge rules
//! - `users` - Account registration, authentication and admin promotion
//! - `password` - Argon2id password hashing
//! - `token` - HS256 access tokens

pub mod password;
pub mod products;
pub mod token;
pub mod users;

pub use password::{CredentialHasher, HashError};
pub use products::{ProductError, ProductService};
pub use token::{Claims, TokenError, TokenManager};
pub use users::{AuthError, UserService};
