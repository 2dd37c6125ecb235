//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credentials;
pub mod email;
pub mod price;
pub mod product;

pub use credentials::{Credentials, Password, PasswordError};
pub use email::{Email, EmailError};
pub use price::Price;
pub use product::{Product, ProductId};
