//! Domain models for the storefront.
//!
//! # Models
//!
//! - [`CurrentSession`] - the signed-in visitor's identity-service session,
//!   stored server-side in the visitor's cookie session
//! - [`session_keys`] - keys used in the cookie session

pub mod session;

pub use session::{CurrentSession, keys as session_keys};
