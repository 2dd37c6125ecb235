//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in, sign-up, refresh, sign-out, and password recovery
//! - `catalog` - Featured products for the home page
//! - `submission` - One in-flight submission per visitor and form

pub mod auth;
pub mod catalog;
pub mod submission;

pub use auth::{AuthError, AuthService, IdentityProvider, SignUpOutcome};
pub use catalog::{FEATURED_LIMIT, ProductCatalog, load_featured};
pub use submission::{FormKind, SubmissionGate, SubmissionPermit};
