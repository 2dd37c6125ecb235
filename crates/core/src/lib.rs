//! YEEZY Marketplace Core - Shared domain types.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. The storefront crate owns everything that talks to the hosted
//! backend.
//!
//! # Modules
//!
//! - [`types`] - Validated emails, passwords, sign-in/sign-up credentials,
//!   and the read-only product catalog model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
