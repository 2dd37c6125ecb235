//! In-flight form submission tracking.
//!
//! Each visitor may have at most one submission per form in flight. A second
//! submit while the first is still waiting on the identity service is
//! dropped instead of issuing another request.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Identity service calls that may only run once at a time per visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    SignIn,
    SignUp,
    ResetPassword,
    /// Not a form: the refresh grant issued by `RequireAuth`.
    SessionRefresh,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::ResetPassword => "reset_password",
            Self::SessionRefresh => "session_refresh",
        };
        f.write_str(name)
    }
}

type InFlight = Arc<Mutex<HashSet<(String, FormKind)>>>;

/// Tracks which (visitor, form) pairs have a submission in flight.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGate {
    in_flight: InFlight,
}

impl SubmissionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a submission as started.
    ///
    /// Returns `None` if the same visitor already has one in flight for
    /// `form`. The slot is released when the returned permit is dropped.
    #[must_use]
    pub fn try_begin(&self, owner: &str, form: FormKind) -> Option<SubmissionPermit> {
        let key = (owner.to_string(), form);
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());

        inserted.then(|| SubmissionPermit {
            in_flight: Arc::clone(&self.in_flight),
            key,
        })
    }
}

/// Held while a submission is in flight.
#[derive(Debug)]
#[must_use = "the submission slot is released when the permit is dropped"]
pub struct SubmissionPermit {
    in_flight: InFlight,
    key: (String, FormKind),
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
