//! Credentials collected by the sign-in and sign-up forms.
//!
//! Credentials live only for the duration of one form submission. The
//! password is wrapped in [`SecretString`] so it is redacted from `Debug`
//! output and zeroized when dropped.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::Email;

/// Errors from local password checks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// No password was supplied.
    #[error("Password is required")]
    Empty,
    /// The password is shorter than [`Password::MIN_LENGTH`] characters.
    #[error("Password must be at least {min} characters")]
    TooShort {
        /// Minimum number of characters.
        min: usize,
    },
}

/// A password as typed by the visitor.
pub struct Password(SecretString);

impl Password {
    /// Minimum password length accepted by the sign-up form.
    pub const MIN_LENGTH: usize = 6;

    /// Wrap a raw password.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Empty`] if the password is empty. Whitespace
    /// is significant and is not trimmed.
    pub fn new(raw: String) -> Result<Self, PasswordError> {
        if raw.is_empty() {
            return Err(PasswordError::Empty);
        }
        Ok(Self(SecretString::from(raw)))
    }

    /// Length in characters, not bytes.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.expose_secret().chars().count()
    }

    /// Check the sign-up minimum length.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::TooShort`] below [`Password::MIN_LENGTH`].
    pub fn ensure_min_length(&self) -> Result<(), PasswordError> {
        if self.char_len() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(())
    }

    /// Borrow the raw password for the outgoing request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Credentials for a single sign-in or sign-up submission.
#[derive(Debug)]
pub struct Credentials {
    /// Account email.
    pub email: Email,
    /// Account password.
    pub password: Password,
    /// Display name, sent as profile data on sign-up.
    pub full_name: Option<String>,
}

impl Credentials {
    /// Credentials for signing in.
    #[must_use]
    pub const fn sign_in(email: Email, password: Password) -> Self {
        Self {
            email,
            password,
            full_name: None,
        }
    }

    /// Credentials for creating an account.
    ///
    /// A blank display name is treated as absent.
    #[must_use]
    pub fn sign_up(email: Email, password: Password, full_name: &str) -> Self {
        let full_name = full_name.trim();
        Self {
            email,
            password,
            full_name: (!full_name.is_empty()).then(|| full_name.to_owned()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_empty_rejected() {
        assert!(matches!(
            Password::new(String::new()),
            Err(PasswordError::Empty)
        ));
    }

    #[test]
    fn test_password_min_length_boundary() {
        let short = Password::new("12345".to_string()).unwrap();
        assert_eq!(
            short.ensure_min_length(),
            Err(PasswordError::TooShort { min: 6 })
        );

        let exact = Password::new("123456".to_string()).unwrap();
        assert!(exact.ensure_min_length().is_ok());
    }

    #[test]
    fn test_password_length_counts_chars() {
        // Five characters, ten bytes
        let pw = Password::new("ééééé".to_string()).unwrap();
        assert_eq!(pw.char_len(), 5);
        assert!(pw.ensure_min_length().is_err());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let pw = Password::new("hunter22".to_string()).unwrap();
        let creds = Credentials::sign_in(Email::parse("a@b.c").unwrap(), pw);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_sign_up_blank_name_is_none() {
        let creds = Credentials::sign_up(
            Email::parse("a@b.c").unwrap(),
            Password::new("secret1".to_string()).unwrap(),
            "   ",
        );
        assert!(creds.full_name.is_none());

        let creds = Credentials::sign_up(
            Email::parse("a@b.c").unwrap(),
            Password::new("secret1".to_string()).unwrap(),
            " Ada Lovelace ",
        );
        assert_eq!(creds.full_name.as_deref(), Some("Ada Lovelace"));
    }
}
