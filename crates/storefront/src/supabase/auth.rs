//! Identity API (`/auth/v1`) endpoints.

use serde::Serialize;
use tracing::instrument;

use yeezy_marketplace_core::{Email, Password};

use super::{Session, SignUpResponse, SupabaseClient, SupabaseError, UserMetadata};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a UserMetadata,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

impl SupabaseClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with the service's message when the
    /// credentials are rejected (e.g. "Invalid login credentials").
    #[instrument(skip_all, fields(email_domain = %email.domain()))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &Password,
    ) -> Result<Session, SupabaseError> {
        let url = self.auth_endpoint("token?grant_type=password")?;
        let request = self.inner.client.post(url).json(&PasswordGrant {
            email: email.as_str(),
            password: password.expose(),
        });

        self.send_json(request).await
    }

    /// Create an account, attaching `metadata` as the user's profile data.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` when the service refuses the account
    /// (already registered, weak password, signups disabled).
    #[instrument(skip_all, fields(email_domain = %email.domain()))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &Password,
        metadata: &UserMetadata,
    ) -> Result<SignUpResponse, SupabaseError> {
        let url = self.auth_endpoint("signup")?;
        let request = self.inner.client.post(url).json(&SignUpRequest {
            email: email.as_str(),
            password: password.expose(),
            data: metadata,
        });

        self.send_json(request).await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the refresh token was revoked or
    /// already used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, SupabaseError> {
        let url = self.auth_endpoint("token?grant_type=refresh_token")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&RefreshGrant { refresh_token });

        self.send_json(request).await
    }

    /// Revoke the session that owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers treat this as best effort.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.auth_endpoint("logout")?;
        let request = self.inner.client.post(url).bearer_auth(access_token);

        self.send(request).await.map(|_| ())
    }

    /// Send a password recovery email.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the service refuses (e.g. rate limited).
    #[instrument(skip_all, fields(email_domain = %email.domain()))]
    pub async fn send_password_recovery(&self, email: &Email) -> Result<(), SupabaseError> {
        let url = self.auth_endpoint("recover")?;
        let request = self.inner.client.post(url).json(&RecoverRequest {
            email: email.as_str(),
        });

        self.send(request).await.map(|_| ())
    }

    /// Check that the identity service is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the health endpoint does not answer with success.
    pub async fn health(&self) -> Result<(), SupabaseError> {
        let url = self.auth_endpoint("health")?;
        self.send(self.inner.client.get(url)).await.map(|_| ())
    }
}
