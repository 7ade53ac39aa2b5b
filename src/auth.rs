//! Identity verification against the hosted auth service.
//!
//! Every intake and roadmap call carries a caller-supplied access token.
//! The token is exchanged for a stable owner id before any storage access.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

/// Resolves an access token to the id of the user who owns it.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<String, AuthError>;
}

/// Upper bound on one identity lookup, connect through body.
const AUTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifier backed by the hosted auth service's `/auth/v1/user` endpoint.
pub struct HostedAuthVerifier {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

#[derive(Deserialize)]
struct UserResponse {
    id: Option<String>,
}

impl HostedAuthVerifier {
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Self {
        Self::with_timeout(base_url, anon_key, AUTH_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        anon_key: SecretString,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }
}

#[async_trait]
impl IdentityVerifier for HostedAuthVerifier {
    async fn verify(&self, access_token: &str) -> Result<String, AuthError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let response = self
            .client
            .get(self.user_url())
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Access token rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        match user.id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(AuthError::MalformedResponse("user has no id".to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Accepts tokens of the form `token-<owner>` and yields `<owner>`.
    pub struct StaticVerifier;

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, access_token: &str) -> Result<String, AuthError> {
            if access_token.is_empty() {
                return Err(AuthError::MissingToken);
            }
            access_token
                .strip_prefix("token-")
                .map(str::to_string)
                .ok_or(AuthError::Rejected { status: 401 })
        }
    }
}
