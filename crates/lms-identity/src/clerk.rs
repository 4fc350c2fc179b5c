//! Clerk Identity Provider
//!
//! Implementation of `IdentityProvider` over the Clerk backend API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lms_core::{IdentityProvider, LmsError, Result, Role, UserId};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Clerk provider configuration
#[derive(Clone, Debug)]
pub struct ClerkConfig {
    /// Backend API base URL
    pub api_url: String,

    /// Backend secret key (`sk_...`)
    pub secret_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClerkConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.clerk.com".into(),
            secret_key: secret_key.into(),
            timeout_secs: 10,
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("CLERK_SECRET_KEY")
            .map_err(|_| LmsError::Upstream("CLERK_SECRET_KEY not set".into()))?;
        let mut config = Self::new(secret_key);
        if let Ok(api_url) = std::env::var("CLERK_API_URL") {
            config.api_url = api_url;
        }
        Ok(config)
    }
}

/// Claims read from the session token before asking Clerk to verify it
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sid: Option<String>,
    sub: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClerkSession {
    user_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    public_metadata: serde_json::Value,
}

/// Clerk identity provider
pub struct ClerkProvider {
    http: reqwest::Client,
    config: ClerkConfig,
}

impl ClerkProvider {
    /// Create from configuration
    pub fn from_config(config: ClerkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LmsError::Upstream(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClerkConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Send with the backend key. Client errors map to `rejected`,
    /// everything else that is not a success is an upstream failure.
    async fn send(&self, request: RequestBuilder, rejected: LmsError) -> Result<Response> {
        let response = request
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| LmsError::Upstream(format!("Clerk request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            tracing::debug!(status = %status, "Clerk rejected request");
            Err(rejected)
        } else {
            Err(LmsError::Upstream(format!("Clerk returned {status}")))
        }
    }
}

/// Clerk ids are `[A-Za-z0-9_]+`; anything else must not reach a URL path
fn is_plain_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Decode the unverified payload segment of a JWT
fn decode_claims(token: &str) -> Result<SessionClaims> {
    let malformed = || LmsError::Unauthorized("Malformed session token".into());
    let payload = token.split('.').nth(1).ok_or_else(malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| malformed())?;
    serde_json::from_slice(&bytes).map_err(|_| malformed())
}

#[async_trait]
impl IdentityProvider for ClerkProvider {
    async fn authenticate(&self, bearer: &str) -> Result<UserId> {
        let token = bearer.trim();
        if token.is_empty() {
            return Err(LmsError::Unauthorized("Missing session token".into()));
        }

        let claims = decode_claims(token)?;
        let (Some(sid), Some(sub)) = (claims.sid, claims.sub) else {
            return Err(LmsError::Unauthorized("Session token lacks sid or sub".into()));
        };
        if !is_plain_id(&sid) {
            return Err(LmsError::Unauthorized("Malformed session id".into()));
        }

        let request = self
            .http
            .post(self.url(&format!("/v1/sessions/{sid}/verify")))
            .json(&json!({ "token": token }));
        let session: ClerkSession = self
            .send(request, LmsError::Unauthorized("Session verification failed".into()))
            .await?
            .json()
            .await
            .map_err(|e| LmsError::Upstream(e.to_string()))?;

        if session.status != "active" {
            return Err(LmsError::Unauthorized(format!("Session is {}", session.status)));
        }
        if session.user_id != sub {
            tracing::warn!(sid = %sid, "Session user does not match token subject");
            return Err(LmsError::Unauthorized("Session user mismatch".into()));
        }

        Ok(UserId::new(session.user_id))
    }

    async fn role(&self, user_id: &UserId) -> Result<Role> {
        let request = self.http.get(self.url(&format!("/v1/users/{user_id}")));
        let user: ClerkUser = self
            .send(request, LmsError::NotFound("User".into()))
            .await?
            .json()
            .await
            .map_err(|e| LmsError::Upstream(e.to_string()))?;

        Ok(Role::from_metadata(
            user.public_metadata.get("role").and_then(serde_json::Value::as_str),
        ))
    }

    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<()> {
        let request = self
            .http
            .patch(self.url(&format!("/v1/users/{user_id}/metadata")))
            .json(&json!({ "public_metadata": { "role": role.as_str() } }));
        self.send(request, LmsError::NotFound("User".into())).await?;

        tracing::info!(user_id = %user_id, role = role.as_str(), "Role updated");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let request = self.http.get(self.url("/v1/jwks"));
        match self.send(request, LmsError::Upstream("Clerk rejected key".into())).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Clerk health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &'static str {
        "clerk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_claims() {
        let claims = decode_claims(&token(&json!({ "sid": "sess_1", "sub": "user_1" }))).unwrap();
        assert_eq!(claims.sid.as_deref(), Some("sess_1"));
        assert_eq!(claims.sub.as_deref(), Some("user_1"));
    }

    #[test]
    fn test_malformed_token_is_unauthorized() {
        assert!(matches!(decode_claims("nodots"), Err(LmsError::Unauthorized(_))));
        assert!(matches!(decode_claims("a.!!!.c"), Err(LmsError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_missing_claims_rejected_before_network() {
        let provider = ClerkProvider::from_config(ClerkConfig::new("sk_test")).unwrap();
        let err = provider
            .authenticate(&token(&json!({ "sub": "user_1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, LmsError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_session_id_must_be_plain() {
        assert!(is_plain_id("sess_2abcXYZ"));
        assert!(!is_plain_id("../users/user_2"));
        assert!(!is_plain_id("sess_1?x=1"));

        let provider = ClerkProvider::from_config(ClerkConfig::new("sk_test")).unwrap();
        let err = provider
            .authenticate(&token(&json!({ "sid": "../../v1/users/user_2", "sub": "user_1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, LmsError::Unauthorized(msg) if msg == "Malformed session id"));
    }

    #[test]
    fn test_url_join() {
        let mut config = ClerkConfig::new("sk_test");
        config.api_url = "http://localhost:8080/".into();
        let provider = ClerkProvider::from_config(config).unwrap();
        assert_eq!(provider.url("/v1/jwks"), "http://localhost:8080/v1/jwks");
    }
}
