//! OAuth2 client-credentials authentication.
//!
//! Acquires a bearer token from `{base_url}/auth/oauth/v2/token` and caches
//! it inside [`TokenManager`]. Token endpoint responses go through the same
//! classification chain as every other request, so a rejected secret
//! surfaces as `FailureKind::Unauthorized` or `FailureKind::InvalidRequest`.
//!
//! The cached token is never refreshed. Once fetched it is reused for the
//! lifetime of the manager even after `expires_in` has elapsed; client
//! instances are expected to be shorter-lived than their tokens.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HOST};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{classify, Outcome};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::transport;

/// Token endpoint path, relative to the base URL.
pub const TOKEN_PATH: &str = "auth/oauth/v2/token";

/// Form body sent to the token endpoint.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

/// An access token as returned by the token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    /// Bearer value sent in the `Authorization` header.
    pub access_token: String,
    /// Usually `"Bearer"`.
    pub token_type: String,
    /// Lifetime in seconds as reported by the server. Informational only.
    pub expires_in: u64,
    pub scope: String,
}

impl Token {
    /// Builds a token from a parsed response body. Missing or mistyped
    /// fields become empty values instead of errors.
    pub fn from_body(body: &Value) -> Self {
        let text = |field: &str| {
            body.get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Token {
            access_token: text("access_token"),
            token_type: text("token_type"),
            expires_in: body
                .get("expires_in")
                .and_then(Value::as_u64)
                .unwrap_or_default(),
            scope: text("scope"),
        }
    }
}

/// Fetches and caches the access token.
///
/// Invariants:
/// - `cached` is `None` until the first successful `get_token()`.
/// - Once `Some`, it never changes and no further token requests are sent.
pub struct TokenManager {
    http: Client,
    config: Arc<ClientConfig>,
    cached: Option<Token>,
}

impl TokenManager {
    pub fn new(http: Client, config: Arc<ClientConfig>) -> Self {
        TokenManager {
            http,
            config,
            cached: None,
        }
    }

    /// Creates a manager with a pre-set token, bypassing the token endpoint.
    /// Used by tests to avoid an extra mocked round-trip.
    pub fn with_token(http: Client, config: Arc<ClientConfig>, token: Token) -> Self {
        TokenManager {
            http,
            config,
            cached: Some(token),
        }
    }

    /// Returns the cached token without touching the network.
    pub fn token(&self) -> Option<&Token> {
        self.cached.as_ref()
    }

    /// Returns the cached token, fetching it first if this is the first call.
    ///
    /// # Errors
    ///
    /// - `ApiError::Api` when the token endpoint response is classified as
    ///   a failure.
    /// - `ApiError::Network` on transport failure.
    pub async fn get_token(&mut self) -> Result<Token> {
        if let Some(token) = &self.cached {
            return Ok(token.clone());
        }
        let token = self.fetch().await?;
        self.cached = Some(token.clone());
        Ok(token)
    }

    async fn fetch(&self) -> Result<Token> {
        let url = self.config.url_for(TOKEN_PATH);
        let host = self.config.host();
        let form = TokenRequest {
            client_id: self.config.client_id(),
            client_secret: self.config.client_secret(),
            grant_type: "client_credentials",
        };

        tracing::info!(%url, client_id = self.config.client_id(), "requesting access token");
        let request = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(HOST, host)
            .form(&form);
        let response = transport::execute(request, host).await?;

        match classify(&response) {
            Outcome::Success(body) => {
                let token = Token::from_body(&body);
                if token.access_token.is_empty() {
                    tracing::warn!("token endpoint returned no access_token");
                }
                tracing::info!(
                    token_type = %token.token_type,
                    expires_in = token.expires_in,
                    "access token acquired"
                );
                Ok(token)
            }
            Outcome::Failure(failure) => {
                tracing::warn!(kind = ?failure.kind, status = failure.status, "token request rejected");
                Err(failure.into())
            }
        }
    }
}
