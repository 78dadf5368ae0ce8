//! Authenticated HTTP client for the upstream REST API.
//!
//! `ApiClient` wraps a `reqwest::Client` and a `TokenManager` behind a
//! `Mutex`, providing JSON request helpers (`get`, `post`, `delete`) whose
//! responses all go through [`crate::classify::classify`].
//!
//! Token lifecycle:
//! - Lazy acquisition: the first request triggers the token fetch.
//! - At most one fetch per client instance. The lock is held across the
//!   fetch, so concurrent first calls on a shared client wait for the one
//!   in-flight request instead of each sending their own.
//! - No refresh and no 401 retry: a rejected token fails the call.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE, HOST};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::auth::{Token, TokenManager};
use crate::classify::{classify, Outcome, RawResponse};
use crate::config::ClientConfig;
use crate::error::{ApiFailure, FailureKind, Result};
use crate::transport;

/// Status and body of a DELETE response, returned without unwrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed response body; `Value::Null` when empty.
    pub body: Value,
}

/// Authenticated client for the upstream API.
///
/// `auth` is behind a `Mutex` because `get_token()` needs `&mut` while the
/// request methods take `&self`.
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
    auth: Mutex<TokenManager>,
}

impl ApiClient {
    /// Builds a client from `config`. No request is sent until the first call.
    ///
    /// # Errors
    ///
    /// `ApiError::Config` if the HTTP client cannot be built (for example,
    /// the certificate is rejected by the TLS backend).
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = Arc::new(config);
        let http = transport::build_http_client(&config)?;
        let auth = TokenManager::new(http.clone(), Arc::clone(&config));
        Ok(Self::from_parts(http, config, auth))
    }

    /// Builds a client that starts with `token` already cached, so no call
    /// to the token endpoint is ever made.
    pub fn with_token(config: ClientConfig, token: Token) -> Result<Self> {
        let config = Arc::new(config);
        let http = transport::build_http_client(&config)?;
        let auth = TokenManager::with_token(http.clone(), Arc::clone(&config), token);
        Ok(Self::from_parts(http, config, auth))
    }

    fn from_parts(http: Client, config: Arc<ClientConfig>, auth: TokenManager) -> Self {
        ApiClient {
            http,
            config,
            auth: Mutex::new(auth),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the access token, fetching it on first use.
    pub async fn token(&self) -> Result<Token> {
        self.auth.lock().await.get_token().await
    }

    /// Sends an authenticated GET and returns the response payload.
    pub async fn get(&self, path: &str) -> Result<Value> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        Ok(classified(response)?)
    }

    /// Sends an authenticated POST with a JSON body and returns the
    /// response payload. `body` is serialized as-is.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Ok(classified(response)?)
    }

    /// Sends an authenticated DELETE and returns status and body together.
    ///
    /// Responses matching the 500/400/401/404 rules still fail. A response
    /// that only trips the catch-all non-2xx rule is returned as a
    /// `DeleteResponse` like any success.
    pub async fn delete(&self, path: &str) -> Result<DeleteResponse> {
        let response = self.send::<()>(Method::DELETE, path, None).await?;
        let status = response.status_code;
        match classify(&response) {
            Outcome::Success(body) => Ok(DeleteResponse { status, body }),
            Outcome::Failure(failure) if failure.kind == FailureKind::UnknownError => {
                tracing::debug!(status, "delete returned non-2xx status, passing through");
                Ok(DeleteResponse {
                    status,
                    body: response.parsed_body,
                })
            }
            Outcome::Failure(failure) => Err(failure.into()),
        }
    }

    /// Alias for [`ApiClient::get`].
    pub async fn get_resource(&self, path: &str) -> Result<Value> {
        self.get(path).await
    }

    /// Alias for [`ApiClient::post`].
    pub async fn post_resource<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.post(path, body).await
    }

    /// Core request path shared by every verb: obtains the token, attaches
    /// the standard headers, and returns the unclassified response.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let token = self.token().await?;
        let url = self.config.url_for(path);
        let host = self.config.host();

        tracing::debug!(%method, %url, "sending request");
        let mut request = self
            .http
            .request(method, &url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
            .header(CONNECTION, "keep-alive")
            .header(HOST, host);
        if let Some(payload) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(payload)?);
        }

        let response = transport::execute(request, host).await?;
        tracing::debug!(status = response.status_code, %url, "received response");
        Ok(response)
    }
}

/// Runs the classifier and unwraps the payload, logging failures.
fn classified(response: RawResponse) -> std::result::Result<Value, ApiFailure> {
    classify(&response).into_result().inspect_err(|failure| {
        tracing::warn!(
            kind = ?failure.kind,
            status = failure.status,
            host = %response.host,
            "request failed"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .base_url("https://api.example.com")
            .client_id("cid")
            .client_secret("secret")
            .build()
            .unwrap()
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiClient>();
    }

    #[tokio::test]
    async fn with_token_exposes_preset_token() {
        let token = Token {
            access_token: "abc".to_string(),
            token_type: "Bearer".to_string(),
            ..Token::default()
        };
        let client = ApiClient::with_token(config(), token.clone()).unwrap();
        assert_eq!(client.token().await.unwrap(), token);
        assert_eq!(client.config().host(), "api.example.com");
    }
}
