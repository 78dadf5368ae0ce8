//! Thin adapter between `reqwest` and the classification chain.
//!
//! Builds the shared HTTP client (timeouts + client certificate) and turns
//! a sent request into a [`RawResponse`]. Status codes are never checked
//! here; that is the classifier's job.

use reqwest::{Client, RequestBuilder};

use crate::classify::RawResponse;
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};

/// Builds the `reqwest::Client` shared by the token manager and the API
/// client. The client certificate, when configured, is attached here so
/// every request (token and resource) presents it.
pub(crate) fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .user_agent(config.user_agent());
    if let Some(identity) = config.identity() {
        builder = builder.identity(identity.to_reqwest()?);
    }
    builder
        .build()
        .map_err(|e| ApiError::config_with("failed to build HTTP client", e))
}

/// Sends `request` and reads the full body.
///
/// Only transport failures (connect, TLS, timeout, body read) are errors;
/// any HTTP status is returned as a `RawResponse`.
pub(crate) async fn execute(request: RequestBuilder, host: &str) -> Result<RawResponse> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let raw = RawResponse::new(status, bytes.to_vec(), host);
    if raw.parsed_body.is_null() && !raw.raw_body.is_empty() {
        tracing::debug!(status, host, len = raw.raw_body.len(), "response body is not JSON");
    }
    Ok(raw)
}
