//! Async Rust client for a REST API secured with OAuth2 client credentials
//! and mutual TLS.
//!
//! Every response, including the token endpoint's, is passed through a
//! fixed, ordered classification chain that turns it into either the parsed
//! JSON payload or a typed [`error::ApiFailure`].
//!
//! # Modules
//!
//! - [`auth`]: client-credentials token acquisition, cached per client.
//! - [`classify`]: the ordered error-classification rules.
//! - [`client`]: authenticated GET / POST / DELETE helpers.
//! - [`config`]: immutable configuration, builder, and TOML loading.
//! - [`error`]: typed error hierarchy (`ApiError`).
//!
//! # Quick Start
//!
//! ```ignore
//! use oauth_mtls_client::client::ApiClient;
//! use oauth_mtls_client::config::{ClientConfig, ClientIdentity};
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.example.com")
//!     .client_id("client-id")
//!     .client_secret("secret")
//!     .identity(ClientIdentity::from_file("client.pem")?)
//!     .build()?;
//! let client = ApiClient::new(config)?;
//! let event = client.get("events/42").await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
mod transport;

pub use classify::{classify, Outcome, RawResponse};
pub use client::{ApiClient, DeleteResponse};
pub use config::{ClientConfig, ClientConfigBuilder, ClientIdentity};
pub use error::{ApiError, ApiFailure, FailureKind, Result};
