//! CLI entry point for oauth-mtls-client.
//!
//! Authenticates via OAuth2 client credentials over mutual TLS, sends one
//! request, and prints the JSON result to stdout.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (config, auth, API, network)
//! - 2: argument validation error (clap handles this automatically)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use oauth_mtls_client::config::{ClientConfig, ClientIdentity, FileConfig};
use oauth_mtls_client::{ApiClient, ApiError};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML file with base_url, client_id, certificate_path, etc.
    /// Flags and environment variables override values from the file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the API (e.g. https://api.example.com).
    #[arg(long, env = "API_BASE_URL")]
    base_url: Option<String>,

    /// OAuth2 client ID.
    #[arg(long, env = "API_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret. Prefer the API_CLIENT_SECRET environment
    /// variable to keep the secret out of process listings and shell history.
    #[arg(long, env = "API_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// PEM file holding the client certificate with its private key appended.
    #[arg(long, env = "API_CLIENT_CERT")]
    cert: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// GET a resource and print its JSON body.
    Get { path: String },
    /// POST a JSON document and print the response body.
    Post {
        path: String,
        /// Request body; must be valid JSON.
        #[arg(long)]
        data: String,
    },
    /// DELETE a resource and print its status and body.
    Delete { path: String },
}

fn build_config(cli: &Cli) -> Result<ClientConfig, ApiError> {
    let mut builder = ClientConfig::builder();
    if let Some(path) = &cli.config {
        builder = builder.merge_file(&FileConfig::load(path)?)?;
    }
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(id) = &cli.client_id {
        builder = builder.client_id(id);
    }
    if let Some(secret) = &cli.client_secret {
        builder = builder.client_secret(secret);
    }
    if let Some(cert) = &cli.cert {
        builder = builder.identity(ClientIdentity::from_file(cert)?);
    }
    builder.build()
}

async fn run(cli: Cli) -> Result<serde_json::Value, ApiError> {
    let client = ApiClient::new(build_config(&cli)?)?;
    match cli.command {
        Command::Get { path } => client.get(&path).await,
        Command::Post { path, data } => {
            let body: serde_json::Value = serde_json::from_str(&data)?;
            client.post(&path, &body).await
        }
        Command::Delete { path } => {
            let resp = client.delete(&path).await?;
            Ok(serde_json::json!({ "status": resp.status, "body": resp.body }))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
