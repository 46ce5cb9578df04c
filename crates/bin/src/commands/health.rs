//! `armory health`: probe a running server.
//!
//! The server counts as healthy when `/health` reports `healthy` and the
//! catalog version under `/api/v1/version` can be read.

use std::time::Duration;

use serde::Deserialize;

use crate::cli::HealthArgs;

#[derive(Deserialize)]
struct HealthBody {
    status: String,
    backend: String,
}

#[derive(Deserialize)]
struct VersionBody {
    updated_at: String,
}

/// Join `path` onto the server root, accepting a root given with a trailing
/// slash or as the `/health` URL itself.
fn endpoint(base: &str, path: &str) -> String {
    let root = base.trim_end_matches('/');
    let root = root.strip_suffix("/health").unwrap_or(root);
    format!("{root}{path}")
}

async fn fetch<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("failed to connect to {url}: {e}"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("{url} returned HTTP status {status}"));
    }
    response
        .json()
        .await
        .map_err(|e| format!("{url} returned an unexpected body: {e}"))
}

async fn probe(args: &HealthArgs) -> Result<String, String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .map_err(|e| e.to_string())?;

    let health: HealthBody = fetch(&client, &endpoint(&args.url, "/health")).await?;
    if health.status != "healthy" {
        return Err(format!("server reported status {}", health.status));
    }
    let version: VersionBody = fetch(&client, &endpoint(&args.url, "/api/v1/version")).await?;

    Ok(format!(
        "backend {}, catalog updated at {}",
        health.backend, version.updated_at
    ))
}

/// Run the health check command
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    match probe(args).await {
        Ok(report) => {
            println!("healthy: {report}");
            Ok(())
        }
        Err(reason) => {
            eprintln!("unhealthy: {reason}");
            std::process::exit(1);
        }
    }
}
