//! Startup checks.
//!
//! # Responsibilities
//! - Confirm the freshly bound server answers before declaring it ready
//!
//! # Design Decisions
//! - The check only logs; a failed check does not stop the service

use std::net::SocketAddr;
use std::time::Duration;

/// Request `GET /books` against the local server and report the status.
///
/// Returns `true` on HTTP 200.
pub async fn self_check(addr: SocketAddr) -> bool {
    let host = if addr.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], addr.port()))
    } else {
        addr
    };
    let url = format!("http://{host}/books");

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build self-check client");
            return false;
        }
    };

    match client.get(&url).send().await {
        Ok(res) if res.status() == reqwest::StatusCode::OK => {
            tracing::info!(url = %url, "Self-check succeeded: got HTTP 200 from /books");
            true
        }
        Ok(res) => {
            tracing::warn!(url = %url, status = %res.status(), "Self-check expected HTTP 200");
            false
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Self-check request failed");
            false
        }
    }
}
