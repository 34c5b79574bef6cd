// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Liveness endpoint built on axum.
//!
//! Hosting platforms probe `GET /health` to keep the process alive and
//! restart it when it stops answering. The endpoint is unauthenticated and
//! reports nothing sensitive.

use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use rentline_config::model::HealthConfig;
use rentline_core::RentlineError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared state for the health handler.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// `GET /health`
pub async fn get_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Builds the health router.
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .with_state(state)
}

/// Serves the liveness endpoint until the cancellation token fires.
pub async fn serve(config: &HealthConfig, cancel: CancellationToken) -> Result<(), RentlineError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RentlineError::Internal(format!("failed to bind health endpoint {addr}: {e}")))?;

    info!(addr = addr.as_str(), "health endpoint listening");

    let app = router(HealthState {
        start_time: Instant::now(),
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| RentlineError::Internal(format!("health endpoint failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_handler_reports_ok() {
        let state = HealthState {
            start_time: Instant::now(),
        };
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert!(body.uptime_secs < 5);
    }

    #[tokio::test]
    async fn serve_shuts_down_on_cancel() {
        let config = HealthConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 0, // ephemeral
        };
        let cancel = CancellationToken::new();
        let server_cancel = cancel.clone();
        let handle = tokio::spawn(async move { serve(&config, server_cancel).await });

        // Give the listener a moment to bind, then shut it down.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}
