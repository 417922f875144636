//! HTTP trigger.
//!
//! Any method on any path starts one detection run; the request body is
//! ignored. Errors stop at [`TriggerError`], which logs them and answers with
//! a plain 500.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::detector::Detector;
use crate::error::{Error, Result};

/// Body returned when the full cycle completed.
pub const SUCCESS_BODY: &str = "success!";
const FAILURE_BODY: &str = "invocation failed";

pub fn router(detector: Arc<Detector>) -> Router {
    Router::new()
        .fallback(trigger)
        .layer(TraceLayer::new_for_http())
        .with_state(detector)
}

async fn trigger(State(detector): State<Arc<Detector>>) -> std::result::Result<&'static str, TriggerError> {
    detector.run().await?;
    Ok(SUCCESS_BODY)
}

/// Error boundary around one invocation.
#[derive(Debug)]
pub struct TriggerError(Error);

impl From<Error> for TriggerError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, detail = ?self.0, "Invocation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
    }
}

pub async fn serve(config: &ServerConfig, detector: Arc<Detector>) -> Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Trigger listening on http://{}", addr);

    axum::serve(listener, router(detector))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Trigger stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
