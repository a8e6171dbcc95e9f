use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::platform::webhook::{ParseError, WebhookParser, SIGNATURE_HEADER};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    parser: WebhookParser,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(parser: WebhookParser, dispatcher: Dispatcher) -> Self {
        Self { parser, dispatcher }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/callback", post(handle_callback))
        .with_state(state)
}

/// Serve the webhook endpoint until Ctrl-C.
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening for webhooks on http://{}/callback", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read webhook body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let events = match state.parser.parse_request(signature, &body) {
        Ok(events) => events,
        Err(ParseError::InvalidSignature) => {
            warn!("Rejected webhook with invalid signature");
            return StatusCode::BAD_REQUEST;
        }
        Err(e) => {
            error!("Failed to parse webhook: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    info!("Received {} webhook event(s)", events.len());

    // Run in a separate task: dropping this handler (client disconnect) must
    // not cancel outbound calls that are already in flight.
    let dispatcher = state.dispatcher.clone();
    let task = tokio::spawn(async move { dispatcher.dispatch(&events).await });
    if let Err(e) = task.await {
        error!("Event dispatch task failed: {}", e);
    }

    StatusCode::OK
}
