//! HTTP and SSE transports
//!
//! - `POST /mcp`: one JSON-RPC message per request, reply in the body
//! - `GET /sse` + `POST /messages?session_id=`: SSE transport. The stream
//!   first announces the message endpoint, then carries every reply.
//! - `GET /health`, `GET /metrics`

use super::protocol::McpResponse;
use super::server::McpServer;
use crate::metrics;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type Sessions = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<McpResponse>>>>;

#[derive(Clone)]
struct AppState {
    server: McpServer,
    sessions: Sessions,
}

/// Build the router for all HTTP endpoints
///
/// `/metrics` is only mounted when `expose_metrics` is set.
pub fn router(server: McpServer, expose_metrics: bool) -> Router {
    let state = AppState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    let mut router = Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/sse", get(sse_handler))
        .route("/messages", post(messages_handler))
        .route("/health", get(health_handler));
    if expose_metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind and serve until the listener fails
pub async fn serve(addr: SocketAddr, server: McpServer, expose_metrics: bool) -> Result<()> {
    if expose_metrics {
        metrics::init().context("Failed to initialize metrics")?;
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("MCP server listening on http://{} (SSE at /sse)", addr);

    axum::serve(listener, router(server, expose_metrics))
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Streamable-style endpoint: the reply is the response body
async fn mcp_handler(State(state): State<AppState>, body: String) -> Response {
    match state.server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Removes the session when the SSE stream is dropped
struct SessionGuard {
    sessions: Sessions,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
        metrics::SSE_SESSIONS_ACTIVE.dec();
        debug!("SSE session {} closed", self.id);
    }
}

async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().simple().to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    if let Ok(mut sessions) = state.sessions.lock() {
        sessions.insert(id.clone(), tx);
    }
    metrics::SSE_SESSIONS_ACTIVE.inc();
    info!("SSE session {} opened", id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={id}"));
    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id,
    };

    let replies = UnboundedReceiverStream::new(rx).map(move |response| {
        let _session = &guard;
        let event = Event::default()
            .event("message")
            .json_data(&response)
            .unwrap_or_else(|e| {
                error!("Failed to encode SSE message: {}", e);
                Event::default().event("message").data("{}")
            });
        Ok(event)
    });

    Sse::new(stream::once(async move { Ok(endpoint) }).chain(replies))
        .keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Accept a message for an SSE session; the reply arrives on the stream
async fn messages_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let sender = state
        .sessions
        .lock()
        .ok()
        .and_then(|sessions| sessions.get(&query.session_id).cloned());
    let Some(sender) = sender else {
        warn!("Message for unknown session {}", query.session_id);
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        if let Some(response) = server.handle_message(&body).await {
            if sender.send(response).is_err() {
                debug!("SSE session closed before reply was sent");
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}
