//! HTTP entry point: `GET /health` and `POST /chat`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use runtime::{Assistant, Backend, TurnOutcome, TurnRequest};
use serde_json::{Value, json};
use tracing::{info, warn};

struct AppState<B> {
    assistant: Arc<Assistant<B>>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            assistant: self.assistant.clone(),
        }
    }
}

/// Routes for the chat service.
pub fn router<B: Backend + 'static>(assistant: Arc<Assistant<B>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat::<B>))
        .with_state(AppState { assistant })
}

/// Serve `app` on `addr` until ctrl-c.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "parley listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn chat<B: Backend + 'static>(
    State(state): State<AppState<B>>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let outcome = state.assistant.handle_turn(&request).await?;
    Ok(Json(outcome))
}

/// A failed turn, reported as `{"error": message}`.
#[derive(Debug)]
struct ApiError(runtime::Error);

impl From<runtime::Error> for ApiError {
    fn from(err: runtime::Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            runtime::Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self.0, "turn failed");
        let body = json!({"error": self.0.to_string()});
        (status, Json(body)).into_response()
    }
}
