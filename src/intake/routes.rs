//! REST endpoints for the intake conversation and plan history.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::error::IntakeError;
use crate::routes::AppState;

/// Routes: `POST /api/chat`, `GET /api/plans`.
pub fn intake_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/plans", get(list_plans))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    access_token: String,
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, IntakeError> {
    let Json(body) = body?;
    let outcome = state
        .engine
        .submit(&body.access_token, body.session_id.as_deref(), &body.message)
        .await?;
    Ok(Json(outcome))
}

async fn list_plans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, IntakeError> {
    let token = bearer_token(&headers).ok_or(IntakeError::Unauthorized)?;
    let plans = state.engine.list_plans(token).await?;
    Ok(Json(serde_json::json!({ "plans": plans })))
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
