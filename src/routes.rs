//! Top-level HTTP router.

use std::sync::Arc;

use axum::{Json, Router, response::IntoResponse, routing::get};
use tower_http::cors::CorsLayer;

use crate::intake::ConversationEngine;
use crate::intake::routes::intake_routes;
use crate::plan::PlanGenerator;
use crate::plan::routes::plan_routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub generator: Arc<PlanGenerator>,
}

impl AppState {
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        let generator = engine.generator().clone();
        Self { engine, generator }
    }
}

/// Build the Axum router with intake, plan, and health routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(intake_routes())
        .merge(plan_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-guide"
    }))
}
