use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::AppContext;

pub mod parse;
pub mod tasks;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .nest(
            "/v1",
            parse::parse_router(ctx.clone()).merge(tasks::task_router(ctx)),
        )
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
