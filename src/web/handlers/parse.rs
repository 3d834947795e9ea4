use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::ErrorResponse;
use crate::jobs::{analyze_media, run_job, translate_subtitle, TaskKind, TaskStatus};
use crate::AppContext;

pub fn parse_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/analyze", post(create_analyze_task))
        .route("/translate", post(create_translate_task))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// Direct URL or local file path to the source SRT or VTT file.
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct TaskCreatedResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Submit a video URL for metadata extraction. Returns a task id
/// immediately; poll `GET /v1/tasks/{task_id}` for progress and results.
async fn create_analyze_task(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let task_id = match ctx.store.create(TaskKind::Analyze).await {
        Ok(task_id) => task_id,
        Err(e) => {
            error!("Failed to create task: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };
    info!("Created task {} for URL: {}", task_id, req.url);

    let store = ctx.store.clone();
    let bridge = ctx.progress.clone();
    let job_ctx = ctx.clone();
    let job_id = task_id.clone();
    tokio::spawn(async move {
        run_job(store, bridge, job_id, move |reporter| {
            analyze_media(job_ctx, req.url, reporter)
        })
        .await;
    });

    (
        StatusCode::OK,
        Json(TaskCreatedResponse {
            task_id,
            status: TaskStatus::Pending,
        }),
    )
        .into_response()
}

/// Submit an SRT/VTT source for translation into bilingual ASS. Returns a
/// task id immediately; the artifact is available from the download route
/// once the task completes.
async fn create_translate_task(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<TranslateRequest>,
) -> impl IntoResponse {
    let task_id = match ctx.store.create(TaskKind::Translate).await {
        Ok(task_id) => task_id,
        Err(e) => {
            error!("Failed to create task: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };
    info!("Created translation task {} for path: {}", task_id, req.path);

    let store = ctx.store.clone();
    let bridge = ctx.progress.clone();
    let job_ctx = ctx.clone();
    let job_id = task_id.clone();
    tokio::spawn(async move {
        run_job(store, bridge, job_id, move |reporter| {
            translate_subtitle(job_ctx, req.path, reporter)
        })
        .await;
    });

    (
        StatusCode::OK,
        Json(TaskCreatedResponse {
            task_id,
            status: TaskStatus::Pending,
        }),
    )
        .into_response()
}
