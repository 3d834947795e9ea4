use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use super::ErrorResponse;
use crate::jobs::types::{TaskKind, TaskRecord, TaskResult, TaskStatus};
use crate::AppContext;

pub fn task_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/tasks/:task_id", get(get_task_status))
        .route("/tasks/:task_id/download", get(download_artifact))
        .with_state(ctx)
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
}

impl From<TaskRecord> for TaskStatusResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.task_id,
            status: record.status,
            progress: record.progress,
            result: record.result,
            error: record.error,
        }
    }
}

/// Poll the state of a task.
async fn get_task_status(
    State(ctx): State<Arc<AppContext>>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    match ctx.store.get(&task_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(TaskStatusResponse::from(record))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Task not found")),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to get task {}: {}", task_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Download the rendered subtitle artifact of a completed translation task.
async fn download_artifact(
    State(ctx): State<Arc<AppContext>>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let record = match ctx.store.get(&task_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Task not found")),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to get task {}: {}", task_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    if record.kind != TaskKind::Translate {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Task is not a translation task")),
        )
            .into_response();
    }
    if record.status != TaskStatus::Completed {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Task is not completed yet")),
        )
            .into_response();
    }

    let Some(TaskResult::Translate(artifact)) = record.result else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Completed task carries no artifact")),
        )
            .into_response();
    };

    match tokio::fs::read(&artifact.output_path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.output_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(
                "Artifact for task {} missing at {}: {}",
                task_id, artifact.output_path, e
            );
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Output file no longer exists")),
            )
                .into_response()
        }
    }
}
