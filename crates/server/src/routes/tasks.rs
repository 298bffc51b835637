use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::Utc;
use db::{
    models::{
        task::{CreateTask, Task},
        user::User,
    },
    types::TaskStatus,
};
use serde::Deserialize;
use services::services::auction::TaskView;
use ts_rs::TS;

use crate::{AppState, error::ApiError, middleware::load_task_middleware, response::ApiResponse};

#[derive(Debug, Deserialize, TS)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    tracing::debug!(
        "Creating {} task '{}' for {}",
        payload.task_type,
        payload.title,
        user.id
    );
    let task = state.auctions().create_task(user.id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<TaskView>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(TaskView::new(
        task,
        Utc::now(),
    ))))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state
        .auctions()
        .transition_status(task.id, payload.status)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task))
        .route("/status", put(update_task_status))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
