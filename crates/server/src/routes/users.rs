use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use services::services::auction::UserGrade;
use uuid::Uuid;

use crate::{AppState, error::ApiError, response::ApiResponse};

pub async fn get_user_grade(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<UserGrade>>, ApiError> {
    let grade = state.auctions().user_grade(user_id).await?;
    Ok(ResponseJson(ApiResponse::success(grade)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{user_id}/grade", get(get_user_grade))
}
