use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::task::Task;
use services::services::error::AuctionError;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Identifies the caller; issued by the authentication layer in front of us.
pub const USER_ID_HEADER: &str = "x-user-id";

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn load_task_middleware(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let task =
        fetch_model_or_status("Task", task_id, Task::find_by_id(&state.db().pool, task_id))
            .await?;
    request.extensions_mut().insert(task);
    Ok(next.run(request).await)
}

fn acting_user_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}

/// Loads the calling user, grade resolved, into request extensions.
pub async fn require_acting_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = acting_user_id(request.headers()).ok_or(ApiError::Unauthorized)?;
    let user = match state.auctions().load_participant(user_id).await {
        Ok(user) => user,
        Err(AuctionError::UserNotFound) => {
            tracing::debug!(%user_id, "unknown acting user");
            return Err(ApiError::Unauthorized);
        }
        Err(err) => return Err(err.into()),
    };
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn acting_user_header_must_be_a_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert_eq!(acting_user_id(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(acting_user_id(&headers), None);

        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&format!(" {id} ")).unwrap(),
        );
        assert_eq!(acting_user_id(&headers), Some(id));
    }
}
