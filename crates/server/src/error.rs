use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use serde_json::Value;
use services::services::error::AuctionError;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Auction(#[from] AuctionError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Auction(err) => match err {
                AuctionError::Denied(_) => (StatusCode::FORBIDDEN, "EligibilityDenied"),
                AuctionError::Validation(_) => (StatusCode::BAD_REQUEST, "BidValidationError"),
                AuctionError::InvalidTask(_) => (StatusCode::BAD_REQUEST, "InvalidTask"),
                AuctionError::Conflict(_) => (StatusCode::CONFLICT, "AuctionConflict"),
                AuctionError::TaskNotFound | AuctionError::UserNotFound => {
                    (StatusCode::NOT_FOUND, "NotFound")
                }
                AuctionError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
        }
    }

    /// Machine-readable detail so clients can branch without parsing messages.
    fn error_data(&self) -> Option<Value> {
        let ApiError::Auction(err) = self else {
            return None;
        };
        match err {
            AuctionError::Denied(reason) => serde_json::to_value(reason).ok(),
            AuctionError::Validation(err) => serde_json::to_value(err).ok(),
            AuctionError::Conflict(conflict) => serde_json::to_value(conflict).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        let error_message = match &self {
            ApiError::Auction(AuctionError::Database(_)) => format!("{}: {}", error_type, self),
            ApiError::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = match self.error_data() {
            Some(data) => ApiResponse::<(), Value>::error_with_data(data, &error_message),
            None => ApiResponse::<(), Value>::error(&error_message),
        };
        (status_code, Json(response)).into_response()
    }
}
