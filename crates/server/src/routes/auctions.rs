use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::Utc;
use db::{
    models::{auction_bid::AuctionBid, task::Task, user::User},
    types::UserRole,
};
use services::services::{
    auction::{AuctionListing, BidReceipt, SweepReport},
    eligibility::{BidEligibility, Visibility},
    ratchet::BidSubmission,
};

use crate::{AppState, error::ApiError, middleware::load_task_middleware, response::ApiResponse};

pub async fn list_auctions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<Vec<AuctionListing>>>, ApiError> {
    let auctions = state.auctions().list_auctions(user.id, Utc::now()).await?;
    Ok(ResponseJson(ApiResponse::success(auctions)))
}

pub async fn get_visibility(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<Visibility>>, ApiError> {
    let visibility = state
        .auctions()
        .evaluate_visibility(task.id, user.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(visibility)))
}

pub async fn get_eligibility(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<BidEligibility>>, ApiError> {
    let eligibility = state
        .auctions()
        .evaluate_bid_eligibility(task.id, user.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(eligibility)))
}

pub async fn get_bids(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<Vec<AuctionBid>>>, ApiError> {
    let visibility = state
        .auctions()
        .evaluate_visibility(task.id, user.id)
        .await?;
    if let Some(reason) = visibility.reason {
        return Err(ApiError::Forbidden(reason.to_string()));
    }
    let bids = state.auctions().bids(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(bids)))
}

pub async fn submit_bid(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    Extension(user): Extension<User>,
    Json(payload): Json<BidSubmission>,
) -> Result<ResponseJson<ApiResponse<BidReceipt>>, ApiError> {
    let receipt = state
        .auctions()
        .submit_bid(task.id, user.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(receipt)))
}

/// On-demand sweep; the background worker runs the same pass periodically.
pub async fn run_sweep(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<SweepReport>>, ApiError> {
    if !matches!(user.role, UserRole::Admin | UserRole::Director) {
        return Err(ApiError::Forbidden(
            "only administrators and directors can run the auction sweep".to_string(),
        ));
    }
    let report = state
        .auctions()
        .sweep_extensions_and_closes(Utc::now())
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/visibility", get(get_visibility))
        .route("/eligibility", get(get_eligibility))
        .route("/bids", get(get_bids).post(submit_bid))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(list_auctions))
        .route("/sweep", post(run_sweep))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/auctions", inner)
}
