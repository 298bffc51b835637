use db::{
    DbErr,
    models::task::TaskError,
    types::TaskStatus,
};
use serde::Serialize;
use thiserror::Error;

use super::{eligibility::DenialReason, ratchet::BidValidationError};

/// State conflicts. Resubmitting against fresh state may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum AuctionConflict {
    #[error("auction closed")]
    AuctionClosed,
    #[error("auction is still open")]
    AuctionOpen,
    #[error("task is not auctioned")]
    NotAuctioned,
    #[error("bid does not improve on current offer")]
    NotImproved,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("task was modified concurrently")]
    StaleState,
}

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error(transparent)]
    Denied(DenialReason),
    #[error(transparent)]
    Validation(#[from] BidValidationError),
    #[error(transparent)]
    Conflict(#[from] AuctionConflict),
    #[error("Invalid task: {0}")]
    InvalidTask(String),
    #[error("Task not found")]
    TaskNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, AuctionError>;

impl From<DenialReason> for AuctionError {
    fn from(reason: DenialReason) -> Self {
        Self::Denied(reason)
    }
}

impl From<TaskError> for AuctionError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Database(e) => Self::Database(e),
            TaskError::NotFound => Self::TaskNotFound,
            TaskError::UnknownReference("creator") => Self::UserNotFound,
            TaskError::UnknownReference(what) => Self::InvalidTask(format!("unknown {what}")),
            TaskError::StaleVersion => Self::Conflict(AuctionConflict::StaleState),
        }
    }
}
