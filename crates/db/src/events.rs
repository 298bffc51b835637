use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Money, TaskStatus};

pub const EVENT_TASK_CREATED: &str = "task.created";
pub const EVENT_TASK_STATUS_CHANGED: &str = "task.status_changed";

pub const EVENT_AUCTION_OPENED: &str = "auction.opened";
pub const EVENT_AUCTION_BID_PLACED: &str = "auction.bid_placed";
pub const EVENT_AUCTION_EXTENDED: &str = "auction.extended";
pub const EVENT_AUCTION_CLOSED: &str = "auction.closed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEventPayload {
    pub task_id: Uuid,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusChangedPayload {
    pub task_id: Uuid,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionWindowPayload {
    pub task_id: Uuid,
    pub planned_end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPlacedPayload {
    pub task_id: Uuid,
    pub bid_id: Uuid,
    pub bidder_id: Uuid,
    pub value_money: Option<Money>,
    pub value_time_minutes: Option<i64>,
}

/// Consumers of this event own point accrual for the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionClosedPayload {
    pub task_id: Uuid,
    pub task_title: String,
    pub winner_id: Option<Uuid>,
    pub closed_at: DateTime<Utc>,
}
