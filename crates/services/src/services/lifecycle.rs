use chrono::{DateTime, TimeDelta, Utc};
use db::{models::task::Task, types::TaskStatus};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{config::AuctionConfig, error::AuctionConflict};

/// Every status move the workflow permits. Anything else is rejected.
pub const ALLOWED_TRANSITIONS: [(TaskStatus, TaskStatus); 5] = [
    (TaskStatus::Backlog, TaskStatus::InProgress),
    (TaskStatus::InProgress, TaskStatus::UnderReview),
    (TaskStatus::UnderReview, TaskStatus::Done),
    (TaskStatus::UnderReview, TaskStatus::InProgress),
    (TaskStatus::InProgress, TaskStatus::Backlog),
];

pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
    ALLOWED_TRANSITIONS.contains(&(from, to))
}

pub fn check_transition(from: TaskStatus, to: TaskStatus) -> Result<(), AuctionConflict> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AuctionConflict::InvalidTransition { from, to })
    }
}

/// Status as shown to people. OVERDUE is derived and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayStatus {
    Backlog,
    InProgress,
    UnderReview,
    Done,
    Overdue,
}

pub fn display_status(task: &Task, now: DateTime<Utc>) -> DisplayStatus {
    if task.status != TaskStatus::Done && task.deadline.is_some_and(|deadline| deadline < now) {
        return DisplayStatus::Overdue;
    }
    match task.status {
        TaskStatus::Backlog => DisplayStatus::Backlog,
        TaskStatus::InProgress => DisplayStatus::InProgress,
        TaskStatus::UnderReview => DisplayStatus::UnderReview,
        TaskStatus::Done => DisplayStatus::Done,
    }
}

/// Open for bidding: started, still in backlog, not yet closed.
pub fn is_open(task: &Task) -> bool {
    task.task_type.is_auctioned()
        && task.status == TaskStatus::Backlog
        && task.auction_start_at.is_some()
        && task.auction_end_at.is_none()
}

/// Starts the auction window. `Ok(None)` when it was already opened.
pub fn open_auction(
    task: &Task,
    now: DateTime<Utc>,
    config: &AuctionConfig,
) -> Result<Option<Task>, AuctionConflict> {
    if !task.task_type.is_auctioned() {
        return Err(AuctionConflict::NotAuctioned);
    }
    if task.auction_start_at.is_some() {
        return Ok(None);
    }
    if task.status != TaskStatus::Backlog {
        return Err(AuctionConflict::AuctionClosed);
    }

    let mut next = task.clone();
    next.auction_start_at = Some(now);
    next.auction_planned_end_at = Some(now + config.duration_delta());
    next.auction_end_at = None;
    next.auction_extended_at = None;
    next.auction_extension_count = 0;
    Ok(Some(next))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    Idle,
    Extend { planned_end_at: DateTime<Utc> },
    Close,
}

/// Decides what the sweep should do with a task at `now`. Pure, so repeated
/// calls against the same stored state agree.
pub fn plan_sweep(
    task: &Task,
    last_bid_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &AuctionConfig,
) -> SweepAction {
    if !is_open(task) {
        return SweepAction::Idle;
    }
    let Some(planned_end_at) = task.auction_planned_end_at else {
        return SweepAction::Close;
    };
    if now >= planned_end_at {
        return SweepAction::Close;
    }
    if task.auction_extension_count >= config.max_extensions {
        return SweepAction::Idle;
    }

    let last_activity = [last_bid_at, task.auction_start_at, task.auction_extended_at]
        .into_iter()
        .flatten()
        .max();
    let stall_window = config.stall_window_delta();
    match last_activity {
        Some(at) if now - at > stall_window => SweepAction::Extend {
            planned_end_at: planned_end_at + stall_window,
        },
        _ => SweepAction::Idle,
    }
}

pub fn extend(task: &Task, planned_end_at: DateTime<Utc>, now: DateTime<Utc>) -> Task {
    let mut next = task.clone();
    next.auction_planned_end_at = Some(planned_end_at);
    next.auction_extended_at = Some(now);
    next.auction_extension_count = task.auction_extension_count.saturating_add(1);
    next
}

#[derive(Debug, Clone)]
pub enum CloseOutcome {
    AlreadyClosed,
    Closed { task: Task },
}

impl CloseOutcome {
    pub fn task(&self) -> Option<&Task> {
        match self {
            CloseOutcome::AlreadyClosed => None,
            CloseOutcome::Closed { task } => Some(task),
        }
    }
}

/// Finalizes an auction. The provisional leader becomes winner and assignee and
/// the task moves to IN_PROGRESS; without bids the task stays in BACKLOG.
pub fn close(task: &Task, now: DateTime<Utc>) -> Result<CloseOutcome, AuctionConflict> {
    if task.auction_end_at.is_some() {
        return Ok(CloseOutcome::AlreadyClosed);
    }
    if !task.task_type.is_auctioned() {
        return Err(AuctionConflict::NotAuctioned);
    }

    let mut next = task.clone();
    next.auction_end_at = Some(now);
    if let (true, Some(leader_id)) = (task.auction_has_bids, task.auction_leader_id) {
        check_transition(task.status, TaskStatus::InProgress)?;
        next.auction_winner_id = Some(leader_id);
        next.auction_winner_name = task.auction_leader_name.clone();
        next.assignee_id = Some(leader_id);
        next.status = TaskStatus::InProgress;
    }
    Ok(CloseOutcome::Closed { task: next })
}

/// Remaining time before the planned close, zero once it has passed.
pub fn time_remaining(task: &Task, now: DateTime<Utc>) -> Option<TimeDelta> {
    task.auction_planned_end_at
        .map(|end| (end - now).max(TimeDelta::zero()))
}
