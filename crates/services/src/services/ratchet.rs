use std::fmt;

use chrono::{DateTime, Utc};
use db::{
    models::{task::Task, user::User},
    types::{AuctionMode, Grade, Money},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use super::{
    eligibility,
    error::{AuctionConflict, AuctionError},
    lifecycle,
    money::{format_money, strip_separators},
};

/// A bid value as it arrives from a client: a JSON number or a formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum NumericInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct BidSubmission {
    pub value_money: Option<NumericInput>,
    pub value_time_minutes: Option<NumericInput>,
}

impl BidSubmission {
    pub fn money(value: impl Into<NumericInput>) -> Self {
        Self {
            value_money: Some(value.into()),
            value_time_minutes: None,
        }
    }

    pub fn time(value: impl Into<NumericInput>) -> Self {
        Self {
            value_money: None,
            value_time_minutes: Some(value.into()),
        }
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum BidValidationError {
    #[error("a bid value is required")]
    MissingValue,
    #[error("supply exactly one of value_money or value_time_minutes")]
    BothValues,
    #[error("this auction accepts {expected} bids only")]
    WrongMode { expected: AuctionMode },
    #[error("{field} is not a number: '{input}'")]
    NotANumber { field: &'static str, input: String },
    #[error("{field} must be a positive amount with at most two decimal places")]
    NotPositiveAmount { field: &'static str },
    #[error("{field} must be a positive whole number")]
    NotPositiveWhole { field: &'static str },
}

/// A normalized bid value for one auction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "mode", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidValue {
    Money(Money),
    Time(i64),
}

impl BidValue {
    pub fn money(self) -> Option<Money> {
        match self {
            BidValue::Money(value) => Some(value),
            BidValue::Time(_) => None,
        }
    }

    pub fn time_minutes(self) -> Option<i64> {
        match self {
            BidValue::Time(value) => Some(value),
            BidValue::Money(_) => None,
        }
    }

    /// Money ratchets up, time ratchets down.
    pub fn improves_on(self, best: BidValue) -> bool {
        match (self, best) {
            (BidValue::Money(candidate), BidValue::Money(best)) => candidate > best,
            (BidValue::Time(candidate), BidValue::Time(best)) => candidate < best,
            _ => false,
        }
    }
}

impl fmt::Display for BidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidValue::Money(amount) => f.write_str(&format_money(Some(*amount))),
            BidValue::Time(minutes) => write!(f, "{minutes} min"),
        }
    }
}

const MONEY_FIELD: &str = "value_money";
const TIME_FIELD: &str = "value_time_minutes";

fn positive_money(input: &NumericInput) -> Result<Money, BidValidationError> {
    let amount = match input {
        NumericInput::Integer(units) => Money::from_units(*units),
        NumericInput::Float(value) => Money::from_f64(*value),
        NumericInput::Text(text) => {
            let cleaned = strip_separators(text);
            if cleaned.parse::<f64>().is_err() {
                return Err(BidValidationError::NotANumber {
                    field: MONEY_FIELD,
                    input: text.clone(),
                });
            }
            Money::parse(&cleaned)
        }
    };
    amount
        .filter(|amount| amount.is_positive())
        .ok_or(BidValidationError::NotPositiveAmount { field: MONEY_FIELD })
}

fn positive_minutes(input: &NumericInput) -> Result<i64, BidValidationError> {
    let not_positive = || BidValidationError::NotPositiveWhole { field: TIME_FIELD };
    match input {
        NumericInput::Integer(value) if *value > 0 => Ok(*value),
        NumericInput::Integer(_) => Err(not_positive()),
        NumericInput::Float(value) => {
            if value.is_finite() && *value > 0.0 && value.fract() == 0.0 && *value < i64::MAX as f64
            {
                Ok(*value as i64)
            } else {
                Err(not_positive())
            }
        }
        NumericInput::Text(text) => {
            let cleaned = text.trim();
            if let Ok(value) = cleaned.parse::<i64>() {
                return positive_minutes(&NumericInput::Integer(value));
            }
            match cleaned.parse::<f64>() {
                Ok(value) => positive_minutes(&NumericInput::Float(value)),
                Err(_) => Err(BidValidationError::NotANumber {
                    field: TIME_FIELD,
                    input: text.clone(),
                }),
            }
        }
    }
}

/// Checks that exactly the value matching `mode` was supplied and normalizes it.
pub fn normalize_submission(
    mode: AuctionMode,
    submission: &BidSubmission,
) -> Result<BidValue, BidValidationError> {
    match (&submission.value_money, &submission.value_time_minutes, mode) {
        (Some(_), Some(_), _) => Err(BidValidationError::BothValues),
        (None, None, _) => Err(BidValidationError::MissingValue),
        (Some(value), None, AuctionMode::Money) => positive_money(value).map(BidValue::Money),
        (None, Some(value), AuctionMode::Time) => positive_minutes(value).map(BidValue::Time),
        _ => Err(BidValidationError::WrongMode { expected: mode }),
    }
}

/// Current best offer, falling back to the opening value before the first bid.
pub fn current_best(task: &Task) -> Option<BidValue> {
    match task.mode {
        AuctionMode::Money => task.current_price.or(task.base_price).map(BidValue::Money),
        AuctionMode::Time => task
            .current_time_minutes
            .or(task.base_time_minutes)
            .map(BidValue::Time),
    }
}

#[derive(Debug, Clone)]
pub struct AcceptedBid {
    pub value: BidValue,
    pub bidder_grade: Grade,
    /// The task with the new best value and provisional leader applied.
    pub task: Task,
    pub accepted_at: DateTime<Utc>,
}

/// Runs every acceptance rule in order against the task as currently stored.
/// Callers must hold the task's critical section between this check and the write.
pub fn place_bid(
    task: &Task,
    bidder: &User,
    submission: &BidSubmission,
    now: DateTime<Utc>,
) -> Result<AcceptedBid, AuctionError> {
    if !task.task_type.is_auctioned() {
        return Err(AuctionConflict::NotAuctioned.into());
    }

    let bidder_grade = eligibility::evaluate_bid_eligibility(task, bidder).into_result()?;

    if !lifecycle::is_open(task) {
        return Err(AuctionConflict::AuctionClosed.into());
    }

    let value = normalize_submission(task.mode, submission)?;

    if let Some(best) = current_best(task) {
        if !value.improves_on(best) {
            return Err(AuctionConflict::NotImproved.into());
        }
    }

    let mut next = task.clone();
    match value {
        BidValue::Money(amount) => next.current_price = Some(amount),
        BidValue::Time(minutes) => next.current_time_minutes = Some(minutes),
    }
    next.auction_has_bids = true;
    next.auction_leader_id = Some(bidder.id);
    next.auction_leader_name = Some(bidder.name.clone());

    Ok(AcceptedBid {
        value,
        bidder_grade,
        task: next,
        accepted_at: now,
    })
}
