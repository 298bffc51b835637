use db::{
    models::{task::Task, user::User},
    types::{Grade, UserRole},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use super::scope;

/// Why a user may not see or bid on an auction. Visibility and bidding use
/// separate variants so callers can tell the two checks apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenialReason {
    #[error("administrators do not participate in auctions")]
    AdminExcluded,
    #[error("auction is limited to another department")]
    OtherDepartment,
    #[error("auction is limited to another division")]
    OtherDivision,
    #[error("administrators cannot bid")]
    AdminCannotBid,
    #[error("creator cannot bid on own task")]
    CreatorCannotBid,
    #[error("grade {required} or higher is required to bid, your grade is {actual}")]
    GradeTooLow { required: Grade, actual: Grade },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Visibility {
    pub visible: bool,
    pub reason: Option<DenialReason>,
    pub message: Option<String>,
}

impl Visibility {
    fn visible() -> Self {
        Self {
            visible: true,
            reason: None,
            message: None,
        }
    }

    fn hidden(reason: DenialReason) -> Self {
        Self {
            visible: false,
            reason: Some(reason),
            message: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct BidEligibility {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
    pub message: Option<String>,
    pub user_grade: Option<Grade>,
    pub minimum_grade: Option<Grade>,
}

impl BidEligibility {
    fn denied(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            message: Some(reason.to_string()),
            user_grade: None,
            minimum_grade: None,
        }
    }

    pub fn into_result(self) -> Result<Grade, DenialReason> {
        match (self.reason, self.user_grade) {
            (Some(reason), _) => Err(reason),
            (None, Some(grade)) => Ok(grade),
            (None, None) => Ok(Grade::D),
        }
    }
}

/// Grade implied by role when no grade is recorded for the user.
pub fn role_fallback_grade(role: UserRole) -> Grade {
    match role {
        UserRole::Admin | UserRole::Director => Grade::A,
        UserRole::Manager => Grade::B,
        UserRole::Senior => Grade::C,
        UserRole::Employee => Grade::D,
    }
}

/// Explicit grade wins over the role fallback.
pub fn effective_grade(user: &User) -> Grade {
    user.grade.unwrap_or_else(|| role_fallback_grade(user.role))
}

pub fn evaluate_visibility(task: &Task, user: &User) -> Visibility {
    if user.role == UserRole::Admin {
        return Visibility::hidden(DenialReason::AdminExcluded);
    }
    if !scope::same_department(task, user) {
        return Visibility::hidden(DenialReason::OtherDepartment);
    }
    if scope::requires_division(task) && !scope::same_division(task, user) {
        return Visibility::hidden(DenialReason::OtherDivision);
    }
    Visibility::visible()
}

pub fn evaluate_bid_eligibility(task: &Task, user: &User) -> BidEligibility {
    if user.role == UserRole::Admin {
        return BidEligibility::denied(DenialReason::AdminCannotBid);
    }
    if user.id == task.creator_id {
        return BidEligibility::denied(DenialReason::CreatorCannotBid);
    }
    if let Some(reason) = evaluate_visibility(task, user).reason {
        return BidEligibility::denied(reason);
    }

    let user_grade = effective_grade(user);
    let (allowed, reason) = if user_grade.at_least(task.minimum_grade) {
        (true, None)
    } else {
        (
            false,
            Some(DenialReason::GradeTooLow {
                required: task.minimum_grade,
                actual: user_grade,
            }),
        )
    };

    BidEligibility {
        allowed,
        reason,
        message: reason.map(|reason| reason.to_string()),
        user_grade: Some(user_grade),
        minimum_grade: Some(task.minimum_grade),
    }
}
