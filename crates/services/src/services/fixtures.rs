//! Plain in-memory tasks and users for the pure engine tests.

use chrono::{TimeZone, Utc};
use db::{
    models::{task::Task, user::User},
    types::{AuctionMode, Grade, Money, TaskStatus, TaskType, UserRole},
};
use uuid::Uuid;

pub fn department() -> Uuid {
    Uuid::from_u128(0xD0)
}

pub fn division() -> Uuid {
    Uuid::from_u128(0xD1)
}

pub fn other_division() -> Uuid {
    Uuid::from_u128(0xD2)
}

pub fn user(role: UserRole) -> User {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    User {
        id: Uuid::new_v4(),
        name: format!("{role} user"),
        role,
        department_id: Some(department()),
        management_id: None,
        division_id: Some(division()),
        grade: None,
        rating: 4.5,
        points: 0,
        point_entries: 0,
        created_at: at,
        updated_at: at,
    }
}

pub fn graded(grade: Grade) -> User {
    let mut user = user(UserRole::Employee);
    user.grade = Some(grade);
    user
}

pub fn task(task_type: TaskType, mode: AuctionMode) -> Task {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    Task {
        id: Uuid::new_v4(),
        title: "Quarterly report".to_string(),
        description: None,
        task_type,
        mode,
        status: TaskStatus::Backlog,
        department_id: department(),
        management_id: None,
        division_id: Some(division()),
        creator_id: Uuid::new_v4(),
        assignee_id: None,
        minimum_grade: Grade::D,
        deadline: None,
        base_price: matches!(mode, AuctionMode::Money)
            .then(|| Money::from_minor(90_000_000)),
        base_time_minutes: matches!(mode, AuctionMode::Time).then_some(480),
        current_price: None,
        current_time_minutes: None,
        auction_start_at: Some(at),
        auction_planned_end_at: Some(at + chrono::TimeDelta::hours(24)),
        auction_end_at: None,
        auction_extended_at: None,
        auction_extension_count: 0,
        auction_has_bids: false,
        auction_leader_id: None,
        auction_leader_name: None,
        auction_winner_id: None,
        auction_winner_name: None,
        version: 0,
        created_at: at,
        updated_at: at,
    }
}
