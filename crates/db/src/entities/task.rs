use sea_orm::entity::prelude::*;

use crate::types::{AuctionMode, Grade, TaskStatus, TaskType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub mode: AuctionMode,
    pub status: TaskStatus,
    pub department_id: i64,
    pub management_id: Option<i64>,
    pub division_id: Option<i64>,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub minimum_grade: Grade,
    pub deadline: Option<DateTimeUtc>,
    pub base_price: Option<i64>,
    pub base_time_minutes: Option<i64>,
    pub current_price: Option<i64>,
    pub current_time_minutes: Option<i64>,
    pub auction_start_at: Option<DateTimeUtc>,
    pub auction_planned_end_at: Option<DateTimeUtc>,
    pub auction_end_at: Option<DateTimeUtc>,
    pub auction_extended_at: Option<DateTimeUtc>,
    pub auction_extension_count: i32,
    pub auction_has_bids: bool,
    pub auction_leader_id: Option<i64>,
    pub auction_leader_name: Option<String>,
    pub auction_winner_id: Option<i64>,
    pub auction_winner_name: Option<String>,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
