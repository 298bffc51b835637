use sea_orm::entity::prelude::*;

use crate::types::Grade;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "auction_bids")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub task_id: i64,
    pub bidder_id: i64,
    pub bidder_name: String,
    pub bidder_grade: Grade,
    pub bidder_rating: f64,
    pub bidder_points: i64,
    pub value_money: Option<i64>,
    pub value_time_minutes: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
