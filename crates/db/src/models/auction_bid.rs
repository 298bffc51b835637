use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::auction_bid,
    models::ids,
    types::{Grade, Money},
};

/// An accepted bid. Rejected submissions are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuctionBid {
    pub id: Uuid,
    pub task_id: Uuid,
    pub bidder_id: Uuid,
    pub bidder_name: String,
    /// Snapshot of the bidder at bid time.
    pub bidder_grade: Grade,
    pub bidder_rating: f64,
    pub bidder_points: i64,
    pub value_money: Option<Money>,
    pub value_time_minutes: Option<i64>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAuctionBid {
    pub task_id: Uuid,
    pub bidder_id: Uuid,
    pub bidder_name: String,
    pub bidder_grade: Grade,
    pub bidder_rating: f64,
    pub bidder_points: i64,
    pub value_money: Option<Money>,
    pub value_time_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl AuctionBid {
    fn from_model(model: auction_bid::Model, task_id: Uuid, bidder_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            task_id,
            bidder_id,
            bidder_name: model.bidder_name,
            bidder_grade: model.bidder_grade,
            bidder_rating: model.bidder_rating,
            bidder_points: model.bidder_points,
            value_money: model.value_money.map(Money::from_minor),
            value_time_minutes: model.value_time_minutes,
            created_at: model.created_at,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateAuctionBid,
        bid_id: Uuid,
    ) -> Result<Self, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, data.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let bidder_row_id = ids::user_id_by_uuid(db, data.bidder_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Bidder not found".to_string()))?;

        let active = auction_bid::ActiveModel {
            uuid: Set(bid_id),
            task_id: Set(task_row_id),
            bidder_id: Set(bidder_row_id),
            bidder_name: Set(data.bidder_name.clone()),
            bidder_grade: Set(data.bidder_grade),
            bidder_rating: Set(data.bidder_rating),
            bidder_points: Set(data.bidder_points),
            value_money: Set(data.value_money.map(Money::minor)),
            value_time_minutes: Set(data.value_time_minutes),
            created_at: Set(data.created_at),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, data.task_id, data.bidder_id))
    }

    /// Bid history for a task, oldest first.
    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(task_row_id) = ids::task_id_by_uuid(db, task_id).await? else {
            return Ok(Vec::new());
        };
        let models = auction_bid::Entity::find()
            .filter(auction_bid::Column::TaskId.eq(task_row_id))
            .order_by_asc(auction_bid::Column::CreatedAt)
            .order_by_asc(auction_bid::Column::Id)
            .all(db)
            .await?;

        let bidder_row_ids: Vec<i64> = models.iter().map(|model| model.bidder_id).collect();
        let bidders = ids::user_uuids_by_ids(db, &bidder_row_ids).await?;
        models
            .into_iter()
            .map(|model| {
                let bidder_id = *bidders
                    .get(&model.bidder_id)
                    .ok_or(DbErr::RecordNotFound("Bidder not found".to_string()))?;
                Ok(Self::from_model(model, task_id, bidder_id))
            })
            .collect()
    }

    /// Time of the most recent accepted bid, if any.
    pub async fn latest_created_at<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, DbErr> {
        let Some(task_row_id) = ids::task_id_by_uuid(db, task_id).await? else {
            return Ok(None);
        };
        auction_bid::Entity::find()
            .select_only()
            .column(auction_bid::Column::CreatedAt)
            .filter(auction_bid::Column::TaskId.eq(task_row_id))
            .order_by_desc(auction_bid::Column::CreatedAt)
            .limit(1)
            .into_tuple()
            .one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        organization::Department,
        task::{AuctionMode, CreateTask, Task, TaskType},
        user::{CreateUser, User},
    };
    use crate::types::UserRole;

    #[tokio::test]
    async fn history_is_chronological_and_latest_is_tracked() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let department = Department::create(&db, Uuid::new_v4(), "Ops").await.unwrap();
        let mut data = CreateUser::new("Creator", UserRole::Manager);
        data.department_id = Some(department.id);
        let creator = User::create(&db, &data, Uuid::new_v4()).await.unwrap();
        let mut data = CreateUser::new("Bidder", UserRole::Employee);
        data.department_id = Some(department.id);
        let bidder = User::create(&db, &data, Uuid::new_v4()).await.unwrap();

        let task = Task::create(
            &db,
            &CreateTask {
                title: "Inventory".to_string(),
                description: None,
                task_type: TaskType::Department,
                mode: AuctionMode::Time,
                department_id: department.id,
                management_id: None,
                division_id: None,
                minimum_grade: None,
                deadline: None,
                base_price: None,
                base_time_minutes: Some(120),
            },
            creator.id,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert!(
            AuctionBid::latest_created_at(&db, task.id)
                .await
                .unwrap()
                .is_none()
        );

        let start = Utc::now();
        for (offset, minutes) in [(0, 110), (5, 100)] {
            let bid = CreateAuctionBid {
                task_id: task.id,
                bidder_id: bidder.id,
                bidder_name: bidder.name.clone(),
                bidder_grade: Grade::D,
                bidder_rating: 0.0,
                bidder_points: 0,
                value_money: None,
                value_time_minutes: Some(minutes),
                created_at: start + Duration::minutes(offset),
            };
            AuctionBid::create(&db, &bid, Uuid::new_v4()).await.unwrap();
        }

        let history = AuctionBid::find_by_task_id(&db, task.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value_time_minutes, Some(110));
        assert_eq!(history[1].value_time_minutes, Some(100));
        assert_eq!(history[1].bidder_id, bidder.id);

        let latest = AuctionBid::latest_created_at(&db, task.id).await.unwrap();
        assert_eq!(latest, Some(start + Duration::minutes(5)));
    }
}
