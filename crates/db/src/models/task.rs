use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::{AuctionMode, Grade, Money, TaskStatus, TaskType};
use crate::{
    entities::task,
    events::{EVENT_TASK_CREATED, TaskEventPayload},
    models::{event_outbox::EventOutbox, ids},
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    NotFound,
    #[error("Unknown {0}")]
    UnknownReference(&'static str),
    #[error("Task was modified concurrently")]
    StaleVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub mode: AuctionMode,
    pub status: TaskStatus,
    pub department_id: Uuid,
    pub management_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub minimum_grade: Grade,
    #[ts(type = "Date | null")]
    pub deadline: Option<DateTime<Utc>>,
    pub base_price: Option<Money>,
    pub base_time_minutes: Option<i64>,
    pub current_price: Option<Money>,
    pub current_time_minutes: Option<i64>,
    #[ts(type = "Date | null")]
    pub auction_start_at: Option<DateTime<Utc>>,
    #[ts(type = "Date | null")]
    pub auction_planned_end_at: Option<DateTime<Utc>>,
    /// Actual close time; never rewritten once set.
    #[ts(type = "Date | null")]
    pub auction_end_at: Option<DateTime<Utc>>,
    #[ts(type = "Date | null")]
    pub auction_extended_at: Option<DateTime<Utc>>,
    pub auction_extension_count: u32,
    pub auction_has_bids: bool,
    /// Current best bidder; becomes the winner only when the auction closes.
    pub auction_leader_id: Option<Uuid>,
    pub auction_leader_name: Option<String>,
    pub auction_winner_id: Option<Uuid>,
    pub auction_winner_name: Option<String>,
    pub version: i64,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub mode: AuctionMode,
    pub department_id: Uuid,
    pub management_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub minimum_grade: Option<Grade>,
    #[ts(type = "Date | null")]
    pub deadline: Option<DateTime<Utc>>,
    pub base_price: Option<Money>,
    pub base_time_minutes: Option<i64>,
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let department_id = ids::department_uuid_by_id(db, model.department_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Department not found".to_string()))?;
        let management_id = match model.management_id {
            Some(id) => ids::management_uuid_by_id(db, id).await?,
            None => None,
        };
        let division_id = match model.division_id {
            Some(id) => ids::division_uuid_by_id(db, id).await?,
            None => None,
        };

        let user_row_ids: Vec<i64> = [
            Some(model.creator_id),
            model.assignee_id,
            model.auction_leader_id,
            model.auction_winner_id,
        ]
        .into_iter()
        .flatten()
        .collect();
        let users = ids::user_uuids_by_ids(db, &user_row_ids).await?;
        let creator_id = *users
            .get(&model.creator_id)
            .ok_or(DbErr::RecordNotFound("Creator not found".to_string()))?;
        let lookup = |row_id: Option<i64>| row_id.and_then(|id| users.get(&id).copied());

        Ok(Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            task_type: model.task_type,
            mode: model.mode,
            status: model.status,
            department_id,
            management_id,
            division_id,
            creator_id,
            assignee_id: lookup(model.assignee_id),
            minimum_grade: model.minimum_grade,
            deadline: model.deadline,
            base_price: model.base_price.map(Money::from_minor),
            base_time_minutes: model.base_time_minutes,
            current_price: model.current_price.map(Money::from_minor),
            current_time_minutes: model.current_time_minutes,
            auction_start_at: model.auction_start_at,
            auction_planned_end_at: model.auction_planned_end_at,
            auction_end_at: model.auction_end_at,
            auction_extended_at: model.auction_extended_at,
            auction_extension_count: u32::try_from(model.auction_extension_count)
                .unwrap_or_default(),
            auction_has_bids: model.auction_has_bids,
            auction_leader_id: lookup(model.auction_leader_id),
            auction_leader_name: model.auction_leader_name,
            auction_winner_id: lookup(model.auction_winner_id),
            auction_winner_name: model.auction_winner_name,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        models: Vec<task::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Auctions that have started and not yet closed, oldest first.
    pub async fn find_open_auctions<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::Status.eq(TaskStatus::Backlog))
            .filter(task::Column::TaskType.ne(TaskType::Individual))
            .filter(task::Column::AuctionStartAt.is_not_null())
            .filter(task::Column::AuctionEndAt.is_null())
            .order_by_asc(task::Column::AuctionPlannedEndAt)
            .all(db)
            .await?;
        Self::from_models(db, models).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        creator_id: Uuid,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        let department_row_id = ids::department_id_by_uuid(db, data.department_id)
            .await?
            .ok_or(TaskError::UnknownReference("department"))?;
        let management_row_id = match data.management_id {
            Some(id) => Some(
                ids::management_id_by_uuid(db, id)
                    .await?
                    .ok_or(TaskError::UnknownReference("management"))?,
            ),
            None => None,
        };
        let division_row_id = match data.division_id {
            Some(id) => Some(
                ids::division_id_by_uuid(db, id)
                    .await?
                    .ok_or(TaskError::UnknownReference("division"))?,
            ),
            None => None,
        };
        let creator_row_id = ids::user_id_by_uuid(db, creator_id)
            .await?
            .ok_or(TaskError::UnknownReference("creator"))?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            title: Set(data.title.trim().to_string()),
            description: Set(data.description.clone()),
            task_type: Set(data.task_type),
            mode: Set(data.mode),
            status: Set(TaskStatus::Backlog),
            department_id: Set(department_row_id),
            management_id: Set(management_row_id),
            division_id: Set(division_row_id),
            creator_id: Set(creator_row_id),
            assignee_id: Set(None),
            minimum_grade: Set(data.minimum_grade.unwrap_or_default()),
            deadline: Set(data.deadline),
            base_price: Set(data.base_price.map(Money::minor)),
            base_time_minutes: Set(data.base_time_minutes),
            current_price: Set(None),
            current_time_minutes: Set(None),
            auction_start_at: Set(None),
            auction_planned_end_at: Set(None),
            auction_end_at: Set(None),
            auction_extended_at: Set(None),
            auction_extension_count: Set(0),
            auction_has_bids: Set(false),
            auction_leader_id: Set(None),
            auction_leader_name: Set(None),
            auction_winner_id: Set(None),
            auction_winner_name: Set(None),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        EventOutbox::enqueue(
            db,
            EVENT_TASK_CREATED,
            "task",
            task_id,
            &TaskEventPayload {
                task_id,
                status: TaskStatus::Backlog,
            },
        )
        .await?;
        Ok(Self::from_model(db, model).await?)
    }

    /// Writes the mutable status/auction fields of `next` with a compare-and-swap on
    /// `next.version`. Returns the stored task with the bumped version.
    pub async fn save_state<C: ConnectionTrait>(db: &C, next: &Task) -> Result<Self, TaskError> {
        let assignee_id = Self::user_row_id(db, next.assignee_id).await?;
        let leader_id = Self::user_row_id(db, next.auction_leader_id).await?;
        let winner_id = Self::user_row_id(db, next.auction_winner_id).await?;

        let active = task::ActiveModel {
            status: Set(next.status),
            assignee_id: Set(assignee_id),
            current_price: Set(next.current_price.map(Money::minor)),
            current_time_minutes: Set(next.current_time_minutes),
            auction_start_at: Set(next.auction_start_at),
            auction_planned_end_at: Set(next.auction_planned_end_at),
            auction_end_at: Set(next.auction_end_at),
            auction_extended_at: Set(next.auction_extended_at),
            auction_extension_count: Set(i32::try_from(next.auction_extension_count)
                .unwrap_or(i32::MAX)),
            auction_has_bids: Set(next.auction_has_bids),
            auction_leader_id: Set(leader_id),
            auction_leader_name: Set(next.auction_leader_name.clone()),
            auction_winner_id: Set(winner_id),
            auction_winner_name: Set(next.auction_winner_name.clone()),
            version: Set(next.version + 1),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let result = task::Entity::update_many()
            .set(active)
            .filter(task::Column::Uuid.eq(next.id))
            .filter(task::Column::Version.eq(next.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return match ids::task_id_by_uuid(db, next.id).await? {
                Some(_) => Err(TaskError::StaleVersion),
                None => Err(TaskError::NotFound),
            };
        }

        Self::find_by_id(db, next.id)
            .await?
            .ok_or(TaskError::NotFound)
    }

    async fn user_row_id<C: ConnectionTrait>(
        db: &C,
        user_id: Option<Uuid>,
    ) -> Result<Option<i64>, TaskError> {
        match user_id {
            Some(id) => Ok(Some(
                ids::user_id_by_uuid(db, id)
                    .await?
                    .ok_or(TaskError::UnknownReference("user"))?,
            )),
            None => Ok(None),
        }
    }
}
