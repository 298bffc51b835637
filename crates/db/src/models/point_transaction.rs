use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::point_transaction, models::ids};

/// Append-only ledger entry; the running sum is the user's point balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub task_title: Option<String>,
    pub comment: Option<String>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreatePointTransaction {
    pub user_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub task_title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointBalance {
    pub total: i64,
    pub entries: u64,
}

impl PointTransaction {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreatePointTransaction,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, data.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let active = point_transaction::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_row_id),
            amount: Set(data.amount),
            transaction_type: Set(data.transaction_type.clone()),
            task_title: Set(data.task_title.clone()),
            comment: Set(data.comment.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self {
            id: model.uuid,
            user_id: data.user_id,
            amount: model.amount,
            transaction_type: model.transaction_type,
            task_title: model.task_title,
            comment: model.comment,
            created_at: model.created_at,
        })
    }

    pub async fn find_by_user_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(user_row_id) = ids::user_id_by_uuid(db, user_id).await? else {
            return Ok(Vec::new());
        };
        let models = point_transaction::Entity::find()
            .filter(point_transaction::Column::UserId.eq(user_row_id))
            .order_by_asc(point_transaction::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| Self {
                id: model.uuid,
                user_id,
                amount: model.amount,
                transaction_type: model.transaction_type,
                task_title: model.task_title,
                comment: model.comment,
                created_at: model.created_at,
            })
            .collect())
    }

    /// Sums in Rust so the result type does not depend on the backend's SUM() width.
    pub async fn balance_by_user_row_id<C: ConnectionTrait>(
        db: &C,
        user_row_id: i64,
    ) -> Result<PointBalance, DbErr> {
        let amounts: Vec<i64> = point_transaction::Entity::find()
            .select_only()
            .column(point_transaction::Column::Amount)
            .filter(point_transaction::Column::UserId.eq(user_row_id))
            .into_tuple()
            .all(db)
            .await?;
        Ok(PointBalance {
            total: amounts.iter().fold(0i64, |acc, amount| acc.saturating_add(*amount)),
            entries: amounts.len() as u64,
        })
    }
}
