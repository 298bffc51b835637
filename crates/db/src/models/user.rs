use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::user,
    models::{ids, point_transaction::PointTransaction},
    types::{Grade, UserRole},
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unknown organizational unit: {0}")]
    UnknownUnit(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    pub management_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    /// Explicitly recorded grade; `None` means "derive it".
    pub grade: Option<Grade>,
    pub rating: f64,
    pub points: i64,
    /// Number of ledger entries behind `points`.
    pub point_entries: u64,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateUser {
    pub name: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    pub management_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub grade: Option<Grade>,
    pub rating: Option<f64>,
}

impl CreateUser {
    pub fn new(name: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            role,
            department_id: None,
            management_id: None,
            division_id: None,
            grade: None,
            rating: None,
        }
    }
}

impl User {
    async fn from_model<C: ConnectionTrait>(db: &C, model: user::Model) -> Result<Self, DbErr> {
        let department_id = match model.department_id {
            Some(id) => ids::department_uuid_by_id(db, id).await?,
            None => None,
        };
        let management_id = match model.management_id {
            Some(id) => ids::management_uuid_by_id(db, id).await?,
            None => None,
        };
        let division_id = match model.division_id {
            Some(id) => ids::division_uuid_by_id(db, id).await?,
            None => None,
        };
        let balance = PointTransaction::balance_by_user_row_id(db, model.id).await?;

        Ok(Self {
            id: model.uuid,
            name: model.name,
            role: model.role,
            department_id,
            management_id,
            division_id,
            grade: model.grade,
            rating: model.rating,
            points: balance.total,
            point_entries: balance.entries,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        id: Uuid,
    ) -> Result<Self, UserError> {
        let department_id = match data.department_id {
            Some(uuid) => Some(
                ids::department_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(UserError::UnknownUnit("department"))?,
            ),
            None => None,
        };
        let management_id = match data.management_id {
            Some(uuid) => Some(
                ids::management_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(UserError::UnknownUnit("management"))?,
            ),
            None => None,
        };
        let division_id = match data.division_id {
            Some(uuid) => Some(
                ids::division_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(UserError::UnknownUnit("division"))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(id),
            name: Set(data.name.clone()),
            role: Set(data.role),
            department_id: Set(department_id),
            management_id: Set(management_id),
            division_id: Set(division_id),
            grade: Set(data.grade),
            rating: Set(data.rating.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{organization::Department, point_transaction::CreatePointTransaction};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn user_points_are_the_ledger_sum() {
        let db = setup_db().await;
        let department = Department::create(&db, Uuid::new_v4(), "Ops").await.unwrap();
        let mut data = CreateUser::new("Dilnoza", UserRole::Employee);
        data.department_id = Some(department.id);
        let user = User::create(&db, &data, Uuid::new_v4()).await.unwrap();
        assert_eq!(user.points, 0);
        assert_eq!(user.point_entries, 0);

        for amount in [40, 30, -5] {
            PointTransaction::create(
                &db,
                &CreatePointTransaction {
                    user_id: user.id,
                    amount,
                    transaction_type: "task_completed".to_string(),
                    task_title: Some("Quarterly report".to_string()),
                    comment: None,
                },
            )
            .await
            .unwrap();
        }

        let loaded = User::find_by_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(loaded.points, 65);
        assert_eq!(loaded.point_entries, 3);
        assert_eq!(loaded.department_id, Some(department.id));
        assert_eq!(
            PointTransaction::find_by_user_id(&db, user.id).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn unknown_department_is_rejected() {
        let db = setup_db().await;
        let mut data = CreateUser::new("Ghost", UserRole::Senior);
        data.department_id = Some(Uuid::new_v4());
        let err = User::create(&db, &data, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, UserError::UnknownUnit("department")));
    }
}
