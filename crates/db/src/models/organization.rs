//! Read side of the organization chart. Departments, managements and divisions are
//! maintained elsewhere; the `create` helpers exist for seeding and tests.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{department, division, management},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Management {
    pub id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Division {
    pub id: Uuid,
    pub department_id: Uuid,
    pub management_id: Option<Uuid>,
    pub name: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

impl Department {
    fn from_model(model: department::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            created_at: model.created_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = department::Entity::find()
            .filter(department::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(db: &C, id: Uuid, name: &str) -> Result<Self, DbErr> {
        let active = department::ActiveModel {
            uuid: Set(id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(Self::from_model(active.insert(db).await?))
    }
}

impl Management {
    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let Some(model) = management::Entity::find()
            .filter(management::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let department_id = ids::department_uuid_by_id(db, model.department_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Department not found".to_string()))?;
        Ok(Some(Self {
            id: model.uuid,
            department_id,
            name: model.name,
            created_at: model.created_at,
        }))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        department_id: Uuid,
        name: &str,
    ) -> Result<Self, DbErr> {
        let department_row_id = ids::department_id_by_uuid(db, department_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Department not found".to_string()))?;
        let active = management::ActiveModel {
            uuid: Set(id),
            department_id: Set(department_row_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self {
            id: model.uuid,
            department_id,
            name: model.name,
            created_at: model.created_at,
        })
    }
}

impl Division {
    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let Some(model) = division::Entity::find()
            .filter(division::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let department_id = ids::department_uuid_by_id(db, model.department_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Department not found".to_string()))?;
        let management_id = match model.management_id {
            Some(row_id) => ids::management_uuid_by_id(db, row_id).await?,
            None => None,
        };
        Ok(Some(Self {
            id: model.uuid,
            department_id,
            management_id,
            name: model.name,
            created_at: model.created_at,
        }))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        department_id: Uuid,
        management_id: Option<Uuid>,
        name: &str,
    ) -> Result<Self, DbErr> {
        let department_row_id = ids::department_id_by_uuid(db, department_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Department not found".to_string()))?;
        let management_row_id = match management_id {
            Some(uuid) => Some(
                ids::management_id_by_uuid(db, uuid)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Management not found".to_string()))?,
            ),
            None => None,
        };
        let active = division::ActiveModel {
            uuid: Set(id),
            department_id: Set(department_row_id),
            management_id: Set(management_row_id),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self {
            id: model.uuid,
            department_id,
            management_id,
            name: model.name,
            created_at: model.created_at,
        })
    }
}
