use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{department, division, management, task, user};

pub async fn department_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    department::Entity::find()
        .select_only()
        .column(department::Column::Id)
        .filter(department::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn department_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    department::Entity::find()
        .select_only()
        .column(department::Column::Uuid)
        .filter(department::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn management_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    management::Entity::find()
        .select_only()
        .column(management::Column::Id)
        .filter(management::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn management_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    management::Entity::find()
        .select_only()
        .column(management::Column::Uuid)
        .filter(management::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn division_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    division::Entity::find()
        .select_only()
        .column(division::Column::Id)
        .filter(division::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn division_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    division::Entity::find()
        .select_only()
        .column(division::Column::Uuid)
        .filter(division::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn user_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

/// Resolves several user row ids at once; ids without a row are absent from the map.
pub async fn user_uuids_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i64],
) -> Result<HashMap<i64, Uuid>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, Uuid)> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Uuid)
        .filter(user::Column::Id.is_in(ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn task_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task::Entity::find()
        .select_only()
        .column(task::Column::Id)
        .filter(task::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}
