use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::event_outbox;

/// Transactional outbox: events are written alongside the state change they describe
/// and relayed by an external publisher.
pub struct EventOutbox;

impl EventOutbox {
    pub async fn enqueue<C, P>(
        db: &C,
        event_type: &str,
        entity_type: &str,
        entity_uuid: Uuid,
        payload: &P,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
        P: Serialize,
    {
        let payload =
            serde_json::to_value(payload).map_err(|err| DbErr::Custom(err.to_string()))?;
        let active = event_outbox::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            event_type: Set(event_type.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_uuid: Set(entity_uuid),
            payload: Set(payload),
            created_at: Set(Utc::now()),
            published_at: Set(None),
            ..Default::default()
        };

        active.insert(db).await?;
        Ok(())
    }

    pub async fn fetch_unpublished<C: ConnectionTrait>(
        db: &C,
        limit: u64,
    ) -> Result<Vec<event_outbox::Model>, DbErr> {
        event_outbox::Entity::find()
            .filter(event_outbox::Column::PublishedAt.is_null())
            .order_by_asc(event_outbox::Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn fetch_for_entity<C: ConnectionTrait>(
        db: &C,
        entity_uuid: Uuid,
    ) -> Result<Vec<event_outbox::Model>, DbErr> {
        event_outbox::Entity::find()
            .filter(event_outbox::Column::EntityUuid.eq(entity_uuid))
            .order_by_asc(event_outbox::Column::Id)
            .all(db)
            .await
    }

    pub async fn mark_published<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = event_outbox::Entity::update_many()
            .col_expr(event_outbox::Column::PublishedAt, Expr::value(Utc::now()))
            .filter(event_outbox::Column::Id.is_in(ids.to_vec()))
            .filter(event_outbox::Column::PublishedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
