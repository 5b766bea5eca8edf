use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::gitspace_event;
use crate::error::StoreError;
use crate::types::GitspaceEntityType;

/// Append-only lifecycle journal entry for a gitspace config or
/// instance. Event names are an open set ("gitspace_action_start",
/// agent-reported steps and so on), so they stay plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitspaceEvent {
    pub id: i64,
    pub event: String,
    pub created: i64,
    pub entity_type: GitspaceEntityType,
    pub query_key: Option<String>,
    pub entity_id: i64,
    pub timestamp: i64,
}

/// Options for [`GitspaceEvent::list`].
#[derive(Debug, Clone, Default)]
pub struct GitspaceEventFilter {
    pub query_key: Option<String>,
    pub entity_type: Option<GitspaceEntityType>,
    pub entity_id: Option<i64>,
    pub page: i64,
    pub size: i64,
}

const RESOURCE: &str = "gitspace event";

impl GitspaceEvent {
    fn from_model(model: gitspace_event::Model) -> Self {
        GitspaceEvent {
            id: model.id,
            event: model.event,
            created: model.created,
            entity_type: model.entity_type,
            query_key: model.query_key,
            entity_id: model.entity_id,
            timestamp: model.timestamp,
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        event: &mut GitspaceEvent,
    ) -> Result<(), StoreError> {
        let model = gitspace_event::ActiveModel {
            event: Set(event.event.clone()),
            created: Set(event.created),
            entity_type: Set(event.entity_type),
            query_key: Set(event.query_key.clone()),
            entity_id: Set(event.entity_id),
            timestamp: Set(event.timestamp),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        event.id = model.id;
        Ok(())
    }

    /// Most recent occurrence of one event for a gitspace config,
    /// by event timestamp.
    pub async fn find_latest_by_type_and_config<C: ConnectionTrait>(
        db: &C,
        event: &str,
        gitspace_config_id: i64,
    ) -> Result<GitspaceEvent, StoreError> {
        let model = gitspace_event::Entity::find()
            .filter(gitspace_event::Column::Event.eq(event))
            .filter(gitspace_event::Column::EntityId.eq(gitspace_config_id))
            .order_by_desc(gitspace_event::Column::Timestamp)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    /// Filtered page plus the total count under the same filter.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        filter: &GitspaceEventFilter,
    ) -> Result<(Vec<GitspaceEvent>, i64), StoreError> {
        let mut stmt = gitspace_event::Entity::find();
        if let Some(query_key) = &filter.query_key {
            stmt = stmt.filter(gitspace_event::Column::QueryKey.eq(query_key.as_str()));
        }
        if let Some(entity_type) = filter.entity_type {
            stmt = stmt.filter(gitspace_event::Column::EntityType.eq(entity_type));
        }
        if let Some(entity_id) = filter.entity_id {
            stmt = stmt.filter(gitspace_event::Column::EntityId.eq(entity_id));
        }

        let total = stmt.clone().count(db).await? as i64;

        let size = if filter.size > 0 { filter.size } else { 100 };
        let page = filter.page.max(1);
        let models = stmt
            .order_by_desc(gitspace_event::Column::Timestamp)
            .limit(size as u64)
            .offset(((page - 1) * size) as u64)
            .all(db)
            .await?;

        Ok((models.into_iter().map(Self::from_model).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_millis;
    use crate::models::pull_request::tests::setup_db;

    fn make_event(event: &str, entity_id: i64, timestamp: i64) -> GitspaceEvent {
        GitspaceEvent {
            id: 0,
            event: event.to_string(),
            created: timestamp,
            entity_type: GitspaceEntityType::GitspaceConfig,
            query_key: Some(format!("config-{entity_id}")),
            entity_id,
            timestamp,
        }
    }

    #[tokio::test]
    async fn find_latest_by_type_and_config_uses_timestamp() {
        let db = setup_db().await;

        let base = now_millis();
        for (event, entity_id, offset) in [
            ("gitspace_action_start", 1, 0),
            ("gitspace_action_start", 1, 20),
            ("gitspace_action_start", 1, 10),
            ("gitspace_action_stop", 1, 30),
            ("gitspace_action_start", 2, 40),
        ] {
            let mut ev = make_event(event, entity_id, base + offset);
            GitspaceEvent::create(&db, &mut ev).await.unwrap();
        }

        let latest =
            GitspaceEvent::find_latest_by_type_and_config(&db, "gitspace_action_start", 1)
                .await
                .unwrap();
        assert_eq!(latest.timestamp, base + 20);

        let err = GitspaceEvent::find_latest_by_type_and_config(&db, "gitspace_action_start", 3)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_filters_and_counts_consistently() {
        let db = setup_db().await;

        let base = now_millis();
        for i in 0..5 {
            let entity_id = if i < 3 { 1 } else { 2 };
            let mut ev = make_event("gitspace_action_start", entity_id, base + i);
            GitspaceEvent::create(&db, &mut ev).await.unwrap();
        }

        let filter = GitspaceEventFilter {
            entity_id: Some(1),
            size: 2,
            page: 1,
            ..Default::default()
        };
        let (events, total) = GitspaceEvent::list(&db, &filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(events.len(), 2);
        assert!(events[0].timestamp >= events[1].timestamp);

        let by_key = GitspaceEventFilter {
            query_key: Some("config-2".to_string()),
            ..Default::default()
        };
        let (events, total) = GitspaceEvent::list(&db, &by_key).await.unwrap();
        assert_eq!(total, 2);
        assert!(events.iter().all(|ev| ev.entity_id == 2));
    }
}
