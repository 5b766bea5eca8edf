use sea_orm::sea_query::{
    Alias, Asterisk, Expr, ExprTrait, JoinType, Order, OverStatement, Query, WindowStatement,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::gitspace_instance;
use crate::error::StoreError;
use crate::models::now_millis;
use crate::types::{GitspaceAccessType, GitspaceInstanceState};

/// One running (or historical) workspace spawned from a gitspace
/// config. Configs keep every instance ever started; the latest row
/// per config is the live one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitspaceInstance {
    pub id: i64,
    pub identifier: String,
    pub gitspace_config_id: i64,
    pub url: Option<String>,
    pub state: GitspaceInstanceState,
    pub user_identifier: String,
    pub resource_usage: Option<String>,
    pub space_id: i64,
    pub last_used: i64,
    pub total_time_used: i64,
    pub tracked_changes: Option<String>,
    pub access_type: GitspaceAccessType,
    pub access_key_ref: Option<String>,
    pub machine_user: Option<String>,
    pub created: i64,
    pub updated: i64,
}

/// Options for [`GitspaceInstance::list`].
#[derive(Debug, Clone, Default)]
pub struct GitspaceInstanceFilter {
    pub user_identifier: Option<String>,
    pub space_ids: Vec<i64>,
}

impl GitspaceInstance {
    fn from_model(model: gitspace_instance::Model) -> Self {
        GitspaceInstance {
            id: model.id,
            identifier: model.uid,
            gitspace_config_id: model.gitspace_config_id,
            url: model.url,
            state: model.state,
            user_identifier: model.user_uid,
            resource_usage: model.resource_usage,
            space_id: model.space_id,
            last_used: model.last_used,
            total_time_used: model.total_time_used,
            tracked_changes: model.tracked_changes,
            access_type: model.access_type,
            access_key_ref: model.access_key_ref,
            machine_user: model.machine_user,
            created: model.created,
            updated: model.updated,
        }
    }

    /// A miss is a normal outcome here: callers probe for instances
    /// that may never have been started.
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<GitspaceInstance>, StoreError> {
        let model = gitspace_instance::Entity::find_by_id(id).one(db).await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        identifier: &str,
    ) -> Result<Option<GitspaceInstance>, StoreError> {
        let model = gitspace_instance::Entity::find()
            .filter(gitspace_instance::Column::Uid.eq(identifier))
            .one(db)
            .await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        instance: &mut GitspaceInstance,
    ) -> Result<(), StoreError> {
        let model = gitspace_instance::ActiveModel {
            gitspace_config_id: Set(instance.gitspace_config_id),
            url: Set(instance.url.clone()),
            state: Set(instance.state),
            user_uid: Set(instance.user_identifier.clone()),
            resource_usage: Set(instance.resource_usage.clone()),
            space_id: Set(instance.space_id),
            last_used: Set(instance.last_used),
            total_time_used: Set(instance.total_time_used),
            tracked_changes: Set(instance.tracked_changes.clone()),
            access_type: Set(instance.access_type),
            access_key_ref: Set(instance.access_key_ref.clone()),
            machine_user: Set(instance.machine_user.clone()),
            uid: Set(instance.identifier.clone()),
            created: Set(instance.created),
            updated: Set(instance.updated),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, "gitspace instance"))?;

        instance.id = model.id;
        Ok(())
    }

    /// Lifecycle update: only state, url and usage timestamps move
    /// after creation.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        instance: &mut GitspaceInstance,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        gitspace_instance::Entity::update_many()
            .col_expr(gitspace_instance::Column::State, Expr::value(instance.state))
            .col_expr(
                gitspace_instance::Column::LastUsed,
                Expr::value(instance.last_used),
            )
            .col_expr(gitspace_instance::Column::Url, Expr::value(instance.url.clone()))
            .col_expr(gitspace_instance::Column::Updated, Expr::value(updated_at))
            .filter(gitspace_instance::Column::Id.eq(instance.id))
            .exec(db)
            .await?;

        instance.updated = updated_at;
        Ok(())
    }

    pub async fn find_latest_by_config<C: ConnectionTrait>(
        db: &C,
        gitspace_config_id: i64,
    ) -> Result<Option<GitspaceInstance>, StoreError> {
        let model = gitspace_instance::Entity::find()
            .filter(gitspace_instance::Column::GitspaceConfigId.eq(gitspace_config_id))
            .order_by_desc(gitspace_instance::Column::Created)
            .one(db)
            .await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn list<C: ConnectionTrait>(
        db: &C,
        filter: &GitspaceInstanceFilter,
    ) -> Result<Vec<GitspaceInstance>, StoreError> {
        let mut stmt = gitspace_instance::Entity::find();
        if !filter.space_ids.is_empty() {
            stmt = stmt.filter(gitspace_instance::Column::SpaceId.is_in(filter.space_ids.clone()));
        }
        if let Some(user) = &filter.user_identifier {
            stmt = stmt.filter(gitspace_instance::Column::UserUid.eq(user.as_str()));
        }
        let models = stmt
            .order_by_asc(gitspace_instance::Column::Created)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    /// Newest instance per config, for the given configs. A config
    /// without instances contributes no row.
    pub async fn find_all_latest_by_configs<C: ConnectionTrait>(
        db: &C,
        gitspace_config_ids: &[i64],
    ) -> Result<Vec<GitspaceInstance>, StoreError> {
        if gitspace_config_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = Alias::new("ranked");

        let mut inner = Query::select();
        inner
            .column(gitspace_instance::Column::Id)
            .expr_window_as(
                Expr::cust("ROW_NUMBER()"),
                WindowStatement::new()
                    .partition_by(gitspace_instance::Column::GitspaceConfigId)
                    .order_by(gitspace_instance::Column::Created, Order::Desc)
                    .to_owned(),
                Alias::new("rn"),
            )
            .from(gitspace_instance::Entity)
            .and_where(
                Expr::col(gitspace_instance::Column::GitspaceConfigId)
                    .is_in(gitspace_config_ids.iter().copied()),
            );

        let query = Query::select()
            .column((gitspace_instance::Entity, Asterisk))
            .from(gitspace_instance::Entity)
            .join_subquery(
                JoinType::InnerJoin,
                inner,
                ranked.clone(),
                Expr::col((gitspace_instance::Entity, gitspace_instance::Column::Id))
                    .equals((ranked.clone(), gitspace_instance::Column::Id)),
            )
            .and_where(Expr::col((ranked, Alias::new("rn"))).eq(1))
            .to_owned();

        let rows = db.query_all(&query).await?;
        let mut instances = Vec::with_capacity(rows.len());
        for row in rows {
            let model = gitspace_instance::Model::from_query_result(&row, "")?;
            instances.push(Self::from_model(model));
        }
        Ok(instances)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::pull_request::tests::setup_db;

    pub(crate) fn make_instance(
        identifier: &str,
        gitspace_config_id: i64,
        created: i64,
    ) -> GitspaceInstance {
        GitspaceInstance {
            id: 0,
            identifier: identifier.to_string(),
            gitspace_config_id,
            url: None,
            state: GitspaceInstanceState::Starting,
            user_identifier: "user_1".to_string(),
            resource_usage: None,
            space_id: 1,
            last_used: created,
            total_time_used: 0,
            tracked_changes: None,
            access_type: GitspaceAccessType::JwtToken,
            access_key_ref: None,
            machine_user: None,
            created,
            updated: created,
        }
    }

    #[tokio::test]
    async fn find_misses_are_none_not_errors() {
        let db = setup_db().await;

        assert!(GitspaceInstance::find(&db, 42).await.unwrap().is_none());
        assert!(
            GitspaceInstance::find_by_identifier(&db, "nope")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            GitspaceInstance::find_latest_by_config(&db, 1)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn create_and_update_lifecycle_fields() {
        let db = setup_db().await;

        let mut instance = make_instance("gs-1", 1, now_millis());
        GitspaceInstance::create(&db, &mut instance).await.unwrap();
        assert!(instance.id > 0);

        instance.state = GitspaceInstanceState::Running;
        instance.url = Some("https://gs-1.example.com".to_string());
        instance.last_used = now_millis();
        GitspaceInstance::update(&db, &mut instance).await.unwrap();

        let found = GitspaceInstance::find(&db, instance.id).await.unwrap().unwrap();
        assert_eq!(found.state, GitspaceInstanceState::Running);
        assert_eq!(found.url.as_deref(), Some("https://gs-1.example.com"));
        assert_eq!(found.identifier, "gs-1");
    }

    #[tokio::test]
    async fn find_latest_by_config_picks_newest() {
        let db = setup_db().await;

        let base = now_millis();
        for (identifier, offset) in [("gs-1", 0), ("gs-2", 10), ("gs-3", 5)] {
            let mut instance = make_instance(identifier, 1, base + offset);
            GitspaceInstance::create(&db, &mut instance).await.unwrap();
        }

        let latest = GitspaceInstance::find_latest_by_config(&db, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.identifier, "gs-2");
    }

    #[tokio::test]
    async fn find_all_latest_by_configs_returns_one_row_per_config() {
        let db = setup_db().await;

        let base = now_millis();
        for (i, config_id) in [1, 1, 2, 3].into_iter().enumerate() {
            let mut instance =
                make_instance(&format!("gs-{i}"), config_id, base + i as i64);
            GitspaceInstance::create(&db, &mut instance).await.unwrap();
        }

        let mut latest = GitspaceInstance::find_all_latest_by_configs(&db, &[1, 2, 3, 4])
            .await
            .unwrap();
        latest.sort_by_key(|inst| inst.gitspace_config_id);

        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].gitspace_config_id, 1);
        assert_eq!(latest[0].identifier, "gs-1");
        assert_eq!(latest[1].identifier, "gs-2");
        assert_eq!(latest[2].identifier, "gs-3");

        let none = GitspaceInstance::find_all_latest_by_configs(&db, &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
