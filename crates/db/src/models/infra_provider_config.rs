use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::infra_provider_config;
use crate::error::StoreError;
use crate::models::now_millis;
use crate::types::InfraProviderType;

/// An infrastructure provider registered in a space, parent of its
/// resources and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraProviderConfig {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub r#type: InfraProviderType,
    pub space_id: i64,
    pub created: i64,
    pub updated: i64,
}

const RESOURCE: &str = "infra provider config";

impl InfraProviderConfig {
    fn from_model(model: infra_provider_config::Model) -> Self {
        InfraProviderConfig {
            id: model.id,
            uid: model.uid,
            name: model.display_name,
            r#type: model.r#type,
            space_id: model.space_id,
            created: model.created,
            updated: model.updated,
        }
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<InfraProviderConfig, StoreError> {
        let model = infra_provider_config::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        uid: &str,
    ) -> Result<InfraProviderConfig, StoreError> {
        let model = infra_provider_config::Entity::find()
            .filter(infra_provider_config::Column::Uid.eq(uid))
            .filter(infra_provider_config::Column::SpaceId.eq(space_id))
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        config: &mut InfraProviderConfig,
    ) -> Result<(), StoreError> {
        let model = infra_provider_config::ActiveModel {
            uid: Set(config.uid.clone()),
            display_name: Set(config.name.clone()),
            r#type: Set(config.r#type),
            space_id: Set(config.space_id),
            created: Set(config.created),
            updated: Set(config.updated),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        config.id = model.id;
        Ok(())
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        config: &mut InfraProviderConfig,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        infra_provider_config::Entity::update_many()
            .col_expr(
                infra_provider_config::Column::DisplayName,
                Expr::value(config.name.clone()),
            )
            .col_expr(infra_provider_config::Column::Updated, Expr::value(updated_at))
            .filter(infra_provider_config::Column::Id.eq(config.id))
            .exec(db)
            .await?;

        config.updated = updated_at;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::pull_request::tests::setup_db;

    pub(crate) fn make_provider_config(uid: &str, space_id: i64) -> InfraProviderConfig {
        let now = now_millis();
        InfraProviderConfig {
            id: 0,
            uid: uid.to_string(),
            name: format!("provider {uid}"),
            r#type: InfraProviderType::Docker,
            space_id,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn create_enforces_unique_uid_per_space() {
        let db = setup_db().await;

        let mut config = make_provider_config("docker", 1);
        InfraProviderConfig::create(&db, &mut config).await.unwrap();

        let mut dup = make_provider_config("docker", 1);
        let err = InfraProviderConfig::create(&db, &mut dup).await.unwrap_err();
        assert!(err.is_duplicate());

        let mut other_space = make_provider_config("docker", 2);
        InfraProviderConfig::create(&db, &mut other_space).await.unwrap();
    }

    #[tokio::test]
    async fn find_and_update_round_trip() {
        let db = setup_db().await;

        let mut config = make_provider_config("docker", 1);
        InfraProviderConfig::create(&db, &mut config).await.unwrap();

        let found = InfraProviderConfig::find_by_identifier(&db, 1, "docker")
            .await
            .unwrap();
        assert_eq!(found, config);

        config.name = "renamed".to_string();
        InfraProviderConfig::update(&db, &mut config).await.unwrap();

        let found = InfraProviderConfig::find(&db, config.id).await.unwrap();
        assert_eq!(found.name, "renamed");
        assert_eq!(found.uid, "docker");
    }
}
