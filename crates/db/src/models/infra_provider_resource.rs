use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::infra_provider_resource;
use crate::error::StoreError;
use crate::models::now_millis;
use crate::types::InfraProviderType;

/// A machine shape offered by an infra provider config (cpu, memory,
/// disk, region plus free-form opentofu parameters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraProviderResource {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub infra_provider_config_id: i64,
    pub infra_provider_type: InfraProviderType,
    pub space_id: i64,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub disk: Option<String>,
    pub network: Option<String>,
    pub region: String,
    pub metadata: HashMap<String, String>,
    pub template_id: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

const RESOURCE: &str = "infra provider resource";

impl InfraProviderResource {
    pub(crate) fn from_model(
        model: infra_provider_resource::Model,
    ) -> Result<Self, StoreError> {
        let metadata = model
            .opentofu_params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| {
                StoreError::Validation(format!("malformed opentofu params: {err}"))
            })?
            .unwrap_or_default();

        Ok(InfraProviderResource {
            id: model.id,
            uid: model.uid,
            name: model.display_name,
            infra_provider_config_id: model.infra_provider_config_id,
            infra_provider_type: model.r#type,
            space_id: model.space_id,
            cpu: model.cpu,
            memory: model.memory,
            disk: model.disk,
            network: model.network,
            region: model.region,
            metadata,
            template_id: model.infra_provider_template_id,
            created: model.created,
            updated: model.updated,
        })
    }

    fn metadata_json(&self) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(&self.metadata).map_err(|err| {
            StoreError::Validation(format!("failed to serialize opentofu params: {err}"))
        })
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<InfraProviderResource, StoreError> {
        let model = infra_provider_resource::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Self::from_model(model)
    }

    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        uid: &str,
    ) -> Result<InfraProviderResource, StoreError> {
        let model = infra_provider_resource::Entity::find()
            .filter(infra_provider_resource::Column::Uid.eq(uid))
            .filter(infra_provider_resource::Column::SpaceId.eq(space_id))
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Self::from_model(model)
    }

    /// Batch lookup backing the resource cache.
    pub async fn find_many<C: ConnectionTrait>(
        db: &C,
        ids: &[i64],
    ) -> Result<Vec<InfraProviderResource>, StoreError> {
        let models = infra_provider_resource::Entity::find()
            .filter(infra_provider_resource::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?;
        models.into_iter().map(Self::from_model).collect()
    }

    pub async fn list<C: ConnectionTrait>(
        db: &C,
        infra_provider_config_id: i64,
    ) -> Result<Vec<InfraProviderResource>, StoreError> {
        let models = infra_provider_resource::Entity::find()
            .filter(
                infra_provider_resource::Column::InfraProviderConfigId
                    .eq(infra_provider_config_id),
            )
            .all(db)
            .await?;
        models.into_iter().map(Self::from_model).collect()
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        resource: &mut InfraProviderResource,
    ) -> Result<(), StoreError> {
        let model = infra_provider_resource::ActiveModel {
            uid: Set(resource.uid.clone()),
            display_name: Set(resource.name.clone()),
            infra_provider_config_id: Set(resource.infra_provider_config_id),
            r#type: Set(resource.infra_provider_type),
            space_id: Set(resource.space_id),
            cpu: Set(resource.cpu.clone()),
            memory: Set(resource.memory.clone()),
            disk: Set(resource.disk.clone()),
            network: Set(resource.network.clone()),
            region: Set(resource.region.clone()),
            opentofu_params: Set(Some(resource.metadata_json()?)),
            infra_provider_template_id: Set(resource.template_id),
            created: Set(resource.created),
            updated: Set(resource.updated),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        resource.id = model.id;
        Ok(())
    }

    /// Updates the mutable shape fields. Identity (uid, config, space,
    /// type) is fixed at creation.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        resource: &mut InfraProviderResource,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        infra_provider_resource::Entity::update_many()
            .col_expr(
                infra_provider_resource::Column::DisplayName,
                Expr::value(resource.name.clone()),
            )
            .col_expr(
                infra_provider_resource::Column::Updated,
                Expr::value(updated_at),
            )
            .col_expr(
                infra_provider_resource::Column::Memory,
                Expr::value(resource.memory.clone()),
            )
            .col_expr(
                infra_provider_resource::Column::Disk,
                Expr::value(resource.disk.clone()),
            )
            .col_expr(
                infra_provider_resource::Column::Network,
                Expr::value(resource.network.clone()),
            )
            .col_expr(
                infra_provider_resource::Column::Region,
                Expr::value(resource.region.clone()),
            )
            .col_expr(
                infra_provider_resource::Column::OpentofuParams,
                Expr::value(Some(resource.metadata_json()?)),
            )
            .filter(infra_provider_resource::Column::Id.eq(resource.id))
            .exec(db)
            .await?;

        resource.updated = updated_at;
        Ok(())
    }

    pub async fn delete_by_identifier<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        uid: &str,
    ) -> Result<(), StoreError> {
        infra_provider_resource::Entity::delete_many()
            .filter(infra_provider_resource::Column::Uid.eq(uid))
            .filter(infra_provider_resource::Column::SpaceId.eq(space_id))
            .exec(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::pull_request::tests::setup_db;

    pub(crate) fn make_resource(uid: &str, space_id: i64) -> InfraProviderResource {
        let now = now_millis();
        InfraProviderResource {
            id: 0,
            uid: uid.to_string(),
            name: format!("resource {uid}"),
            infra_provider_config_id: 1,
            infra_provider_type: InfraProviderType::Docker,
            space_id,
            cpu: Some("2".to_string()),
            memory: Some("4Gi".to_string()),
            disk: Some("50Gi".to_string()),
            network: None,
            region: "local".to_string(),
            metadata: HashMap::from([("image".to_string(), "ubuntu:24.04".to_string())]),
            template_id: None,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn create_find_round_trips_metadata() {
        let db = setup_db().await;

        let mut resource = make_resource("standard", 1);
        InfraProviderResource::create(&db, &mut resource).await.unwrap();
        assert!(resource.id > 0);

        let found = InfraProviderResource::find(&db, resource.id).await.unwrap();
        assert_eq!(found, resource);

        let by_uid = InfraProviderResource::find_by_identifier(&db, 1, "standard")
            .await
            .unwrap();
        assert_eq!(by_uid.id, resource.id);
        assert_eq!(by_uid.metadata["image"], "ubuntu:24.04");
    }

    #[tokio::test]
    async fn find_many_returns_only_requested_ids() {
        let db = setup_db().await;

        let mut ids = Vec::new();
        for uid in ["small", "medium", "large"] {
            let mut resource = make_resource(uid, 1);
            InfraProviderResource::create(&db, &mut resource).await.unwrap();
            ids.push(resource.id);
        }

        let found = InfraProviderResource::find_many(&db, &ids[..2]).await.unwrap();
        assert_eq!(found.len(), 2);

        let listed = InfraProviderResource::list(&db, 1).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn update_changes_shape_but_not_identity() {
        let db = setup_db().await;

        let mut resource = make_resource("standard", 1);
        InfraProviderResource::create(&db, &mut resource).await.unwrap();

        resource.memory = Some("8Gi".to_string());
        resource.region = "eu-1".to_string();
        resource.metadata.insert("image".to_string(), "debian:13".to_string());
        InfraProviderResource::update(&db, &mut resource).await.unwrap();

        let found = InfraProviderResource::find(&db, resource.id).await.unwrap();
        assert_eq!(found.memory.as_deref(), Some("8Gi"));
        assert_eq!(found.region, "eu-1");
        assert_eq!(found.metadata["image"], "debian:13");
        assert_eq!(found.uid, "standard");
    }

    #[tokio::test]
    async fn delete_by_identifier_is_scoped_to_space() {
        let db = setup_db().await;

        let mut a = make_resource("standard", 1);
        InfraProviderResource::create(&db, &mut a).await.unwrap();
        let mut b = make_resource("standard", 2);
        InfraProviderResource::create(&db, &mut b).await.unwrap();

        InfraProviderResource::delete_by_identifier(&db, 1, "standard")
            .await
            .unwrap();

        let err = InfraProviderResource::find(&db, a.id).await.unwrap_err();
        assert!(err.is_not_found());
        InfraProviderResource::find(&db, b.id).await.unwrap();
    }
}
