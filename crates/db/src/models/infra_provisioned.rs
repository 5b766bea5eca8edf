use sea_orm::sea_query::{Alias, Expr, ExprTrait, JoinType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{gitspace_instance, infra_provisioned};
use crate::error::StoreError;
use crate::models::now_millis;
use crate::types::{InfraProviderType, InfraStatus};

/// Record of infrastructure actually provisioned for a gitspace
/// instance. Input params and response metadata are opaque blobs
/// owned by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraProvisioned {
    pub id: i64,
    pub gitspace_instance_id: i64,
    pub infra_provider_type: InfraProviderType,
    pub infra_provider_resource_id: i64,
    pub space_id: i64,
    pub response_metadata: Option<String>,
    pub input_params: String,
    pub infra_status: InfraStatus,
    pub server_host_ip: String,
    pub server_host_port: String,
    pub proxy_host: String,
    pub proxy_port: i32,
    pub created: i64,
    pub updated: i64,
}

/// Routing projection consumed by the gateway: one row per provisioned
/// record behind a proxy host.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct InfraProvisionedGatewayView {
    pub gitspace_instance_identifier: String,
    pub space_id: i64,
    pub server_host_ip: String,
    pub server_host_port: String,
    pub infrastructure: Option<String>,
}

const RESOURCE: &str = "infra provisioned";

impl InfraProvisioned {
    fn from_model(model: infra_provisioned::Model) -> Self {
        InfraProvisioned {
            id: model.id,
            gitspace_instance_id: model.gitspace_instance_id,
            infra_provider_type: model.r#type,
            infra_provider_resource_id: model.infra_provider_resource_id,
            space_id: model.space_id,
            response_metadata: model.response_metadata,
            input_params: model.input_params,
            infra_status: model.infra_status,
            server_host_ip: model.server_host_ip,
            server_host_port: model.server_host_port,
            proxy_host: model.proxy_host,
            proxy_port: model.proxy_port,
            created: model.created,
            updated: model.updated,
        }
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<InfraProvisioned, StoreError> {
        let model = infra_provisioned::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    pub async fn find_latest_by_instance<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        gitspace_instance_id: i64,
    ) -> Result<InfraProvisioned, StoreError> {
        let model = infra_provisioned::Entity::find()
            .filter(infra_provisioned::Column::GitspaceInstanceId.eq(gitspace_instance_id))
            .filter(infra_provisioned::Column::SpaceId.eq(space_id))
            .order_by_desc(infra_provisioned::Column::Created)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    pub async fn find_latest_by_instance_identifier<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        gitspace_instance_identifier: &str,
    ) -> Result<InfraProvisioned, StoreError> {
        let model = infra_provisioned::Entity::find()
            .join(
                JoinType::InnerJoin,
                infra_provisioned::Relation::GitspaceInstance.def(),
            )
            .filter(gitspace_instance::Column::Uid.eq(gitspace_instance_identifier))
            .filter(infra_provisioned::Column::SpaceId.eq(space_id))
            .order_by_desc(infra_provisioned::Column::Created)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    /// Every provisioned record routed through one gateway host,
    /// newest first.
    pub async fn find_all_latest_by_gateway<C: ConnectionTrait>(
        db: &C,
        gateway_host: &str,
    ) -> Result<Vec<InfraProvisionedGatewayView>, StoreError> {
        let query = Query::select()
            .expr_as(
                Expr::col((gitspace_instance::Entity, gitspace_instance::Column::Uid)),
                Alias::new("gitspace_instance_identifier"),
            )
            .expr_as(
                Expr::col((infra_provisioned::Entity, infra_provisioned::Column::SpaceId)),
                Alias::new("space_id"),
            )
            .expr_as(
                Expr::col((
                    infra_provisioned::Entity,
                    infra_provisioned::Column::ServerHostIp,
                )),
                Alias::new("server_host_ip"),
            )
            .expr_as(
                Expr::col((
                    infra_provisioned::Entity,
                    infra_provisioned::Column::ServerHostPort,
                )),
                Alias::new("server_host_port"),
            )
            .expr_as(
                Expr::col((
                    infra_provisioned::Entity,
                    infra_provisioned::Column::ResponseMetadata,
                )),
                Alias::new("infrastructure"),
            )
            .from(infra_provisioned::Entity)
            .join(
                JoinType::InnerJoin,
                gitspace_instance::Entity,
                Expr::col((
                    infra_provisioned::Entity,
                    infra_provisioned::Column::GitspaceInstanceId,
                ))
                .equals((gitspace_instance::Entity, gitspace_instance::Column::Id)),
            )
            .and_where(
                Expr::col((infra_provisioned::Entity, infra_provisioned::Column::ProxyHost))
                    .eq(gateway_host),
            )
            .and_where(
                Expr::col((
                    infra_provisioned::Entity,
                    infra_provisioned::Column::InfraStatus,
                ))
                .eq(InfraStatus::Provisioned),
            )
            .order_by(
                (infra_provisioned::Entity, infra_provisioned::Column::Created),
                sea_orm::sea_query::Order::Desc,
            )
            .to_owned();

        let rows = db.query_all(&query).await?;
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(InfraProvisionedGatewayView::from_query_result(&row, "")?);
        }
        Ok(views)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        provisioned: &mut InfraProvisioned,
    ) -> Result<(), StoreError> {
        let model = infra_provisioned::ActiveModel {
            gitspace_instance_id: Set(provisioned.gitspace_instance_id),
            r#type: Set(provisioned.infra_provider_type),
            infra_provider_resource_id: Set(provisioned.infra_provider_resource_id),
            space_id: Set(provisioned.space_id),
            created: Set(provisioned.created),
            updated: Set(provisioned.updated),
            response_metadata: Set(provisioned.response_metadata.clone()),
            input_params: Set(provisioned.input_params.clone()),
            infra_status: Set(provisioned.infra_status),
            server_host_ip: Set(provisioned.server_host_ip.clone()),
            server_host_port: Set(provisioned.server_host_port.clone()),
            proxy_host: Set(provisioned.proxy_host.clone()),
            proxy_port: Set(provisioned.proxy_port),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        provisioned.id = model.id;
        Ok(())
    }

    /// Moves the record through its provisioning lifecycle. Identity
    /// fields (instance, resource, space) never change.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        provisioned: &mut InfraProvisioned,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        infra_provisioned::Entity::update_many()
            .col_expr(
                infra_provisioned::Column::ResponseMetadata,
                Expr::value(provisioned.response_metadata.clone()),
            )
            .col_expr(
                infra_provisioned::Column::InfraStatus,
                Expr::value(provisioned.infra_status),
            )
            .col_expr(
                infra_provisioned::Column::ServerHostIp,
                Expr::value(provisioned.server_host_ip.clone()),
            )
            .col_expr(
                infra_provisioned::Column::ServerHostPort,
                Expr::value(provisioned.server_host_port.clone()),
            )
            .col_expr(
                infra_provisioned::Column::InputParams,
                Expr::value(provisioned.input_params.clone()),
            )
            .col_expr(
                infra_provisioned::Column::ProxyHost,
                Expr::value(provisioned.proxy_host.clone()),
            )
            .col_expr(
                infra_provisioned::Column::ProxyPort,
                Expr::value(provisioned.proxy_port),
            )
            .col_expr(infra_provisioned::Column::Updated, Expr::value(updated_at))
            .filter(infra_provisioned::Column::Id.eq(provisioned.id))
            .exec(db)
            .await?;

        provisioned.updated = updated_at;
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), StoreError> {
        infra_provisioned::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gitspace_instance::tests::make_instance;
    use crate::models::pull_request::tests::setup_db;
    use crate::models::GitspaceInstance;

    fn make_provisioned(gitspace_instance_id: i64, created: i64) -> InfraProvisioned {
        InfraProvisioned {
            id: 0,
            gitspace_instance_id,
            infra_provider_type: InfraProviderType::Docker,
            infra_provider_resource_id: 1,
            space_id: 1,
            response_metadata: None,
            input_params: "{}".to_string(),
            infra_status: InfraStatus::Pending,
            server_host_ip: "10.0.0.5".to_string(),
            server_host_port: "8080".to_string(),
            proxy_host: "gw.example.com".to_string(),
            proxy_port: 443,
            created,
            updated: created,
        }
    }

    #[tokio::test]
    async fn find_latest_prefers_newest_record() {
        let db = setup_db().await;

        let base = now_millis();
        let mut instance = make_instance("gs-1", 1, base);
        GitspaceInstance::create(&db, &mut instance).await.unwrap();

        let mut first = make_provisioned(instance.id, base);
        InfraProvisioned::create(&db, &mut first).await.unwrap();
        let mut second = make_provisioned(instance.id, base + 10);
        second.server_host_ip = "10.0.0.6".to_string();
        InfraProvisioned::create(&db, &mut second).await.unwrap();

        let latest = InfraProvisioned::find_latest_by_instance(&db, 1, instance.id)
            .await
            .unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.server_host_ip, "10.0.0.6");

        let by_identifier =
            InfraProvisioned::find_latest_by_instance_identifier(&db, 1, "gs-1")
                .await
                .unwrap();
        assert_eq!(by_identifier.id, second.id);

        let err = InfraProvisioned::find_latest_by_instance(&db, 2, instance.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn gateway_view_lists_only_provisioned_rows_for_host() {
        let db = setup_db().await;

        let base = now_millis();
        let mut instance_a = make_instance("gs-a", 1, base);
        GitspaceInstance::create(&db, &mut instance_a).await.unwrap();
        let mut instance_b = make_instance("gs-b", 2, base);
        GitspaceInstance::create(&db, &mut instance_b).await.unwrap();

        let mut ready = make_provisioned(instance_a.id, base);
        ready.infra_status = InfraStatus::Provisioned;
        ready.response_metadata = Some("{\"vm\":\"a\"}".to_string());
        InfraProvisioned::create(&db, &mut ready).await.unwrap();

        let mut pending = make_provisioned(instance_b.id, base + 1);
        InfraProvisioned::create(&db, &mut pending).await.unwrap();

        let mut other_gateway = make_provisioned(instance_b.id, base + 2);
        other_gateway.infra_status = InfraStatus::Provisioned;
        other_gateway.proxy_host = "gw2.example.com".to_string();
        InfraProvisioned::create(&db, &mut other_gateway).await.unwrap();

        let views = InfraProvisioned::find_all_latest_by_gateway(&db, "gw.example.com")
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].gitspace_instance_identifier, "gs-a");
        assert_eq!(views[0].server_host_ip, "10.0.0.5");
        assert_eq!(views[0].infrastructure.as_deref(), Some("{\"vm\":\"a\"}"));
    }

    #[tokio::test]
    async fn update_moves_lifecycle_and_delete_removes() {
        let db = setup_db().await;

        let base = now_millis();
        let mut instance = make_instance("gs-1", 1, base);
        GitspaceInstance::create(&db, &mut instance).await.unwrap();

        let mut provisioned = make_provisioned(instance.id, base);
        InfraProvisioned::create(&db, &mut provisioned).await.unwrap();

        provisioned.infra_status = InfraStatus::Provisioned;
        provisioned.response_metadata = Some("{\"vm\":\"a\"}".to_string());
        InfraProvisioned::update(&db, &mut provisioned).await.unwrap();

        let found = InfraProvisioned::find(&db, provisioned.id).await.unwrap();
        assert_eq!(found.infra_status, InfraStatus::Provisioned);
        assert_eq!(found.response_metadata.as_deref(), Some("{\"vm\":\"a\"}"));

        InfraProvisioned::delete(&db, provisioned.id).await.unwrap();
        let err = InfraProvisioned::find(&db, provisioned.id).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
