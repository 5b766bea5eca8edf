use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::infra_provider_template;
use crate::error::StoreError;
use crate::models::now_millis;

/// Provisioning script attached to an infra provider config. The data
/// blob is opaque here (terraform/opentofu source text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfraProviderTemplate {
    pub id: i64,
    pub identifier: String,
    pub infra_provider_config_id: i64,
    pub description: String,
    pub space_id: i64,
    pub data: String,
    pub version: i64,
    pub created: i64,
    pub updated: i64,
}

const RESOURCE: &str = "infra provider template";

impl InfraProviderTemplate {
    fn from_model(model: infra_provider_template::Model) -> Self {
        InfraProviderTemplate {
            id: model.id,
            identifier: model.uid,
            infra_provider_config_id: model.infra_provider_config_id,
            description: model.description,
            space_id: model.space_id,
            data: model.data,
            version: model.version,
            created: model.created,
            updated: model.updated,
        }
    }

    /// Templates are optional on a resource, so a miss is an ordinary
    /// outcome rather than an error.
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<InfraProviderTemplate>, StoreError> {
        let model = infra_provider_template::Entity::find_by_id(id).one(db).await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        space_id: i64,
        identifier: &str,
    ) -> Result<Option<InfraProviderTemplate>, StoreError> {
        let model = infra_provider_template::Entity::find()
            .filter(infra_provider_template::Column::Uid.eq(identifier))
            .filter(infra_provider_template::Column::SpaceId.eq(space_id))
            .one(db)
            .await?;
        Ok(model.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        template: &mut InfraProviderTemplate,
    ) -> Result<(), StoreError> {
        let model = infra_provider_template::ActiveModel {
            uid: Set(template.identifier.clone()),
            infra_provider_config_id: Set(template.infra_provider_config_id),
            description: Set(template.description.clone()),
            space_id: Set(template.space_id),
            data: Set(template.data.clone()),
            version: Set(template.version),
            created: Set(template.created),
            updated: Set(template.updated),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        template.id = model.id;
        Ok(())
    }

    /// Rewrites the script body and bumps the version counter.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        template: &mut InfraProviderTemplate,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        infra_provider_template::Entity::update_many()
            .col_expr(
                infra_provider_template::Column::Description,
                Expr::value(template.description.clone()),
            )
            .col_expr(
                infra_provider_template::Column::Data,
                Expr::value(template.data.clone()),
            )
            .col_expr(
                infra_provider_template::Column::Version,
                Expr::col(infra_provider_template::Column::Version).add(1),
            )
            .col_expr(
                infra_provider_template::Column::Updated,
                Expr::value(updated_at),
            )
            .filter(infra_provider_template::Column::Id.eq(template.id))
            .exec(db)
            .await?;

        template.version += 1;
        template.updated = updated_at;
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), StoreError> {
        infra_provider_template::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pull_request::tests::setup_db;

    fn make_template(identifier: &str, space_id: i64) -> InfraProviderTemplate {
        let now = now_millis();
        InfraProviderTemplate {
            id: 0,
            identifier: identifier.to_string(),
            infra_provider_config_id: 1,
            description: "base image".to_string(),
            space_id,
            data: "resource \"docker_image\" \"base\" {}".to_string(),
            version: 0,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn misses_return_none() {
        let db = setup_db().await;

        assert!(InfraProviderTemplate::find(&db, 7).await.unwrap().is_none());
        assert!(
            InfraProviderTemplate::find_by_identifier(&db, 1, "missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_bumps_version_each_time() {
        let db = setup_db().await;

        let mut template = make_template("base", 1);
        InfraProviderTemplate::create(&db, &mut template).await.unwrap();
        assert!(template.id > 0);

        template.data = "resource \"docker_image\" \"base\" { keep_locally = true }".to_string();
        InfraProviderTemplate::update(&db, &mut template).await.unwrap();
        template.description = "pinned base image".to_string();
        InfraProviderTemplate::update(&db, &mut template).await.unwrap();

        let found = InfraProviderTemplate::find(&db, template.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.version, 2);
        assert_eq!(found.description, "pinned base image");
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let db = setup_db().await;

        let mut template = make_template("base", 1);
        InfraProviderTemplate::create(&db, &mut template).await.unwrap();

        InfraProviderTemplate::delete(&db, template.id).await.unwrap();
        assert!(
            InfraProviderTemplate::find(&db, template.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
