use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::gitspace_config;
use crate::error::StoreError;
use crate::models::infra_provider_resource::InfraProviderResource;
use crate::models::now_millis;
use crate::principal::{self, PrincipalInfoCache};
use crate::types::{GitspaceCodeRepoType, IdeType};

/// Source repository a gitspace is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRepo {
    pub url: String,
    pub r#ref: Option<String>,
    pub r#type: GitspaceCodeRepoType,
    pub branch: String,
    pub devcontainer_path: Option<String>,
    pub is_private: bool,
    pub auth_type: String,
    pub auth_id: String,
}

/// Owner of a gitspace. The store keys on the string identifier; the
/// numeric id is optional legacy data enriched from the principal
/// cache when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitspaceUser {
    pub id: Option<i64>,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Declarative description of a gitspace: which repository, which IDE
/// and which infra resource to run it on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitspaceConfig {
    pub id: i64,
    pub identifier: String,
    pub name: String,
    pub ide: IdeType,
    pub space_id: i64,
    pub created: i64,
    pub updated: i64,
    pub is_deleted: bool,
    pub ssh_token_identifier: String,
    pub code_repo: CodeRepo,
    pub user: GitspaceUser,
    pub infra_provider_resource: InfraProviderResource,
}

/// Options for [`GitspaceConfig::count`] and [`GitspaceConfig::list`].
#[derive(Debug, Clone, Default)]
pub struct GitspaceFilter {
    pub user_identifier: Option<String>,
    pub space_ids: Vec<i64>,
    pub include_deleted: bool,
    pub page: i64,
    pub size: i64,
}

const RESOURCE: &str = "gitspace config";

impl GitspaceConfig {
    // The bound infra resource is part of the config contract; a
    // config pointing at a missing resource is corrupt data.
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        model: gitspace_config::Model,
    ) -> Result<Self, StoreError> {
        let resource = InfraProviderResource::find(db, model.infra_provider_resource_id).await?;

        let mut user = GitspaceUser {
            id: model.created_by,
            identifier: model.user_uid,
            display_name: None,
            email: None,
        };
        if let Some(id) = user.id {
            if let Some(info) = principal::lookup_info(cache, id).await {
                user.display_name = Some(info.display_name);
                user.email = Some(info.email);
            }
        }

        Ok(GitspaceConfig {
            id: model.id,
            identifier: model.uid,
            name: model.display_name,
            ide: model.ide,
            space_id: model.space_id,
            created: model.created,
            updated: model.updated,
            is_deleted: model.is_deleted,
            ssh_token_identifier: model.ssh_token_identifier,
            code_repo: CodeRepo {
                url: model.code_repo_url,
                r#ref: model.code_repo_ref,
                r#type: model.code_repo_type,
                branch: model.branch,
                devcontainer_path: model.devcontainer_path,
                is_private: model.code_repo_is_private,
                auth_type: model.code_auth_type,
                auth_id: model.code_auth_id,
            },
            user,
            infra_provider_resource: resource,
        })
    }

    async fn from_models<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        models: Vec<gitspace_config::Model>,
    ) -> Result<Vec<GitspaceConfig>, StoreError> {
        let mut configs = Vec::with_capacity(models.len());
        for model in models {
            configs.push(Self::from_model(db, cache, model).await?);
        }
        Ok(configs)
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        id: i64,
    ) -> Result<GitspaceConfig, StoreError> {
        let model = gitspace_config::Entity::find()
            .filter(gitspace_config::Column::Id.eq(id))
            .filter(gitspace_config::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Self::from_model(db, cache, model).await
    }

    /// Identifier lookup is case-insensitive; stored case is kept.
    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        space_id: i64,
        identifier: &str,
    ) -> Result<GitspaceConfig, StoreError> {
        let model = gitspace_config::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    gitspace_config::Entity,
                    gitspace_config::Column::Uid,
                ))))
                .eq(identifier.to_lowercase()),
            )
            .filter(gitspace_config::Column::SpaceId.eq(space_id))
            .filter(gitspace_config::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Self::from_model(db, cache, model).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        config: &mut GitspaceConfig,
    ) -> Result<(), StoreError> {
        let model = gitspace_config::ActiveModel {
            uid: Set(config.identifier.clone()),
            display_name: Set(config.name.clone()),
            ide: Set(config.ide),
            infra_provider_resource_id: Set(config.infra_provider_resource.id),
            code_auth_type: Set(config.code_repo.auth_type.clone()),
            code_auth_id: Set(config.code_repo.auth_id.clone()),
            code_repo_type: Set(config.code_repo.r#type),
            code_repo_is_private: Set(config.code_repo.is_private),
            code_repo_ref: Set(config.code_repo.r#ref.clone()),
            code_repo_url: Set(config.code_repo.url.clone()),
            devcontainer_path: Set(config.code_repo.devcontainer_path.clone()),
            branch: Set(config.code_repo.branch.clone()),
            user_uid: Set(config.user.identifier.clone()),
            space_id: Set(config.space_id),
            created: Set(config.created),
            updated: Set(config.updated),
            is_deleted: Set(config.is_deleted),
            ssh_token_identifier: Set(config.ssh_token_identifier.clone()),
            created_by: Set(config.user.id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        config.id = model.id;
        Ok(())
    }

    /// Full update by id; soft deletion goes through here by flipping
    /// `is_deleted`.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        config: &mut GitspaceConfig,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        gitspace_config::Entity::update_many()
            .col_expr(
                gitspace_config::Column::DisplayName,
                Expr::value(config.name.clone()),
            )
            .col_expr(gitspace_config::Column::Ide, Expr::value(config.ide))
            .col_expr(
                gitspace_config::Column::InfraProviderResourceId,
                Expr::value(config.infra_provider_resource.id),
            )
            .col_expr(
                gitspace_config::Column::DevcontainerPath,
                Expr::value(config.code_repo.devcontainer_path.clone()),
            )
            .col_expr(
                gitspace_config::Column::Branch,
                Expr::value(config.code_repo.branch.clone()),
            )
            .col_expr(
                gitspace_config::Column::IsDeleted,
                Expr::value(config.is_deleted),
            )
            .col_expr(
                gitspace_config::Column::SshTokenIdentifier,
                Expr::value(config.ssh_token_identifier.clone()),
            )
            .col_expr(gitspace_config::Column::Updated, Expr::value(updated_at))
            .filter(gitspace_config::Column::Id.eq(config.id))
            .exec(db)
            .await?;

        config.updated = updated_at;
        Ok(())
    }

    pub async fn count<C: ConnectionTrait>(
        db: &C,
        filter: &GitspaceFilter,
    ) -> Result<i64, StoreError> {
        let mut stmt = gitspace_config::Entity::find();
        if !filter.include_deleted {
            stmt = stmt.filter(gitspace_config::Column::IsDeleted.eq(false));
        }
        if let Some(user) = &filter.user_identifier {
            stmt = stmt.filter(gitspace_config::Column::UserUid.eq(user.as_str()));
        }
        if !filter.space_ids.is_empty() {
            stmt = stmt.filter(gitspace_config::Column::SpaceId.is_in(filter.space_ids.clone()));
        }
        Ok(stmt.count(db).await? as i64)
    }

    pub async fn list<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        filter: &GitspaceFilter,
    ) -> Result<Vec<GitspaceConfig>, StoreError> {
        let mut stmt = gitspace_config::Entity::find()
            .filter(gitspace_config::Column::IsDeleted.eq(false));
        if let Some(user) = &filter.user_identifier {
            stmt = stmt.filter(gitspace_config::Column::UserUid.eq(user.as_str()));
        }
        stmt = stmt.filter(gitspace_config::Column::SpaceId.is_in(filter.space_ids.clone()));
        stmt = apply_pagination(stmt, filter);

        let models = stmt.all(db).await?;
        Self::from_models(db, cache, models).await
    }

    /// Every live config of one user, across spaces.
    pub async fn list_all<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        user_identifier: &str,
    ) -> Result<Vec<GitspaceConfig>, StoreError> {
        let models = gitspace_config::Entity::find()
            .filter(gitspace_config::Column::IsDeleted.eq(false))
            .filter(gitspace_config::Column::UserUid.eq(user_identifier))
            .all(db)
            .await?;
        Self::from_models(db, cache, models).await
    }
}

fn apply_pagination(
    stmt: Select<gitspace_config::Entity>,
    filter: &GitspaceFilter,
) -> Select<gitspace_config::Entity> {
    let size = if filter.size > 0 { filter.size } else { 100 };
    stmt.limit(size as u64).offset((Ord::max(filter.page, 0) * size) as u64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::infra_provider_resource::tests::make_resource;
    use crate::models::pull_request::tests::{fixture_cache, setup_db};

    pub(crate) async fn seed_resource(db: &sea_orm::DatabaseConnection) -> InfraProviderResource {
        let mut resource = make_resource("standard", 1);
        InfraProviderResource::create(db, &mut resource).await.unwrap();
        resource
    }

    pub(crate) fn make_config(
        identifier: &str,
        space_id: i64,
        resource: &InfraProviderResource,
    ) -> GitspaceConfig {
        let now = now_millis();
        GitspaceConfig {
            id: 0,
            identifier: identifier.to_string(),
            name: format!("gitspace {identifier}"),
            ide: IdeType::VsCode,
            space_id,
            created: now,
            updated: now,
            is_deleted: false,
            ssh_token_identifier: String::new(),
            code_repo: CodeRepo {
                url: "https://example.com/repo.git".to_string(),
                r#ref: None,
                r#type: GitspaceCodeRepoType::Hosted,
                branch: "main".to_string(),
                devcontainer_path: None,
                is_private: true,
                auth_type: "oauth".to_string(),
                auth_id: "auth-1".to_string(),
            },
            user: GitspaceUser {
                id: Some(1),
                identifier: "user_1".to_string(),
                display_name: None,
                email: None,
            },
            infra_provider_resource: resource.clone(),
        }
    }

    #[tokio::test]
    async fn find_by_identifier_is_case_insensitive() {
        let db = setup_db().await;
        let cache = fixture_cache();
        let resource = seed_resource(&db).await;

        let mut config = make_config("My-Workspace", 1, &resource);
        GitspaceConfig::create(&db, &mut config).await.unwrap();

        let found = GitspaceConfig::find_by_identifier(&db, &cache, 1, "my-workspace")
            .await
            .unwrap();
        assert_eq!(found.id, config.id);
        assert_eq!(found.identifier, "My-Workspace");
        assert_eq!(found.infra_provider_resource.id, resource.id);
        assert_eq!(found.user.display_name.as_deref(), Some("User 1"));

        let err = GitspaceConfig::find_by_identifier(&db, &cache, 2, "my-workspace")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn soft_deleted_configs_are_invisible_unless_requested() {
        let db = setup_db().await;
        let cache = fixture_cache();
        let resource = seed_resource(&db).await;

        let mut config = make_config("ws1", 1, &resource);
        GitspaceConfig::create(&db, &mut config).await.unwrap();

        config.is_deleted = true;
        GitspaceConfig::update(&db, &mut config).await.unwrap();

        let err = GitspaceConfig::find(&db, &cache, config.id).await.unwrap_err();
        assert!(err.is_not_found());

        let filter = GitspaceFilter {
            space_ids: vec![1],
            ..Default::default()
        };
        assert_eq!(GitspaceConfig::count(&db, &filter).await.unwrap(), 0);

        let with_deleted = GitspaceFilter {
            include_deleted: true,
            ..Default::default()
        };
        assert_eq!(GitspaceConfig::count(&db, &with_deleted).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_user_and_space() {
        let db = setup_db().await;
        let cache = fixture_cache();
        let resource = seed_resource(&db).await;

        for (identifier, space_id, user) in
            [("ws1", 1, "user_1"), ("ws2", 1, "user_2"), ("ws3", 2, "user_1")]
        {
            let mut config = make_config(identifier, space_id, &resource);
            config.user.identifier = user.to_string();
            GitspaceConfig::create(&db, &mut config).await.unwrap();
        }

        let filter = GitspaceFilter {
            user_identifier: Some("user_1".to_string()),
            space_ids: vec![1],
            size: 10,
            ..Default::default()
        };
        let listed = GitspaceConfig::list(&db, &cache, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identifier, "ws1");

        let all = GitspaceConfig::list_all(&db, &cache, "user_1").await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
