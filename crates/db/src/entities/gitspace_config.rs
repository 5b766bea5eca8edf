use sea_orm::entity::prelude::*;

use crate::types::{GitspaceCodeRepoType, IdeType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "gitspace_configs")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "gconf_id")]
    pub id: i64,
    #[sea_orm(column_name = "gconf_uid")]
    pub uid: String,
    #[sea_orm(column_name = "gconf_display_name")]
    pub display_name: String,
    #[sea_orm(column_name = "gconf_ide")]
    pub ide: IdeType,
    #[sea_orm(column_name = "gconf_infra_provider_resource_id")]
    pub infra_provider_resource_id: i64,
    #[sea_orm(column_name = "gconf_code_auth_type")]
    pub code_auth_type: String,
    #[sea_orm(column_name = "gconf_code_auth_id")]
    pub code_auth_id: String,
    #[sea_orm(column_name = "gconf_code_repo_type")]
    pub code_repo_type: GitspaceCodeRepoType,
    #[sea_orm(column_name = "gconf_code_repo_is_private")]
    pub code_repo_is_private: bool,
    #[sea_orm(column_name = "gconf_code_repo_ref")]
    pub code_repo_ref: Option<String>,
    #[sea_orm(column_name = "gconf_code_repo_url")]
    pub code_repo_url: String,
    #[sea_orm(column_name = "gconf_devcontainer_path")]
    pub devcontainer_path: Option<String>,
    #[sea_orm(column_name = "gconf_branch")]
    pub branch: String,
    #[sea_orm(column_name = "gconf_user_uid")]
    pub user_uid: String,
    #[sea_orm(column_name = "gconf_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "gconf_created")]
    pub created: i64,
    #[sea_orm(column_name = "gconf_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "gconf_is_deleted")]
    pub is_deleted: bool,
    #[sea_orm(column_name = "gconf_ssh_token_identifier")]
    pub ssh_token_identifier: String,
    #[sea_orm(column_name = "gconf_created_by")]
    pub created_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::gitspace_instance::Entity")]
    Instances,
}

impl Related<super::gitspace_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
