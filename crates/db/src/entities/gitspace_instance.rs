use sea_orm::entity::prelude::*;

use crate::types::{GitspaceAccessType, GitspaceInstanceState};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "gitspaces")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "gits_id")]
    pub id: i64,
    #[sea_orm(column_name = "gits_gitspace_config_id")]
    pub gitspace_config_id: i64,
    #[sea_orm(column_name = "gits_url")]
    pub url: Option<String>,
    #[sea_orm(column_name = "gits_state")]
    pub state: GitspaceInstanceState,
    #[sea_orm(column_name = "gits_user_uid")]
    pub user_uid: String,
    #[sea_orm(column_name = "gits_resource_usage")]
    pub resource_usage: Option<String>,
    #[sea_orm(column_name = "gits_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "gits_last_used")]
    pub last_used: i64,
    #[sea_orm(column_name = "gits_total_time_used")]
    pub total_time_used: i64,
    #[sea_orm(column_name = "gits_tracked_changes")]
    pub tracked_changes: Option<String>,
    #[sea_orm(column_name = "gits_access_type")]
    pub access_type: GitspaceAccessType,
    #[sea_orm(column_name = "gits_access_key_ref")]
    pub access_key_ref: Option<String>,
    #[sea_orm(column_name = "gits_machine_user")]
    pub machine_user: Option<String>,
    #[sea_orm(column_name = "gits_uid")]
    pub uid: String,
    #[sea_orm(column_name = "gits_created")]
    pub created: i64,
    #[sea_orm(column_name = "gits_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gitspace_config::Entity",
        from = "Column::GitspaceConfigId",
        to = "super::gitspace_config::Column::Id"
    )]
    Config,
}

impl Related<super::gitspace_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Config.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
