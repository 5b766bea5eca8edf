use sea_orm::entity::prelude::*;

use crate::types::{InfraProviderType, InfraStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "infra_provisioned")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "iprov_id")]
    pub id: i64,
    #[sea_orm(column_name = "iprov_gitspace_id")]
    pub gitspace_instance_id: i64,
    #[sea_orm(column_name = "iprov_type")]
    pub r#type: InfraProviderType,
    #[sea_orm(column_name = "iprov_infra_provider_resource_id")]
    pub infra_provider_resource_id: i64,
    #[sea_orm(column_name = "iprov_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "iprov_created")]
    pub created: i64,
    #[sea_orm(column_name = "iprov_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "iprov_response_metadata")]
    pub response_metadata: Option<String>,
    #[sea_orm(column_name = "iprov_opentofu_params")]
    pub input_params: String,
    #[sea_orm(column_name = "iprov_infra_status")]
    pub infra_status: InfraStatus,
    #[sea_orm(column_name = "iprov_server_host_ip")]
    pub server_host_ip: String,
    #[sea_orm(column_name = "iprov_server_host_port")]
    pub server_host_port: String,
    #[sea_orm(column_name = "iprov_proxy_host")]
    pub proxy_host: String,
    #[sea_orm(column_name = "iprov_proxy_port")]
    pub proxy_port: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gitspace_instance::Entity",
        from = "Column::GitspaceInstanceId",
        to = "super::gitspace_instance::Column::Id"
    )]
    GitspaceInstance,
}

impl Related<super::gitspace_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GitspaceInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
