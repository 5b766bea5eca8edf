use sea_orm::entity::prelude::*;

use crate::types::InfraProviderType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "infra_provider_resources")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ipreso_id")]
    pub id: i64,
    #[sea_orm(column_name = "ipreso_uid")]
    pub uid: String,
    #[sea_orm(column_name = "ipreso_display_name")]
    pub display_name: String,
    #[sea_orm(column_name = "ipreso_infra_provider_config_id")]
    pub infra_provider_config_id: i64,
    #[sea_orm(column_name = "ipreso_type")]
    pub r#type: InfraProviderType,
    #[sea_orm(column_name = "ipreso_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "ipreso_cpu")]
    pub cpu: Option<String>,
    #[sea_orm(column_name = "ipreso_memory")]
    pub memory: Option<String>,
    #[sea_orm(column_name = "ipreso_disk")]
    pub disk: Option<String>,
    #[sea_orm(column_name = "ipreso_network")]
    pub network: Option<String>,
    #[sea_orm(column_name = "ipreso_region")]
    pub region: String,
    #[sea_orm(column_name = "ipreso_opentofu_params")]
    pub opentofu_params: Option<Json>,
    #[sea_orm(column_name = "ipreso_infra_provider_template_id")]
    pub infra_provider_template_id: Option<i64>,
    #[sea_orm(column_name = "ipreso_created")]
    pub created: i64,
    #[sea_orm(column_name = "ipreso_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::infra_provider_config::Entity",
        from = "Column::InfraProviderConfigId",
        to = "super::infra_provider_config::Column::Id"
    )]
    Config,
}

impl Related<super::infra_provider_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Config.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
