use sea_orm::entity::prelude::*;

use crate::types::InfraProviderType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "infra_provider_configs")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ipconf_id")]
    pub id: i64,
    #[sea_orm(column_name = "ipconf_uid")]
    pub uid: String,
    #[sea_orm(column_name = "ipconf_display_name")]
    pub display_name: String,
    #[sea_orm(column_name = "ipconf_type")]
    pub r#type: InfraProviderType,
    #[sea_orm(column_name = "ipconf_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "ipconf_created")]
    pub created: i64,
    #[sea_orm(column_name = "ipconf_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::infra_provider_resource::Entity")]
    Resources,
}

impl Related<super::infra_provider_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
