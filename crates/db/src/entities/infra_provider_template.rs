use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "infra_provider_templates")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "iptemp_id")]
    pub id: i64,
    #[sea_orm(column_name = "iptemp_uid")]
    pub uid: String,
    #[sea_orm(column_name = "iptemp_infra_provider_config_id")]
    pub infra_provider_config_id: i64,
    #[sea_orm(column_name = "iptemp_description")]
    pub description: String,
    #[sea_orm(column_name = "iptemp_space_id")]
    pub space_id: i64,
    #[sea_orm(column_name = "iptemp_data")]
    pub data: String,
    #[sea_orm(column_name = "iptemp_version")]
    pub version: i64,
    #[sea_orm(column_name = "iptemp_created")]
    pub created: i64,
    #[sea_orm(column_name = "iptemp_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
