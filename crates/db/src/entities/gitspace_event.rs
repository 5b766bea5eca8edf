use sea_orm::entity::prelude::*;

use crate::types::GitspaceEntityType;

/// Append-only gitspace event journal. The event name is an open set
/// and therefore stored as text rather than a closed enum.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "gitspace_events")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "geven_id")]
    pub id: i64,
    #[sea_orm(column_name = "geven_event")]
    pub event: String,
    #[sea_orm(column_name = "geven_created")]
    pub created: i64,
    #[sea_orm(column_name = "geven_entity_type")]
    pub entity_type: GitspaceEntityType,
    #[sea_orm(column_name = "geven_query_key")]
    pub query_key: Option<String>,
    #[sea_orm(column_name = "geven_entity_id")]
    pub entity_id: i64,
    #[sea_orm(column_name = "geven_timestamp")]
    pub timestamp: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
