use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreq_file_views")]
pub struct Model {
    #[sea_orm(
        primary_key,
        auto_increment = false,
        column_name = "pullreq_file_view_pullreq_id"
    )]
    pub pullreq_id: i64,
    #[sea_orm(
        primary_key,
        auto_increment = false,
        column_name = "pullreq_file_view_principal_id"
    )]
    pub principal_id: i64,
    #[sea_orm(primary_key, auto_increment = false, column_name = "pullreq_file_view_path")]
    pub path: String,
    #[sea_orm(column_name = "pullreq_file_view_sha")]
    pub sha: String,
    #[sea_orm(column_name = "pullreq_file_view_obsolete")]
    pub obsolete: bool,
    #[sea_orm(column_name = "pullreq_file_view_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_file_view_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
