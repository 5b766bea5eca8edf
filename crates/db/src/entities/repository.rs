use sea_orm::entity::prelude::*;

/// Minimal projection of the `repositories` table; the pull-request
/// filter joins it for space scoping. Repository lifecycle itself is
/// managed elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "repo_id")]
    pub id: i64,
    #[sea_orm(column_name = "repo_parent_id")]
    pub parent_id: i64,
    #[sea_orm(column_name = "repo_uid")]
    pub uid: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request::Entity")]
    PullRequests,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
