use sea_orm::entity::prelude::*;

/// Label assignment rows; only the columns the pull-request filter
/// joins against are mapped here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreq_labels")]
pub struct Model {
    #[sea_orm(
        primary_key,
        auto_increment = false,
        column_name = "pullreq_label_pullreq_id"
    )]
    pub pullreq_id: i64,
    #[sea_orm(primary_key, auto_increment = false, column_name = "pullreq_label_label_id")]
    pub label_id: i64,
    #[sea_orm(column_name = "pullreq_label_label_value_id")]
    pub label_value_id: Option<i64>,
    #[sea_orm(column_name = "pullreq_label_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_label_updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request::Entity",
        from = "Column::PullreqId",
        to = "super::pull_request::Column::Id"
    )]
    PullRequest,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
