use sea_orm::entity::prelude::*;

use crate::types::PullReqReviewDecision;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreq_reviews")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "pullreq_review_id")]
    pub id: i64,
    #[sea_orm(column_name = "pullreq_review_created_by")]
    pub created_by: i64,
    #[sea_orm(column_name = "pullreq_review_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_review_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "pullreq_review_pullreq_id")]
    pub pullreq_id: i64,
    #[sea_orm(column_name = "pullreq_review_decision")]
    pub decision: PullReqReviewDecision,
    #[sea_orm(column_name = "pullreq_review_sha")]
    pub sha: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
