use sea_orm::entity::prelude::*;

use crate::types::{PullReqReviewDecision, PullReqReviewerType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreq_reviewers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "pullreq_reviewer_pullreq_id")]
    pub pullreq_id: i64,
    #[sea_orm(
        primary_key,
        auto_increment = false,
        column_name = "pullreq_reviewer_principal_id"
    )]
    pub principal_id: i64,
    #[sea_orm(column_name = "pullreq_reviewer_created_by")]
    pub created_by: i64,
    #[sea_orm(column_name = "pullreq_reviewer_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_reviewer_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "pullreq_reviewer_repo_id")]
    pub repo_id: i64,
    #[sea_orm(column_name = "pullreq_reviewer_type")]
    pub r#type: PullReqReviewerType,
    #[sea_orm(column_name = "pullreq_reviewer_latest_review_id")]
    pub latest_review_id: Option<i64>,
    #[sea_orm(column_name = "pullreq_reviewer_review_decision")]
    pub review_decision: PullReqReviewDecision,
    #[sea_orm(column_name = "pullreq_reviewer_sha")]
    pub sha: String,
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
