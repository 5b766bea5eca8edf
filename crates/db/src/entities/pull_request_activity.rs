use sea_orm::entity::prelude::*;

use crate::types::{PullReqActivityKind, PullReqActivityType};

/// Row of the `pullreq_activities` journal. The code-comment columns
/// are populated only for `(code-comment, change-comment)` rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreq_activities")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "pullreq_activity_id")]
    pub id: i64,
    #[sea_orm(column_name = "pullreq_activity_version")]
    pub version: i64,
    #[sea_orm(column_name = "pullreq_activity_created_by")]
    pub created_by: i64,
    #[sea_orm(column_name = "pullreq_activity_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_activity_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "pullreq_activity_edited")]
    pub edited: i64,
    #[sea_orm(column_name = "pullreq_activity_deleted")]
    pub deleted: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_parent_id")]
    pub parent_id: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_repo_id")]
    pub repo_id: i64,
    #[sea_orm(column_name = "pullreq_activity_pullreq_id")]
    pub pullreq_id: i64,
    #[sea_orm(column_name = "pullreq_activity_order")]
    pub order: i64,
    #[sea_orm(column_name = "pullreq_activity_sub_order")]
    pub sub_order: i64,
    #[sea_orm(column_name = "pullreq_activity_reply_seq")]
    pub reply_seq: i64,
    #[sea_orm(column_name = "pullreq_activity_type")]
    pub r#type: PullReqActivityType,
    #[sea_orm(column_name = "pullreq_activity_kind")]
    pub kind: PullReqActivityKind,
    #[sea_orm(column_name = "pullreq_activity_text")]
    pub text: String,
    #[sea_orm(column_name = "pullreq_activity_payload")]
    pub payload: Option<Json>,
    #[sea_orm(column_name = "pullreq_activity_metadata")]
    pub metadata: Option<Json>,
    #[sea_orm(column_name = "pullreq_activity_resolved_by")]
    pub resolved_by: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_resolved")]
    pub resolved: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_outdated")]
    pub outdated: Option<bool>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_merge_base_sha")]
    pub code_comment_merge_base_sha: Option<String>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_source_sha")]
    pub code_comment_source_sha: Option<String>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_path")]
    pub code_comment_path: Option<String>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_line_new")]
    pub code_comment_line_new: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_span_new")]
    pub code_comment_span_new: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_line_old")]
    pub code_comment_line_old: Option<i64>,
    #[sea_orm(column_name = "pullreq_activity_code_comment_span_old")]
    pub code_comment_span_old: Option<i64>,
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
