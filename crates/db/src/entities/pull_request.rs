use sea_orm::entity::prelude::*;

use crate::types::{MergeCheckStatus, MergeMethod, PullReqFlow, PullReqState};

/// Physical row of the `pullreqs` table. Column names keep the legacy
/// `pullreq_` prefix so queries stay compatible with existing data.
/// Draft state is stored as text "true"/"false" and conflict lists as
/// newline-joined text; the model layer translates both.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pullreqs")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "pullreq_id")]
    pub id: i64,
    #[sea_orm(column_name = "pullreq_version")]
    pub version: i64,
    #[sea_orm(column_name = "pullreq_number")]
    pub number: i64,
    #[sea_orm(column_name = "pullreq_created_by")]
    pub created_by: i64,
    #[sea_orm(column_name = "pullreq_created")]
    pub created: i64,
    #[sea_orm(column_name = "pullreq_updated")]
    pub updated: i64,
    #[sea_orm(column_name = "pullreq_edited")]
    pub edited: i64,
    #[sea_orm(column_name = "pullreq_closed")]
    pub closed: Option<i64>,
    #[sea_orm(column_name = "pullreq_state")]
    pub state: PullReqState,
    #[sea_orm(column_name = "pullreq_is_draft")]
    pub is_draft: String,
    #[sea_orm(column_name = "pullreq_comment_count")]
    pub comment_count: i64,
    #[sea_orm(column_name = "pullreq_unresolved_count")]
    pub unresolved_count: i64,
    #[sea_orm(column_name = "pullreq_title")]
    pub title: String,
    #[sea_orm(column_name = "pullreq_description")]
    pub description: String,
    #[sea_orm(column_name = "pullreq_source_repo_id")]
    pub source_repo_id: i64,
    #[sea_orm(column_name = "pullreq_source_branch")]
    pub source_branch: String,
    #[sea_orm(column_name = "pullreq_source_sha")]
    pub source_sha: String,
    #[sea_orm(column_name = "pullreq_target_repo_id")]
    pub target_repo_id: i64,
    #[sea_orm(column_name = "pullreq_target_branch")]
    pub target_branch: String,
    #[sea_orm(column_name = "pullreq_activity_seq")]
    pub activity_seq: i64,
    #[sea_orm(column_name = "pullreq_merged_by")]
    pub merged_by: Option<i64>,
    #[sea_orm(column_name = "pullreq_merged")]
    pub merged: Option<i64>,
    #[sea_orm(column_name = "pullreq_merge_method")]
    pub merge_method: Option<MergeMethod>,
    #[sea_orm(column_name = "pullreq_merge_check_status")]
    pub merge_check_status: MergeCheckStatus,
    #[sea_orm(column_name = "pullreq_merge_target_sha")]
    pub merge_target_sha: Option<String>,
    #[sea_orm(column_name = "pullreq_merge_base_sha")]
    pub merge_base_sha: String,
    #[sea_orm(column_name = "pullreq_merge_sha")]
    pub merge_sha: Option<String>,
    #[sea_orm(column_name = "pullreq_merge_conflicts")]
    pub merge_conflicts: Option<String>,
    #[sea_orm(column_name = "pullreq_rebase_check_status")]
    pub rebase_check_status: MergeCheckStatus,
    #[sea_orm(column_name = "pullreq_rebase_conflicts")]
    pub rebase_conflicts: Option<String>,
    #[sea_orm(column_name = "pullreq_commit_count")]
    pub commit_count: Option<i64>,
    #[sea_orm(column_name = "pullreq_file_count")]
    pub file_count: Option<i64>,
    #[sea_orm(column_name = "pullreq_additions")]
    pub additions: Option<i64>,
    #[sea_orm(column_name = "pullreq_deletions")]
    pub deletions: Option<i64>,
    #[sea_orm(column_name = "pullreq_flow")]
    pub flow: PullReqFlow,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request_activity::Entity")]
    Activities,
    #[sea_orm(has_many = "super::pull_request_reviewer::Entity")]
    Reviewers,
    #[sea_orm(has_many = "super::pull_request_label::Entity")]
    Labels,
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::TargetRepoId",
        to = "super::repository::Column::Id"
    )]
    TargetRepository,
}

impl Related<super::pull_request_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl Related<super::pull_request_reviewer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviewers.def()
    }
}

impl Related<super::pull_request_label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Labels.def()
    }
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TargetRepository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
