use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PullReqState {
    #[default]
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "merged")]
    Merged,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MergeCheckStatus {
    #[default]
    #[sea_orm(string_value = "unchecked")]
    Unchecked,
    #[sea_orm(string_value = "conflict")]
    Conflict,
    #[sea_orm(string_value = "mergeable")]
    Mergeable,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MergeMethod {
    #[sea_orm(string_value = "merge")]
    Merge,
    #[sea_orm(string_value = "squash")]
    Squash,
    #[sea_orm(string_value = "rebase")]
    Rebase,
    #[sea_orm(string_value = "fast-forward")]
    FastForward,
}

/// Flow discriminator stored on every pull request. The default flow is
/// the regular pull-request review flow; the push flow covers requests
/// created by third-party push integrations and is bucketed separately
/// by the repository summary counters.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Default,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "lowercase")]
pub enum PullReqFlow {
    #[default]
    #[sea_orm(num_value = 0)]
    Pull,
    #[sea_orm(num_value = 1)]
    Push,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PullReqActivityKind {
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "change-comment")]
    ChangeComment,
    #[sea_orm(string_value = "system")]
    System,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PullReqActivityType {
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "code-comment")]
    CodeComment,
    #[sea_orm(string_value = "title-change")]
    TitleChange,
    #[sea_orm(string_value = "state-change")]
    StateChange,
    #[sea_orm(string_value = "merge")]
    Merge,
    #[sea_orm(string_value = "branch-update")]
    BranchUpdate,
    #[sea_orm(string_value = "branch-delete")]
    BranchDelete,
    #[sea_orm(string_value = "branch-restore")]
    BranchRestore,
    #[sea_orm(string_value = "review-submit")]
    ReviewSubmit,
    #[sea_orm(string_value = "reviewer-add")]
    ReviewerAdd,
    #[sea_orm(string_value = "reviewer-delete")]
    ReviewerDelete,
    #[sea_orm(string_value = "label-modify")]
    LabelModify,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PullReqReviewDecision {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "changesreq")]
    ChangesRequested,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PullReqReviewerType {
    #[default]
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "self_assigned")]
    SelfAssigned,
}

/// Sort keys accepted by the pull-request list query. The variant name
/// doubles as the physical column suffix, which keeps the ORDER BY
/// clause enum-sanitized by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PullReqSort {
    #[default]
    Number,
    Created,
    Updated,
    Edited,
    Merged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GitspaceInstanceState {
    #[default]
    #[sea_orm(string_value = "uninitialized")]
    Uninitialized,
    #[sea_orm(string_value = "starting")]
    Starting,
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "stopping")]
    Stopping,
    #[sea_orm(string_value = "stopped")]
    Stopped,
    #[sea_orm(string_value = "error")]
    Error,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GitspaceAccessType {
    #[default]
    #[sea_orm(string_value = "jwt_token")]
    JwtToken,
    #[sea_orm(string_value = "password")]
    Password,
    #[sea_orm(string_value = "ssh_key")]
    SshKey,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IdeType {
    #[default]
    #[sea_orm(string_value = "vs_code")]
    VsCode,
    #[sea_orm(string_value = "vs_code_web")]
    VsCodeWeb,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GitspaceCodeRepoType {
    #[default]
    #[sea_orm(string_value = "hosted")]
    Hosted,
    #[sea_orm(string_value = "github")]
    Github,
    #[sea_orm(string_value = "gitlab")]
    Gitlab,
    #[sea_orm(string_value = "bitbucket")]
    Bitbucket,
    #[sea_orm(string_value = "unknown")]
    Unknown,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GitspaceEntityType {
    #[sea_orm(string_value = "gitspace_config")]
    GitspaceConfig,
    #[sea_orm(string_value = "gitspace_instance")]
    GitspaceInstance,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InfraProviderType {
    #[default]
    #[sea_orm(string_value = "docker")]
    Docker,
    #[sea_orm(string_value = "custom")]
    Custom,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InfraStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "provisioned")]
    Provisioned,
    #[sea_orm(string_value = "stopped")]
    Stopped,
    #[sea_orm(string_value = "deprovisioned")]
    Deprovisioned,
    #[sea_orm(string_value = "error")]
    Error,
    #[sea_orm(string_value = "unknown")]
    Unknown,
}
