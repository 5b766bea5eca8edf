pub mod activity;
pub mod code_comment;
pub mod file_view;
pub mod gitspace_config;
pub mod gitspace_event;
pub mod gitspace_instance;
pub mod infra_provider_config;
pub mod infra_provider_resource;
pub mod infra_provider_template;
pub mod infra_provisioned;
pub mod pull_request;
pub mod review;
pub mod reviewer;

pub use activity::{
    ActivityFilter, ActivityMetadata, ActivityPayload, CodeCommentFields, MentionsMetadata,
    PullReqActivity,
};
pub use code_comment::CodeComment;
pub use file_view::FileView;
pub use gitspace_config::{CodeRepo, GitspaceConfig, GitspaceFilter, GitspaceUser};
pub use gitspace_event::{GitspaceEvent, GitspaceEventFilter};
pub use gitspace_instance::{GitspaceInstance, GitspaceInstanceFilter};
pub use infra_provider_config::InfraProviderConfig;
pub use infra_provider_resource::InfraProviderResource;
pub use infra_provider_template::InfraProviderTemplate;
pub use infra_provisioned::{InfraProvisioned, InfraProvisionedGatewayView};
pub use pull_request::{PullReq, PullReqFilter, PullReqSummary, PullReqSummaryFilter};
pub use review::PullReqReview;
pub use reviewer::PullReqReviewer;

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Retry cap for optimistic-lock update loops.
pub(crate) const OPT_LOCK_RETRIES: usize = 5;
