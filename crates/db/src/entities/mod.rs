pub mod gitspace_config;
pub mod gitspace_event;
pub mod gitspace_instance;
pub mod infra_provider_config;
pub mod infra_provider_resource;
pub mod infra_provider_template;
pub mod infra_provisioned;
pub mod pull_request;
pub mod pull_request_activity;
pub mod pull_request_file_view;
pub mod pull_request_label;
pub mod pull_request_review;
pub mod pull_request_reviewer;
pub mod repository;
