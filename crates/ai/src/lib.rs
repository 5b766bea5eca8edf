//! Thin chat-completion client used for automated code review.
//!
//! Speaks the OpenAI-compatible wire format against a generic
//! endpoint, an Azure deployment, or DeepSeek.

mod builder;
mod client;

pub use builder::{
    ClientBuilder, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
pub use client::{Client, Response, Usage};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Azure,
    DeepSeek,
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned status {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("api returned no completion choices")]
    EmptyResponse,
}
