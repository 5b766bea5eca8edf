use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{AiError, Provider};

/// The o1 reasoning series rejects `max_tokens` and wants
/// `max_completion_tokens` instead.
static O1_SERIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"o1-(mini|preview)").expect("valid regex"));

const SYSTEM_PROMPT: &str = "You are an expert code reviewer fluent in many programming \
     languages. You write efficient and concise code and value security and maintainability.";

/// Chat-completion client. Build one with [`crate::ClientBuilder`].
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) provider: Provider,
    pub(crate) token: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) api_version: Option<String>,
    pub(crate) org_id: Option<String>,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f32,
    pub(crate) top_p: f32,
    pub(crate) presence_penalty: f32,
    pub(crate) frequency_penalty: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub content: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl Client {
    /// Sends one user message under the fixed review system prompt
    /// and returns the completion with its token accounting.
    pub async fn completion(&self, content: &str) -> Result<Response, AiError> {
        let request = self.chat_request(content);

        let mut req = self.http.post(self.completion_url());
        match self.provider {
            Provider::Azure => {
                req = req.header("api-key", &self.token);
            }
            _ => {
                req = req.bearer_auth(&self.token);
            }
        }
        if let Some(org_id) = &self.org_id {
            req = req.header("OpenAI-Organization", org_id);
        }

        let resp = req.json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Api { status, message });
        }

        let body: ChatResponse = resp.json().await?;
        let choice = body.choices.into_iter().next().ok_or(AiError::EmptyResponse)?;
        Ok(Response {
            content: choice.message.content,
            usage: body.usage.unwrap_or_default(),
        })
    }

    fn chat_request<'a>(&'a self, content: &'a str) -> ChatRequest<'a> {
        let o1 = O1_SERIES.is_match(&self.model);
        ChatRequest {
            model: &self.model,
            max_tokens: (!o1).then_some(self.max_tokens),
            max_completion_tokens: o1.then_some(self.max_tokens),
            temperature: self.temperature,
            top_p: self.top_p,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
        }
    }

    fn completion_url(&self) -> String {
        match self.provider {
            Provider::Azure => {
                let version = self.api_version.as_deref().unwrap_or("2024-02-01");
                format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    self.base_url, self.model, version
                )
            }
            _ => format!("{}/chat/completions", self.base_url),
        }
    }
}
