use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::client::Client;
use crate::{AiError, Provider};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 1.0;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Configures and builds a [`Client`]. Only the token is mandatory;
/// everything else has a sane default.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    token: String,
    provider: Provider,
    model: Option<String>,
    base_url: Option<String>,
    api_version: Option<String>,
    org_id: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    presence_penalty: f32,
    frequency_penalty: f32,
    proxy_url: Option<String>,
    socks_url: Option<String>,
    headers: Vec<(String, String)>,
    skip_verify: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        ClientBuilder {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Query parameter for Azure deployments; ignored elsewhere.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Values of zero or less fall back to the default.
    pub fn max_tokens(mut self, max_tokens: i64) -> Self {
        if max_tokens > 0 {
            self.max_tokens = u32::try_from(max_tokens).ok().or(self.max_tokens);
        }
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        if temperature > 0.0 {
            self.temperature = Some(temperature);
        }
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        if top_p > 0.0 {
            self.top_p = Some(top_p);
        }
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = penalty;
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty;
        self
    }

    /// HTTP(S) proxy URL. Takes precedence over a SOCKS proxy when
    /// both are set.
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// SOCKS5 proxy address, with or without the `socks5://` scheme.
    pub fn socks_url(mut self, url: impl Into<String>) -> Self {
        self.socks_url = Some(url.into());
        self
    }

    /// Extra header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Disables TLS certificate verification. Intended for
    /// self-hosted gateways with private CAs.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client, AiError> {
        if self.token.is_empty() {
            return Err(AiError::Config("missing token".to_string()));
        }
        let model = match self.model {
            Some(model) if model.is_empty() => {
                return Err(AiError::Config("missing model".to_string()));
            }
            Some(model) => model,
            None => DEFAULT_MODEL.to_string(),
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| AiError::Config(format!("bad header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| AiError::Config(format!("bad header value: {err}")))?;
            headers.insert(name, value);
        }

        let mut http = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        if self.skip_verify {
            http = http.danger_accept_invalid_certs(true);
        }
        if let Some(url) = &self.proxy_url {
            http = http.proxy(reqwest::Proxy::all(url)?);
        } else if let Some(url) = &self.socks_url {
            let url = if url.contains("://") {
                url.clone()
            } else {
                format!("socks5://{url}")
            };
            http = http.proxy(reqwest::Proxy::all(&url)?);
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| match self.provider {
                Provider::DeepSeek => DEEPSEEK_BASE_URL.to_string(),
                _ => OPENAI_BASE_URL.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        Ok(Client {
            http: http.build()?,
            provider: self.provider,
            token: self.token,
            model,
            base_url,
            api_version: self.api_version,
            org_id: self.org_id,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
        })
    }
}
