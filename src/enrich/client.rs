//! Text-generation provider abstraction: an OpenAI-compatible
//! chat-completions client for production and a scripted mock for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ai::{AiConfig, StageParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One fixed system directive plus one user payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub params: StageParams,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, params: StageParams) -> Self {
        Self {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system.into(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user.into(),
                },
            ],
            params,
        }
    }

    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Every variant is recoverable: the pipeline decides per stage whether it
/// aborts or falls back.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rate limited the request")]
    RateLimited,
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider returned empty text")]
    Empty,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generated text. Callers still treat blank output as a failure.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Chat Completions client for any OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("feed-herald/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            model: cfg.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let req = Req {
            model: &self.model,
            messages: &request.messages,
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            Err(GenerationError::Empty)
        } else {
            Ok(content.to_string())
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}

// --- Test helper ---

/// Replies from a script, in order and verbatim, and remembers every request
/// it saw. An exhausted script answers with `GenerationError::Empty`.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, text: &str) -> Self {
        self.push(Ok(text.to_string()));
        self
    }

    pub fn then_err(self, err: GenerationError) -> Self {
        self.push(Err(err));
        self
    }

    fn push(&self, reply: Result<String, GenerationError>) {
        self.script
            .lock()
            .expect("mock script poisoned")
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("mock requests poisoned").clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("mock requests poisoned").len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests
            .lock()
            .expect("mock requests poisoned")
            .push(request.clone());
        self.script
            .lock()
            .expect("mock script poisoned")
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
