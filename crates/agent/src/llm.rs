use std::time::Duration;

use async_trait::async_trait;
use olivia_core::config::{LlmConfig, LlmProvider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service credentials are not configured")]
    MissingCredentials,
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response could not be parsed: {0}")]
    MalformedResponse(String),
    #[error("completion response had no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;

    /// Whether a call can be attempted at all.
    fn is_ready(&self) -> bool;

    /// Operator-facing description, never includes secrets.
    fn describe(&self) -> String;
}

/// OpenAI-compatible `/chat/completions` client. Ollama exposes the same API
/// locally and needs no key.
pub struct ChatCompletionsClient {
    provider: LlmProvider,
    api_key: Option<SecretString>,
    ready: bool,
    endpoint: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CompletionError::Transport(error.to_string()))?;

        let base_url = config.base_url.clone().unwrap_or_else(|| default_base_url(config.provider));
        Ok(Self {
            provider: config.provider,
            api_key: config.api_key.clone(),
            ready: config.has_credentials(),
            endpoint: chat_url(&base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bearer(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret().trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        if !self.ready {
            return Err(CompletionError::MissingCredentials);
        }
        let bearer = self.bearer();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        extract_content(&body)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn describe(&self) -> String {
        let provider = match self.provider {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        };
        let credentials = if self.is_ready() { "ready" } else { "missing api key" };
        format!("{provider} model={} endpoint={} ({credentials})", self.model, self.endpoint)
    }
}

/// Stand-in used when no usable client could be built. Every call fails and
/// the runtime answers from rules or the fallback text.
pub struct UnavailableClient {
    reason: String,
}

impl UnavailableClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl CompletionClient for UnavailableClient {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Err(CompletionError::MissingCredentials)
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("unavailable: {}", self.reason)
    }
}

fn default_base_url(provider: LlmProvider) -> String {
    match provider {
        LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
        LlmProvider::Ollama => "http://localhost:11434/v1".to_string(),
    }
}

fn chat_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    }
}

fn extract_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|error| CompletionError::MalformedResponse(error.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(content)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use olivia_core::config::{AppConfig, LlmProvider};

    use super::{
        chat_url, extract_content, ChatCompletionsClient, ChatMessage, ChatRequest,
        CompletionClient, CompletionError, UnavailableClient,
    };

    #[test]
    fn chat_url_is_derived_from_base_url() {
        assert_eq!(chat_url("https://api.openai.com/v1"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(chat_url("http://localhost:11434/v1/"), "http://localhost:11434/v1/chat/completions");
        assert_eq!(
            chat_url("https://proxy.example.com/v1/chat/completions"),
            "https://proxy.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_system_and_user_messages() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage { role: "system", content: "reglas" },
                ChatMessage { role: "user", content: "pregunta" },
            ],
            temperature: 0.2,
        };
        let json = serde_json::to_value(&request).expect("serialize request");

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "pregunta");
    }

    #[test]
    fn extracts_first_choice_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Tienes 30 días.  "}}]}"#;
        assert_eq!(extract_content(body).expect("content"), "Tienes 30 días.");
    }

    #[test]
    fn malformed_and_empty_responses_are_distinguished() {
        assert!(matches!(extract_content("<html>"), Err(CompletionError::MalformedResponse(_))));
        assert!(matches!(extract_content(r#"{"choices":[]}"#), Err(CompletionError::EmptyResponse)));
        assert!(matches!(
            extract_content(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn openai_without_key_fails_before_any_request() {
        let config = AppConfig::default();
        let client = ChatCompletionsClient::from_config(&config.llm).expect("client");

        assert!(!client.is_ready());
        assert!(client.describe().contains("missing api key"));
        assert!(matches!(
            client.complete("sistema", "usuario").await,
            Err(CompletionError::MissingCredentials)
        ));
    }

    #[test]
    fn default_config_picks_the_provider_endpoint() {
        let mut config = AppConfig::default();
        assert_eq!(config.llm.base_url, None);
        let client = ChatCompletionsClient::from_config(&config.llm).expect("client");
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");

        config.llm.provider = LlmProvider::Ollama;
        let client = ChatCompletionsClient::from_config(&config.llm).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn ollama_needs_no_key_and_description_hides_secrets() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Ollama;
        config.llm.base_url = Some("http://gpu-box:11434/v1".to_string());
        let client = ChatCompletionsClient::from_config(&config.llm).expect("client");
        assert!(client.is_ready());
        assert_eq!(client.endpoint(), "http://gpu-box:11434/v1/chat/completions");

        config.llm.provider = LlmProvider::OpenAi;
        config.llm.api_key = Some("   ".to_string().into());
        assert!(!ChatCompletionsClient::from_config(&config.llm).expect("client").is_ready());

        config.llm.api_key = Some("sk-top-secret".to_string().into());
        let client = ChatCompletionsClient::from_config(&config.llm).expect("client");
        assert!(client.is_ready());
        assert!(!client.describe().contains("sk-top-secret"));
    }

    #[tokio::test]
    async fn unavailable_client_always_fails() {
        let client = UnavailableClient::new("tls backend missing");
        assert!(!client.is_ready());
        assert!(client.describe().contains("tls backend missing"));
        assert!(client.complete("a", "b").await.is_err());
    }
}
