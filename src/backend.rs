//! Text-generation backends.
//!
//! The pipeline only sees [`TextBackend`]. Concrete providers form a closed
//! set ([`ProviderKind`]) chosen once at startup through
//! [`ProviderKind::create`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8_192;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Capability used by the note generator: turn a prompt into text.
///
/// Implementations must return the provider's text unmodified and report
/// every failure as an error; callers never retry.
pub trait TextBackend: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Sends the prompt and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] for auth, quota, network or
    /// malformed-response failures.
    fn invoke(&self, prompt: &str) -> Result<String>;
}

impl<T: TextBackend + ?Sized> TextBackend for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, prompt: &str) -> Result<String> {
        (**self).invoke(prompt)
    }
}

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (`generateContent` API)
    Gemini,
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic Claude messages API
    Claude,
}

impl ProviderKind {
    /// Returns the tag used on the command line and in config files.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
        }
    }

    /// Returns all providers.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Gemini, Self::OpenAi, Self::Claude]
    }

    /// Parses a provider tag, ignoring ASCII case.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.id().eq_ignore_ascii_case(id))
    }

    /// Model used when none is configured.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenAi => "gpt-4o",
            Self::Claude => "claude-sonnet-4-5-20250929",
        }
    }

    /// Environment variable consulted when no API key is configured.
    #[must_use]
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
        }
    }

    const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAi => "https://api.openai.com",
            Self::Claude => "https://api.anthropic.com",
        }
    }

    /// Builds the backend for this provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is available and
    /// [`Error::Backend`] if the HTTP client cannot be built.
    pub fn create(self, config: &BackendConfig) -> Result<Box<dyn TextBackend>> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            Error::config(format!(
                "No API key for {}. Pass --api-key or set {}",
                self.id(),
                self.api_key_env()
            ))
        })?;

        Ok(Box::new(HttpBackend::new(self, config, api_key)?))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Settings for the text-generation backend.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BackendConfig {
    /// Provider to call
    pub provider: ProviderKind,

    /// Model name passed to the provider
    pub model: String,

    /// API key; falls back to the provider's environment variable
    pub api_key: Option<String>,

    /// Base URL override (proxies, gateways, local mocks)
    pub endpoint: Option<String>,

    /// Request timeout; `None` waits for the provider indefinitely
    pub timeout: Option<Duration>,

    /// Output token cap sent to Claude and Gemini
    pub max_output_tokens: u32,
}

impl BackendConfig {
    /// Creates settings for a provider with its default model.
    #[must_use]
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            endpoint: None,
            timeout: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Returns the configured key, or the provider's environment variable.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(ProviderKind::Gemini)
    }
}

/// Blocking HTTP client for one of the hosted providers.
struct HttpBackend {
    provider: ProviderKind,
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
}

impl HttpBackend {
    fn new(provider: ProviderKind, config: &BackendConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("devnotes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::backend(provider.id(), e.to_string()))?;

        let endpoint = config
            .endpoint
            .as_deref()
            .unwrap_or_else(|| provider.default_endpoint())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            provider,
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn request(&self, prompt: &str) -> reqwest::blocking::RequestBuilder {
        let body = request_body(self.provider, &self.model, prompt, self.max_output_tokens);

        match self.provider {
            ProviderKind::Gemini => self
                .client
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.endpoint, self.model
                ))
                .header("x-goog-api-key", self.api_key.as_str())
                .json(&body),
            ProviderKind::OpenAi => self
                .client
                .post(format!("{}/v1/chat/completions", self.endpoint))
                .bearer_auth(&self.api_key)
                .json(&body),
            ProviderKind::Claude => self
                .client
                .post(format!("{}/v1/messages", self.endpoint))
                .header("x-api-key", self.api_key.as_str())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        }
    }
}

impl TextBackend for HttpBackend {
    fn name(&self) -> &str {
        self.provider.id()
    }

    fn invoke(&self, prompt: &str) -> Result<String> {
        let provider = self.provider.id();
        debug!(
            "Calling {} model {} with a {}-byte prompt",
            provider,
            self.model,
            prompt.len()
        );

        let response = self
            .request(prompt)
            .send()
            .map_err(|e| Error::backend(provider, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::backend(provider, e.to_string()))?;

        if !status.is_success() {
            return Err(Error::backend(provider, format!("HTTP {status}: {body}")));
        }

        trace!("{} responded with {} bytes", provider, body.len());

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| Error::backend(provider, format!("Malformed response: {e}")))?;

        response_text(self.provider, &value)
            .ok_or_else(|| Error::backend(provider, "Response contained no text"))
    }
}

/// Builds the JSON request body for a provider.
fn request_body(provider: ProviderKind, model: &str, prompt: &str, max_output_tokens: u32) -> Value {
    match provider {
        ProviderKind::Gemini => json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "maxOutputTokens": max_output_tokens },
        }),
        ProviderKind::OpenAi => json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        }),
        ProviderKind::Claude => json!({
            "model": model,
            "max_tokens": max_output_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        }),
    }
}

/// Pulls the generated text out of a provider response.
fn response_text(provider: ProviderKind, value: &Value) -> Option<String> {
    match provider {
        ProviderKind::Gemini => joined_text(value.pointer("/candidates/0/content/parts")?),
        ProviderKind::OpenAi => value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string),
        ProviderKind::Claude => joined_text(value.get("content")?),
    }
}

/// Concatenates the `text` fields of an array of content parts.
fn joined_text(parts: &Value) -> Option<String> {
    let texts: Vec<&str> = parts
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids_round_trip() {
        for kind in ProviderKind::all() {
            assert_eq!(ProviderKind::from_id(kind.id()), Some(*kind));
        }
        assert_eq!(ProviderKind::from_id("Claude"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::from_id("mistral"), None);
    }

    #[test]
    fn test_default_models() {
        assert_eq!(ProviderKind::Gemini.default_model(), "gemini-2.5-flash");
        assert_eq!(ProviderKind::OpenAi.default_model(), "gpt-4o");
        assert_eq!(
            BackendConfig::new(ProviderKind::Claude).model,
            "claude-sonnet-4-5-20250929"
        );
    }

    #[test]
    fn test_create_with_explicit_key() {
        let mut config = BackendConfig::new(ProviderKind::OpenAi);
        config.api_key = Some("sk-test".to_string());

        let backend = ProviderKind::OpenAi.create(&config).unwrap();
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn test_blank_key_is_not_a_key() {
        let mut config = BackendConfig::new(ProviderKind::Claude);
        config.api_key = Some("   ".to_string());

        if std::env::var(ProviderKind::Claude.api_key_env()).is_err() {
            let err = ProviderKind::Claude.create(&config).err().unwrap();
            assert!(err.is_config());
            assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        }
    }

    #[test]
    fn test_request_bodies() {
        let claude = request_body(ProviderKind::Claude, "claude-x", "Explain loops", 1024);
        assert_eq!(claude["model"], "claude-x");
        assert_eq!(claude["max_tokens"], 1024);
        assert_eq!(claude["messages"][0]["content"], "Explain loops");

        let openai = request_body(ProviderKind::OpenAi, "gpt-4o", "Explain loops", 1024);
        assert_eq!(openai["messages"][0]["role"], "user");
        assert!(openai.get("max_tokens").is_none());

        let gemini = request_body(ProviderKind::Gemini, "gemini-2.5-flash", "Explain loops", 1024);
        assert_eq!(gemini["contents"][0]["parts"][0]["text"], "Explain loops");
        assert_eq!(gemini["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_openai_response_text() {
        let value = json!({
            "choices": [{ "message": { "role": "assistant", "content": "## Loops\nBody" } }]
        });
        assert_eq!(
            response_text(ProviderKind::OpenAi, &value).as_deref(),
            Some("## Loops\nBody")
        );
    }

    #[test]
    fn test_claude_response_joins_text_blocks() {
        let value = json!({
            "content": [
                { "type": "text", "text": "Part one. " },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "Part two." }
            ]
        });
        assert_eq!(
            response_text(ProviderKind::Claude, &value).as_deref(),
            Some("Part one. Part two.")
        );
    }

    #[test]
    fn test_gemini_response_text() {
        let value = json!({
            "candidates": [{ "content": { "parts": [{ "text": "A" }, { "text": "B" }] } }]
        });
        assert_eq!(response_text(ProviderKind::Gemini, &value).as_deref(), Some("AB"));
    }

    #[test]
    fn test_malformed_responses_have_no_text() {
        assert!(response_text(ProviderKind::Gemini, &json!({ "candidates": [] })).is_none());
        assert!(response_text(ProviderKind::OpenAi, &json!({ "error": "quota" })).is_none());
        assert!(response_text(ProviderKind::Claude, &json!({ "content": [] })).is_none());
    }

    #[test]
    fn test_scripted_backend_replays_in_order() {
        let backend = mock::ScriptedBackend::with_responses(["first", "second"]);
        backend.push_error("rate limited");

        assert_eq!(backend.invoke("a").unwrap(), "first");
        assert_eq!(backend.invoke("b").unwrap(), "second");
        assert!(backend.invoke("c").unwrap_err().is_backend());
        assert_eq!(backend.prompts(), vec!["a", "b", "c"]);
    }
}
