// API client module: a small blocking HTTP client that talks to the local
// Ollama server. One call, one request, no streaming.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::error::ChatError;

/// Placeholder shown (and logged) when the server reply has no `response`.
pub const NO_RESPONSE: &str = "[No response]";

/// Anything that can turn a prompt into a generation result. The chat loop
/// only talks to this trait, which keeps it testable without a server.
pub trait Generate {
    fn generate(&self, model: &str, prompt: &str) -> Result<GenerateResponse, ChatError>;
}

/// Body of `POST /api/generate`.
#[derive(Serialize, Debug)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// The parts of the non-streaming reply we care about. Timing counters are
/// optional on the wire and default to zero. Error replies carry `error`
/// instead of `response`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub eval_duration: u64,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// The generated text, or [`NO_RESPONSE`] when the field was absent.
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or(NO_RESPONSE)
    }
}

/// Holds a reqwest blocking client and the full generate endpoint URL.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    url: String,
}

impl OllamaClient {
    /// Create a client for the endpoint described by `config`. No timeout is
    /// set: a generation takes as long as the model needs.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            url: config.generate_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Generate for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<GenerateResponse, ChatError> {
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        debug!(url = %self.url, model, prompt_len = prompt.len(), "sending generate request");

        let res = self.client.post(&self.url).json(&req).send()?;
        let status = res.status();
        let body = res.text()?;

        // Any JSON body counts as a reply; a missing `response` becomes the placeholder.
        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        if !status.is_success() || parsed.error.is_some() {
            warn!(
                status = status.as_u16(),
                error = parsed.error.as_deref().unwrap_or(""),
                "Ollama reported an error"
            );
        }
        debug!(
            eval_count = parsed.eval_count,
            eval_duration = parsed.eval_duration,
            total_duration = parsed.total_duration,
            "generate request finished"
        );
        Ok(parsed)
    }
}
