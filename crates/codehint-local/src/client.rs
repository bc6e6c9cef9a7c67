//! HTTP client for llama-server's OpenAI-compatible API.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LocalAIError;
use crate::DEFAULT_PORT;

/// Lazy, single-pass sequence of generated text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LocalAIError>> + Send>>;

/// Client for communicating with llama-server.
#[derive(Clone)]
pub struct LlamaCppClient {
    client: reqwest::Client,
    base_url: String,
}

/// Chat message in OpenAI format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// What a single server-sent event means for the fragment stream.
#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Content(String),
    Skip,
    Done,
}

impl LlamaCppClient {
    /// Create a new client with default URL (localhost:11435).
    pub fn new() -> Self {
        Self::with_url(format!("http://127.0.0.1:{}", DEFAULT_PORT))
    }

    /// Create a new client with a custom URL.
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a new client with a custom port on localhost.
    pub fn with_port(port: u16) -> Self {
        Self::with_url(format!("http://127.0.0.1:{}", port))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is running and healthy.
    pub async fn check_health(&self) -> Result<(), LocalAIError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    LocalAIError::ServerNotRunning(self.base_url.clone())
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LocalAIError::ServerNotRunning(self.base_url.clone()))
        }
    }

    /// Start a streamed chat completion.
    ///
    /// Uses `/v1/chat/completions` with `stream: true`. The returned stream
    /// yields each non-empty content delta and ends at `[DONE]`.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<FragmentStream, LocalAIError> {
        let request = ChatCompletionRequest {
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: true,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!("POST {} ({} messages)", url, messages.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LocalAIError::ServerNotRunning(self.base_url.clone())
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LocalAIError::Api(format!("{}: {}", status, text)));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| {
                let event = event.map_err(|e| LocalAIError::Stream(e.to_string()))?;
                parse_event(&event.data)
            })
            .take_while(|event| future::ready(!matches!(event, Ok(StreamEvent::Done))))
            .filter_map(|event| async move {
                match event {
                    Ok(StreamEvent::Content(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(Box::pin(stream))
    }
}

impl Default for LlamaCppClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_event(data: &str) -> Result<StreamEvent, LocalAIError> {
    if data.trim() == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(LocalAIError::Api(error.message));
    }

    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) if !text.is_empty() => Ok(StreamEvent::Content(text)),
        _ => Ok(StreamEvent::Skip),
    }
}
