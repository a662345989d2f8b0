//! Per-call remote model client for `ai_agent`: the
//! engine holds no long-lived handle, so every `complete()` call builds
//! its own blocking `reqwest::Client` with the mandated 60s timeout.
//! The AI text-extraction streaming service itself is an external
//! collaborator; this is only the thin completion contract
//! the core operator calls through.

use dataflow_engine::{DataflowError, ErrorCategory, ModelClient, Result};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

/// A chat-completions-style HTTP client. `base_url` plus an endpoint of
/// `/chat/completions` covers the OpenAI-compatible surface most hosts
/// proxy to; `api_key` is sent as a bearer token when present.
pub struct HttpModelClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpModelClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }
}

impl ModelClient for HttpModelClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DataflowError::new(ErrorCategory::RemoteUnavailable, e.to_string()))?;

        let mut request = client.post(format!("{}/chat/completions", self.base_url)).json(&serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| DataflowError::new(ErrorCategory::RemoteUnavailable, format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DataflowError::new(
                ErrorCategory::RemoteUnavailable,
                format!("model endpoint returned {}", response.status()),
            ));
        }

        let body: ChatCompletion = response
            .json()
            .map_err(|e| DataflowError::new(ErrorCategory::RemoteUnavailable, format!("could not parse model response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DataflowError::new(ErrorCategory::RemoteUnavailable, "model response had no choices"))
    }
}

/// A `ModelClient` for hosts that disable the AI operator entirely —
/// enabling it is a boundary configuration choice, not a core contract.
/// Every call fails with `remote_unavailable`.
pub struct DisabledModelClient;

impl ModelClient for DisabledModelClient {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(DataflowError::new(
            ErrorCategory::RemoteUnavailable,
            "the ai_agent operator is disabled on this host",
        ))
    }
}
