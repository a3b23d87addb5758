// Copyright 2025 Summarybench (https://github.com/summarybench)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Anthropic messages client.

use crate::backend::{ChatRequest, ChatResponse, GenerationBackend, GenerationFailure, Role};
use async_trait::async_trait;
use std::time::Duration;

/// Anthropic messages backend.
///
/// The messages API takes the system instruction as a top-level field rather
/// than a message, so system messages are extracted from the request before
/// the call.
pub struct AnthropicBackend {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            timeout: super::DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different server. Used for test servers.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl GenerationBackend for AnthropicBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationFailure> {
        let system = request
            .messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|message| message.role != Role::System)
            .map(|message| {
                serde_json::json!({
                    "role": match message.role {
                        Role::User => "user",
                        _ => "assistant",
                    },
                    "content": message.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system);
        }

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(GenerationFailure::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(GenerationFailure::RateLimited);
            }
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationFailure::Backend(format!(
                "{status}: {error_text}"
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(GenerationFailure::from_transport)?;

        let content = data["content"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                GenerationFailure::MalformedResponse("missing content[0].text".into())
            })?
            .to_string();

        Ok(ChatResponse { content })
    }
}
