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

//! OpenAI chat-completions client.

use crate::backend::{ChatRequest, ChatResponse, GenerationBackend, GenerationFailure};
use async_trait::async_trait;
use std::time::Duration;

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
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
impl GenerationBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationFailure> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationFailure::MalformedResponse("missing choices[0].message.content".into())
            })?
            .to_string();

        Ok(ChatResponse { content })
    }
}
