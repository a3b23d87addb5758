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

//! The chat-completion capability every generation backend implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message role in a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in an ordered chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// The backend's top response, reduced to plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Why a generation call failed. Never silently swallowed: the evaluation
/// engine records the failure per (model, example) pair.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("backend request timed out")]
    Timeout,

    #[error("backend rate limit exceeded")]
    RateLimited,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GenerationFailure {
    /// Map a transport error, folding timeouts into their own variant.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationFailure::Timeout
        } else {
            GenerationFailure::Http(err)
        }
    }
}

/// A generic chat-completion backend.
///
/// Implementations must be safe to call concurrently; every response carries
/// freshly owned content, never a view into shared state.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let message = ChatMessage::system("You summarize text.");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "You summarize text.");
    }

    #[test]
    fn request_shape_is_stable() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 1.0,
            max_tokens: 4096,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 4096);
    }
}
