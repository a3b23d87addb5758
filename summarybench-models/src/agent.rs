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

//! The summarizing agent: a candidate model behind a fixed system prompt.

use crate::backend::{ChatMessage, GenerationFailure};
use crate::candidate::CandidateModel;

/// Composes a [`CandidateModel`] with a fixed system instruction.
///
/// The message sequence (`system`, then `user:input`) is derived
/// deterministically from these two fields; there is no other state. This is
/// the single `predict` contract the evaluation engine uses for every
/// candidate.
#[derive(Debug, Clone)]
pub struct SummarizingAgent {
    model: CandidateModel,
    system_prompt: String,
}

impl SummarizingAgent {
    pub fn new(model: CandidateModel, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn model(&self) -> &CandidateModel {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Summarize one input with a single backend call.
    pub async fn predict(&self, input: &str) -> Result<String, GenerationFailure> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(input),
        ];
        self.model.invoke(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatRequest, ChatResponse, GenerationBackend, Role};
    use crate::candidate::GenerationConfig;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct RecordingBackend;

    #[async_trait]
    impl GenerationBackend for RecordingBackend {
        async fn complete(
            &self,
            request: &ChatRequest,
        ) -> Result<ChatResponse, GenerationFailure> {
            assert_eq!(request.messages.len(), 2);
            assert_eq!(request.messages[0].role, Role::System);
            assert_eq!(request.messages[1].role, Role::User);
            Ok(ChatResponse {
                content: format!("summary of: {}", request.messages[1].content),
            })
        }
    }

    struct TimeoutBackend;

    #[async_trait]
    impl GenerationBackend for TimeoutBackend {
        async fn complete(
            &self,
            _request: &ChatRequest,
        ) -> Result<ChatResponse, GenerationFailure> {
            Err(GenerationFailure::Timeout)
        }
    }

    fn candidate(backend: Arc<dyn GenerationBackend>) -> CandidateModel {
        CandidateModel::new(
            "mini",
            GenerationConfig::new("gpt-4o-mini", 1.0, 4096),
            backend,
        )
    }

    #[tokio::test]
    async fn predict_builds_system_then_user() {
        let agent = SummarizingAgent::new(
            candidate(Arc::new(RecordingBackend)),
            "You summarize text.",
        );

        let output = agent.predict("The cat sat on the mat.").await.unwrap();
        assert_eq!(output, "summary of: The cat sat on the mat.");
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let agent = SummarizingAgent::new(
            candidate(Arc::new(TimeoutBackend)),
            "You summarize text.",
        );

        let result = agent.predict("input").await;
        assert!(matches!(result, Err(GenerationFailure::Timeout)));
    }
}
