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

//! Candidate models: a generation backend plus fixed parameters.

use crate::backend::{ChatMessage, ChatRequest, GenerationBackend, GenerationFailure};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed generation parameters for one candidate.
///
/// Value object with structural equality; owned by exactly one
/// [`CandidateModel`]. Versioning and persistence belong to the trace-sink
/// collaborator, not to this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend model identifier, e.g. `gpt-4o-mini`
    pub model: String,

    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationConfig {
    pub fn new(model: impl Into<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

/// One model configuration under evaluation.
///
/// Stateless beyond its config: invocations share nothing, so many examples
/// may run against the same candidate concurrently.
#[derive(Clone)]
pub struct CandidateModel {
    name: String,
    config: GenerationConfig,
    backend: Arc<dyn GenerationBackend>,
}

impl CandidateModel {
    pub fn new(
        name: impl Into<String>,
        config: GenerationConfig,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// One backend call over the given messages.
    ///
    /// Returns the top response as a freshly owned string.
    pub async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<String, GenerationFailure> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self.backend.complete(&request).await?;
        Ok(response.content)
    }
}

impl std::fmt::Debug for CandidateModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateModel")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
