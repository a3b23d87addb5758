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

//! # Summarybench Models
//!
//! Generation-side building blocks for the evaluation harness:
//!
//! - [`GenerationBackend`]: the single polymorphic chat-completion capability.
//!   Provider clients ([`OpenAiBackend`], [`AnthropicBackend`]) implement it;
//!   the evaluation engine never special-cases a provider.
//! - [`CandidateModel`]: a backend plus fixed generation parameters
//!   ([`GenerationConfig`]), invocable concurrently without interference.
//! - [`SummarizingAgent`]: a candidate composed with a fixed system prompt,
//!   exposing the `predict(input) -> output` contract used uniformly across
//!   all candidates.
//!
//! ## Example
//!
//! ```rust,ignore
//! use summarybench_models::{CandidateModel, GenerationConfig, OpenAiBackend, SummarizingAgent};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(OpenAiBackend::new(std::env::var("OPENAI_API_KEY")?));
//! let candidate = CandidateModel::new(
//!     "gpt-4o-mini",
//!     GenerationConfig::new("gpt-4o-mini", 1.0, 4096),
//!     backend,
//! );
//! let agent = SummarizingAgent::new(candidate, "Summarize the text clearly and concisely.");
//! let summary = agent.predict("Long source text...").await?;
//! ```

pub mod agent;
pub mod backend;
pub mod candidate;
pub mod providers;

pub use agent::SummarizingAgent;
pub use backend::{
    ChatMessage, ChatRequest, ChatResponse, GenerationBackend, GenerationFailure, Role,
};
pub use candidate::{CandidateModel, GenerationConfig};
pub use providers::{AnthropicBackend, OpenAiBackend};
