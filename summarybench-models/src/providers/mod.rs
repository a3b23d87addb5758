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

//! Provider clients implementing [`crate::GenerationBackend`].

mod anthropic;
mod openai;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

use std::time::Duration;

/// Default per-request timeout for provider calls.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
