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

//! Built-in scorers.

mod hallucination;
mod overlap;
mod quality;

pub use hallucination::HallucinationScorer;
pub use overlap::RougeLScorer;
pub use quality::SummaryQualityScorer;

use crate::ScorerFailure;

/// Parse a judge verdict as strict JSON, tolerating Markdown code fences.
pub(crate) fn parse_verdict(content: &str) -> Result<serde_json::Value, ScorerFailure> {
    let mut text = content.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        text = stripped.strip_suffix("```").unwrap_or(stripped).trim();
    }

    serde_json::from_str(text).map_err(|err| {
        ScorerFailure::MalformedVerdict(format!("{err}: {}", truncate(content, 200)))
    })
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
