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

//! Judge-graded summary quality on a 1-5 scale per criterion.

use crate::scorers::parse_verdict;
use crate::{ScoreInput, Scorer, ScorerFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use summarybench_core::MetricValue;
use summarybench_models::{CandidateModel, ChatMessage};

const JUDGE_SYSTEM_PROMPT: &str =
    "You are an expert evaluator. Respond only with valid JSON.";

const GRADING_PROMPT: &str = r#"Grade the summary of the source text on each criterion,
from 1 (poor) to 5 (excellent):

- coherence: the summary reads as a well-structured, logically ordered whole
- consistency: the summary states only facts that the source supports
- fluency: the summary's sentences are grammatical and natural
- relevance: the summary captures the source's important content, nothing extraneous

SOURCE:
{source}

SUMMARY:
{summary}

Respond in JSON format:
{
  "coherence": <int 1-5>,
  "consistency": <int 1-5>,
  "fluency": <int 1-5>,
  "relevance": <int 1-5>
}"#;

const CRITERIA: [&str; 4] = ["coherence", "consistency", "fluency", "relevance"];

/// Asks a judge model for 1-5 grades on coherence, consistency, fluency and
/// relevance, and reports each grade plus their mean as `overall`.
pub struct SummaryQualityScorer {
    judge: CandidateModel,
}

impl SummaryQualityScorer {
    pub fn new(judge: CandidateModel) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Scorer for SummaryQualityScorer {
    fn name(&self) -> &str {
        "summary_quality"
    }

    async fn score(
        &self,
        input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure> {
        let prompt = GRADING_PROMPT
            .replace("{source}", input.input)
            .replace("{summary}", input.output);

        let content = self
            .judge
            .invoke(vec![
                ChatMessage::system(JUDGE_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ])
            .await
            .map_err(|err| ScorerFailure::Judge(err.to_string()))?;

        let verdict = parse_verdict(&content)?;

        let mut metrics = HashMap::new();
        let mut sum = 0.0;
        for criterion in CRITERIA {
            let grade = verdict[criterion].as_f64().ok_or_else(|| {
                ScorerFailure::MalformedVerdict(format!("missing grade for {criterion}"))
            })?;
            let grade = grade.clamp(1.0, 5.0);
            sum += grade;
            metrics.insert(criterion.to_string(), MetricValue::Float(grade));
        }
        metrics.insert(
            "overall".to_string(),
            MetricValue::Float(sum / CRITERIA.len() as f64),
        );

        Ok(metrics)
    }
}
