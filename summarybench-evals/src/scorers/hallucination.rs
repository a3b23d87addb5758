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

//! Judge-graded groundedness of a summary in its source text.

use crate::scorers::parse_verdict;
use crate::{ScoreInput, Scorer, ScorerFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use summarybench_core::MetricValue;
use summarybench_models::{CandidateModel, ChatMessage};

const JUDGE_SYSTEM_PROMPT: &str =
    "You are an expert evaluator. Respond only with valid JSON.";

const VERDICT_PROMPT: &str = r#"Check whether the summary is grounded in the source text.
Extract every factual claim the summary makes, then count how many of those
claims are not supported by the source.

SOURCE:
{source}

SUMMARY:
{summary}

Respond in JSON format:
{
  "claims_total": <int>,
  "claims_unsupported": <int>,
  "unsupported_claims": ["claim text", ...]
}"#;

/// Asks a judge model how many of the summary's claims the source supports.
///
/// Reports `hallucination_score` (unsupported/total, 0.0 when the summary
/// makes no claims), `claims_total` and `claims_unsupported`. Judge transport
/// failures and unparseable verdicts degrade this scorer's slot only.
pub struct HallucinationScorer {
    judge: CandidateModel,
}

impl HallucinationScorer {
    pub fn new(judge: CandidateModel) -> Self {
        Self { judge }
    }

    async fn ask_judge(&self, prompt: String) -> Result<serde_json::Value, ScorerFailure> {
        let content = self
            .judge
            .invoke(vec![
                ChatMessage::system(JUDGE_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ])
            .await
            .map_err(|err| ScorerFailure::Judge(err.to_string()))?;

        parse_verdict(&content)
    }
}

#[async_trait]
impl Scorer for HallucinationScorer {
    fn name(&self) -> &str {
        "hallucination"
    }

    async fn score(
        &self,
        input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure> {
        let prompt = VERDICT_PROMPT
            .replace("{source}", input.input)
            .replace("{summary}", input.output);

        let verdict = self.ask_judge(prompt).await?;

        let total = verdict["claims_total"].as_i64().ok_or_else(|| {
            ScorerFailure::MalformedVerdict("missing claims_total".to_string())
        })?;
        let unsupported = verdict["claims_unsupported"].as_i64().ok_or_else(|| {
            ScorerFailure::MalformedVerdict("missing claims_unsupported".to_string())
        })?;

        let score = if total > 0 {
            unsupported as f64 / total as f64
        } else {
            0.0
        };

        Ok(HashMap::from([
            (
                "hallucination_score".to_string(),
                MetricValue::Float(score),
            ),
            ("claims_total".to_string(), MetricValue::Int(total)),
            (
                "claims_unsupported".to_string(),
                MetricValue::Int(unsupported),
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use summarybench_models::{
        ChatRequest, ChatResponse, GenerationBackend, GenerationConfig, GenerationFailure,
    };

    struct StubJudge {
        content: &'static str,
    }

    #[async_trait]
    impl GenerationBackend for StubJudge {
        async fn complete(
            &self,
            _request: &ChatRequest,
        ) -> Result<ChatResponse, GenerationFailure> {
            Ok(ChatResponse {
                content: self.content.to_string(),
            })
        }
    }

    struct DownJudge;

    #[async_trait]
    impl GenerationBackend for DownJudge {
        async fn complete(
            &self,
            _request: &ChatRequest,
        ) -> Result<ChatResponse, GenerationFailure> {
            Err(GenerationFailure::Timeout)
        }
    }

    fn judge(backend: Arc<dyn GenerationBackend>) -> CandidateModel {
        CandidateModel::new(
            "judge",
            GenerationConfig::new("gpt-4o", 0.0, 1024),
            backend,
        )
    }

    fn score_input<'a>() -> ScoreInput<'a> {
        ScoreInput {
            input: "Paris is the capital and largest city of France.",
            reference: None,
            output: "Paris is the capital of France.",
        }
    }

    #[tokio::test]
    async fn grounded_summary_scores_zero() {
        let scorer = HallucinationScorer::new(judge(Arc::new(StubJudge {
            content: r#"{"claims_total": 1, "claims_unsupported": 0, "unsupported_claims": []}"#,
        })));

        let metrics = scorer.score(score_input()).await.unwrap();

        assert_eq!(metrics["hallucination_score"], MetricValue::Float(0.0));
        assert_eq!(metrics["claims_total"], MetricValue::Int(1));
        assert_eq!(metrics["claims_unsupported"], MetricValue::Int(0));
    }

    #[tokio::test]
    async fn unsupported_claims_raise_the_score() {
        let scorer = HallucinationScorer::new(judge(Arc::new(StubJudge {
            content: r#"{"claims_total": 4, "claims_unsupported": 1, "unsupported_claims": ["Paris has 10 million residents"]}"#,
        })));

        let metrics = scorer.score(score_input()).await.unwrap();
        assert_eq!(metrics["hallucination_score"], MetricValue::Float(0.25));
    }

    #[tokio::test]
    async fn claimless_summary_scores_zero() {
        let scorer = HallucinationScorer::new(judge(Arc::new(StubJudge {
            content: r#"{"claims_total": 0, "claims_unsupported": 0, "unsupported_claims": []}"#,
        })));

        let metrics = scorer.score(score_input()).await.unwrap();
        assert_eq!(metrics["hallucination_score"], MetricValue::Float(0.0));
    }

    #[tokio::test]
    async fn judge_transport_failure_degrades_this_slot() {
        let scorer = HallucinationScorer::new(judge(Arc::new(DownJudge)));

        let result = scorer.score(score_input()).await;
        assert!(matches!(result, Err(ScorerFailure::Judge(_))));
    }

    #[tokio::test]
    async fn prose_verdict_is_malformed() {
        let scorer = HallucinationScorer::new(judge(Arc::new(StubJudge {
            content: "The summary is fully grounded.",
        })));

        let result = scorer.score(score_input()).await;
        assert!(matches!(result, Err(ScorerFailure::MalformedVerdict(_))));
    }
}
