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

//! End-to-end scenarios for the evaluation run loop.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use summarybench_core::{
    Dataset, Example, FeedbackError, FeedbackStore, JsonlSink, MemorySink, MetricValue, Reaction,
    RecordStatus, Reference,
};
use summarybench_evals::run::{EvalRunError, EvaluationRun, RunConfig};
use summarybench_evals::scorers::RougeLScorer;
use summarybench_evals::{RunContext, ScoreInput, Scorer, ScorerFailure};
use summarybench_models::{
    CandidateModel, ChatRequest, ChatResponse, GenerationBackend, GenerationConfig,
    GenerationFailure,
};

/// Returns a fixed summary for every input.
struct FixedBackend {
    output: &'static str,
}

#[async_trait]
impl GenerationBackend for FixedBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, GenerationFailure> {
        Ok(ChatResponse {
            content: self.output.to_string(),
        })
    }
}

/// Fails every call with a timeout.
struct TimeoutBackend;

#[async_trait]
impl GenerationBackend for TimeoutBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, GenerationFailure> {
        Err(GenerationFailure::Timeout)
    }
}

/// Echoes the user message after a per-input delay, so concurrent sweeps
/// complete in a different order than they were issued.
struct StaggeredEchoBackend;

#[async_trait]
impl GenerationBackend for StaggeredEchoBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationFailure> {
        let input = request
            .messages
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        // Longer inputs finish first.
        let delay = 60u64.saturating_sub((input.len() as u64).min(50));
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(ChatResponse { content: input })
    }
}

/// Counts invocations; scoring must never run for failed generations.
struct CountingScorer {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Scorer for CountingScorer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn score(
        &self,
        _input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HashMap::from([(
            "calls".to_string(),
            MetricValue::Int(1),
        )]))
    }
}

/// Always degrades its slot.
struct BrokenScorer;

#[async_trait]
impl Scorer for BrokenScorer {
    fn name(&self) -> &str {
        "broken"
    }

    async fn score(
        &self,
        _input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure> {
        Err(ScorerFailure::Judge("judge unreachable".to_string()))
    }
}

fn candidate(name: &str, backend: Arc<dyn GenerationBackend>) -> CandidateModel {
    CandidateModel::new(name, GenerationConfig::new(name, 1.0, 4096), backend)
}

fn cat_mat_dataset() -> Dataset {
    Dataset::new(
        "cat-mat",
        vec![Example::new("ex1", "The cat sat on the mat.")
            .with_reference(Reference::Single("A cat sits on a mat.".to_string()))],
    )
    .unwrap()
}

#[tokio::test]
async fn paraphrased_summary_scores_above_the_bar() {
    let sink = Arc::new(MemorySink::new());
    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text."),
        vec![candidate(
            "stub",
            Arc::new(FixedBackend {
                output: "A cat is sitting on the mat.",
            }),
        )],
        vec![Arc::new(RougeLScorer::new())],
        RunContext::open(sink.clone()),
    );

    let report = run.execute(&cat_mat_dataset()).await.unwrap();

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert!(record.is_ok());

    let Some(MetricValue::Float(fmeasure)) = record.metric("rouge_l", "rouge_l_fmeasure") else {
        panic!("rouge_l_fmeasure missing");
    };
    assert!(*fmeasure > 0.7, "fmeasure was {fmeasure}");

    let summary = &report.summaries[0];
    assert_eq!(summary.count_failed, 0);
    assert_eq!(summary.count_ok, 1);

    // One trace event per record, carrying the same call id.
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].call_id, record.id);
}

#[tokio::test]
async fn broken_model_records_failures_without_scoring() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dataset = Dataset::new(
        "three",
        vec![
            Example::new("ex1", "first"),
            Example::new("ex2", "second"),
            Example::new("ex3", "third"),
        ],
    )
    .unwrap();

    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text.").with_max_consecutive_failures(0),
        vec![candidate("X", Arc::new(TimeoutBackend))],
        vec![Arc::new(CountingScorer {
            calls: calls.clone(),
        })],
        RunContext::open(Arc::new(MemorySink::new())),
    );

    let report = run.execute(&dataset).await.unwrap();

    assert_eq!(report.records.len(), 3);
    for record in &report.records {
        assert!(matches!(
            &record.status,
            RecordStatus::Failed(reason) if reason.contains("timed out")
        ));
        assert!(record.metrics.is_empty());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.summaries[0].count_failed, 3);
    assert_eq!(report.summaries[0].count_ok, 0);
}

#[tokio::test]
async fn summary_is_independent_of_completion_order() {
    let examples: Vec<Example> = (0..6)
        .map(|index| {
            let input = format!("Example input number {index} {}", "x".repeat(index * 7));
            Example::new(format!("ex{index}"), input.clone())
                .with_reference(Reference::Single(input))
        })
        .collect();
    let dataset = Dataset::new("staggered", examples).unwrap();

    let sequential = EvaluationRun::new(
        RunConfig::new("Echo the text.").with_max_concurrent(1),
        vec![candidate("echo", Arc::new(StaggeredEchoBackend))],
        vec![Arc::new(RougeLScorer::new())],
        RunContext::open(Arc::new(MemorySink::new())),
    )
    .execute(&dataset)
    .await
    .unwrap();

    let interleaved = EvaluationRun::new(
        RunConfig::new("Echo the text.").with_max_concurrent(6),
        vec![candidate("echo", Arc::new(StaggeredEchoBackend))],
        vec![Arc::new(RougeLScorer::new())],
        RunContext::open(Arc::new(MemorySink::new())),
    )
    .execute(&dataset)
    .await
    .unwrap();

    assert_eq!(sequential.summaries, interleaved.summaries);

    // Records stay keyed to their examples regardless of completion order.
    for (a, b) in sequential.records.iter().zip(&interleaved.records) {
        assert_eq!(a.example_id, b.example_id);
        assert_eq!(a.output, b.output);
    }
}

#[tokio::test]
async fn circuit_breaker_stops_a_broken_model() {
    let examples: Vec<Example> = (0..5)
        .map(|index| Example::new(format!("ex{index}"), "input"))
        .collect();
    let dataset = Dataset::new("breaker", examples).unwrap();

    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text.")
            .with_max_concurrent(1)
            .with_max_consecutive_failures(2),
        vec![candidate("broken", Arc::new(TimeoutBackend))],
        vec![],
        RunContext::open(Arc::new(MemorySink::new())),
    );

    let report = run.execute(&dataset).await.unwrap();

    let summary = &report.summaries[0];
    assert_eq!(summary.count_failed, 2);
    assert_eq!(summary.count_skipped, 3);
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn ok_records_carry_one_outcome_per_scorer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text."),
        vec![candidate(
            "stub",
            Arc::new(FixedBackend {
                output: "A cat is sitting on the mat.",
            }),
        )],
        vec![
            Arc::new(RougeLScorer::new()),
            Arc::new(BrokenScorer),
            Arc::new(CountingScorer {
                calls: calls.clone(),
            }),
        ],
        RunContext::open(Arc::new(MemorySink::new())),
    );

    let report = run.execute(&cat_mat_dataset()).await.unwrap();

    let record = &report.records[0];
    assert!(record.is_ok());
    assert_eq!(record.metrics.len(), 3);
    assert!(record.metrics["rouge_l"].is_scored());
    assert!(!record.metrics["broken"].is_scored());
    assert!(record.metrics["counting"].is_scored());

    let summary = &report.summaries[0];
    assert_eq!(summary.count_ok, 1);
    assert_eq!(summary.count_partial, 1);
}

#[tokio::test]
async fn duplicate_candidate_names_are_rejected_before_any_call() {
    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text."),
        vec![
            candidate("same", Arc::new(TimeoutBackend)),
            candidate("same", Arc::new(TimeoutBackend)),
        ],
        vec![],
        RunContext::open(Arc::new(MemorySink::new())),
    );

    let result = run.execute(&cat_mat_dataset()).await;
    assert!(matches!(
        result,
        Err(EvalRunError::DuplicateCandidate(name)) if name == "same"
    ));
}

#[tokio::test]
async fn feedback_attaches_to_recorded_call_ids() {
    let run = EvaluationRun::new(
        RunConfig::new("Summarize the text."),
        vec![candidate(
            "stub",
            Arc::new(FixedBackend {
                output: "A cat is sitting on the mat.",
            }),
        )],
        vec![Arc::new(RougeLScorer::new())],
        RunContext::open(Arc::new(MemorySink::new())),
    );

    let report = run.execute(&cat_mat_dataset()).await.unwrap();
    let call_id = report.records[0].id.clone();

    let store = FeedbackStore::new();
    store.register_records(report.records.iter());

    store
        .attach(&call_id, Some(Reaction::Positive), None)
        .unwrap();
    store
        .attach(&call_id, None, Some("tight phrasing".to_string()))
        .unwrap();

    let entries = store.feedback_for(&call_id);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reaction, Some(Reaction::Positive));
    assert_eq!(entries[1].note.as_deref(), Some("tight phrasing"));

    let result = store.attach("abc123", Some(Reaction::Negative), None);
    assert!(matches!(
        result,
        Err(FeedbackError::UnknownCall(id)) if id == "abc123"
    ));
    assert!(store.feedback_for("abc123").is_empty());
}

#[tokio::test]
async fn call_ids_stay_resolvable_through_the_trace_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let call_id = {
        let run = EvaluationRun::new(
            RunConfig::new("Summarize the text."),
            vec![candidate(
                "stub",
                Arc::new(FixedBackend {
                    output: "A cat is sitting on the mat.",
                }),
            )],
            vec![Arc::new(RougeLScorer::new())],
            RunContext::open(Arc::new(JsonlSink::open(&path).unwrap())),
        );
        let report = run.execute(&cat_mat_dataset()).await.unwrap();
        report.records[0].id.clone()
    };

    // A later process replays the log to make old call ids attachable again.
    let store = FeedbackStore::new();
    for event in JsonlSink::replay(&path).unwrap() {
        store.register_call(&event.call_id);
    }

    store
        .attach(&call_id, Some(Reaction::Negative), Some("too terse".into()))
        .unwrap();
    assert_eq!(store.feedback_for(&call_id).len(), 1);
}
