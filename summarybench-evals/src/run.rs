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

//! Run orchestration: candidates × examples × scorers.

use crate::context::RunContext;
use crate::{ScoreInput, Scorer};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use summarybench_core::{Dataset, EvaluationSummary, Example, InvocationRecord, ScorerOutcome};
use summarybench_models::{CandidateModel, SummarizingAgent};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EvalRunError {
    /// Records are keyed (model_name, example_id); a repeated candidate name
    /// would break the write-once key invariant.
    #[error("duplicate candidate name: {0}")]
    DuplicateCandidate(String),
}

/// Configuration for one evaluation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// System instruction shared by every candidate's agent
    pub system_prompt: String,

    /// Upper bound on in-flight generation calls per model sweep
    pub max_concurrent: usize,

    /// Consecutive generation failures before a model's circuit opens.
    /// Zero disables the breaker.
    pub max_consecutive_failures: usize,
}

impl RunConfig {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_concurrent: 4,
            max_consecutive_failures: 5,
        }
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    #[must_use]
    pub fn with_max_consecutive_failures(mut self, threshold: usize) -> Self {
        self.max_consecutive_failures = threshold;
        self
    }
}

/// Trips after a configured number of consecutive generation failures.
///
/// A tripped breaker stops the sweep from issuing further requests for that
/// model; already recorded results stand.
struct CircuitBreaker {
    threshold: usize,
    consecutive: AtomicUsize,
    open: AtomicBool,
}

impl CircuitBreaker {
    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            consecutive: AtomicUsize::new(0),
            open: AtomicBool::new(false),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn record_success(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        let consecutive = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        if self.threshold > 0 && consecutive >= self.threshold {
            self.open.store(true, Ordering::SeqCst);
        }
    }
}

/// Outcome of one run: every record plus one summary per candidate.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,

    /// All records, in candidate configuration order then example-id order
    pub records: Vec<InvocationRecord>,

    /// One summary per candidate, in configuration order
    pub summaries: Vec<EvaluationSummary>,
}

/// Orchestrates {candidates} × {examples} × {scorers}.
///
/// Per candidate, predictions fan out with bounded concurrency; each
/// completion produces exactly one [`InvocationRecord`], keyed by
/// (model_name, example_id) and written exactly once, so out-of-order
/// completion cannot misalign an example and its scores. Scoring starts only
/// after its generation succeeded; a generation failure is recorded and
/// scoring skipped for that pair.
pub struct EvaluationRun {
    config: RunConfig,
    candidates: Vec<CandidateModel>,
    scorers: Vec<Arc<dyn Scorer>>,
    context: RunContext,
}

impl EvaluationRun {
    pub fn new(
        config: RunConfig,
        candidates: Vec<CandidateModel>,
        scorers: Vec<Arc<dyn Scorer>>,
        context: RunContext,
    ) -> Self {
        Self {
            config,
            candidates,
            scorers,
            context,
        }
    }

    pub fn run_id(&self) -> &str {
        self.context.run_id()
    }

    /// Close the run's context once its sweeps are done.
    pub fn finish(self) {
        self.context.close();
    }

    /// Sweep every candidate over the dataset.
    pub async fn execute(&self, dataset: &Dataset) -> Result<RunReport, EvalRunError> {
        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if !seen.insert(candidate.name()) {
                return Err(EvalRunError::DuplicateCandidate(
                    candidate.name().to_string(),
                ));
            }
        }

        let records: DashMap<(String, String), InvocationRecord> = DashMap::new();
        let mut summaries = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            info!(
                model = candidate.name(),
                examples = dataset.len(),
                max_concurrent = self.config.max_concurrent,
                "starting model sweep"
            );

            let agent = SummarizingAgent::new(candidate.clone(), &self.config.system_prompt);
            let breaker = CircuitBreaker::new(self.config.max_consecutive_failures);

            let outcomes: Vec<Option<bool>> = stream::iter(dataset.examples())
                .map(|example| {
                    let agent = &agent;
                    let breaker = &breaker;
                    let records = &records;
                    async move {
                        if breaker.is_open() {
                            return None;
                        }

                        let record = match agent.predict(&example.input).await {
                            Ok(output) => {
                                breaker.record_success();
                                self.score_pair(candidate.name(), example, output).await
                            }
                            Err(failure) => {
                                breaker.record_failure();
                                warn!(
                                    model = candidate.name(),
                                    example = %example.id,
                                    error = %failure,
                                    "generation failed"
                                );
                                InvocationRecord::failed(
                                    self.context.run_id(),
                                    candidate.name(),
                                    &example.id,
                                    &example.input,
                                    failure.to_string(),
                                )
                            }
                        };

                        let is_ok = record.is_ok();
                        self.context.emit(&record);
                        records
                            .entry((record.model_name.clone(), record.example_id.clone()))
                            .or_insert(record);
                        Some(is_ok)
                    }
                })
                .buffer_unordered(self.config.max_concurrent)
                .collect()
                .await;

            let attempted = outcomes.iter().flatten().count();
            let succeeded = outcomes.iter().flatten().filter(|ok| **ok).count();
            info!(
                model = candidate.name(),
                attempted,
                succeeded,
                skipped = dataset.len() - attempted,
                "model sweep complete"
            );

            let model_records: Vec<InvocationRecord> = records
                .iter()
                .filter(|entry| entry.key().0 == candidate.name())
                .map(|entry| entry.value().clone())
                .collect();
            summaries.push(EvaluationSummary::from_records(
                candidate.name(),
                dataset.len(),
                model_records.iter(),
            ));
        }

        let order: HashMap<&str, usize> = self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| (candidate.name(), index))
            .collect();
        let mut all_records: Vec<InvocationRecord> =
            records.into_iter().map(|(_, record)| record).collect();
        all_records.sort_by(|a, b| {
            let a_index = order.get(a.model_name.as_str()).copied().unwrap_or(0);
            let b_index = order.get(b.model_name.as_str()).copied().unwrap_or(0);
            a_index
                .cmp(&b_index)
                .then_with(|| a.example_id.cmp(&b.example_id))
        });

        Ok(RunReport {
            run_id: self.context.run_id().to_string(),
            records: all_records,
            summaries,
        })
    }

    /// Run every configured scorer for one successful generation.
    ///
    /// The record's metrics map gets one outcome per scorer, value or failure
    /// marker, never partial keys.
    async fn score_pair(
        &self,
        model_name: &str,
        example: &Example,
        output: String,
    ) -> InvocationRecord {
        let mut outcomes = Vec::with_capacity(self.scorers.len());
        for scorer in &self.scorers {
            let result = scorer
                .score(ScoreInput {
                    input: &example.input,
                    reference: example.reference.as_ref(),
                    output: &output,
                })
                .await;

            let outcome = match result {
                Ok(metrics) => ScorerOutcome::Scored(metrics),
                Err(failure) => {
                    warn!(
                        model = model_name,
                        example = %example.id,
                        scorer = scorer.name(),
                        error = %failure,
                        "scorer failed"
                    );
                    ScorerOutcome::Failed(failure.to_string())
                }
            };
            outcomes.push((scorer.name().to_string(), outcome));
        }

        let mut record = InvocationRecord::succeeded(
            self.context.run_id(),
            model_name,
            &example.id,
            &example.input,
            output,
        );
        for (name, outcome) in outcomes {
            record.attach_outcome(&name, outcome);
        }
        record
    }
}
