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

//! Invocation records: the durable trace of one generation attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Type-safe metric values produced by scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
}

impl MetricValue {
    /// Numeric view used by summary aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Float(value) => Some(*value),
            MetricValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }
}

/// Outcome of one scorer against one (model, example) pair.
///
/// A failed scorer degrades only its own slot; the record stays `Ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScorerOutcome {
    Scored(HashMap<String, MetricValue>),
    Failed(String),
}

impl ScorerOutcome {
    pub fn is_scored(&self) -> bool {
        matches!(self, ScorerOutcome::Scored(_))
    }

    pub fn metrics(&self) -> Option<&HashMap<String, MetricValue>> {
        match self {
            ScorerOutcome::Scored(metrics) => Some(metrics),
            ScorerOutcome::Failed(_) => None,
        }
    }
}

/// Whether the generation attempt behind a record succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    Failed(String),
}

impl RecordStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, RecordStatus::Ok)
    }
}

/// Durable trace of one generation attempt plus its scores.
///
/// Created exactly once per (model, example) attempt. The metrics map carries
/// one [`ScorerOutcome`] per configured scorer; on generation failure it stays
/// empty and `status` carries the reason. The record id is the call id that
/// feedback attaches to later, stable across process restarts once the record
/// has been emitted to a trace sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Call identifier (UUID v4), the feedback handle for this attempt
    pub id: String,

    /// Run this record belongs to
    pub run_id: String,

    pub model_name: String,
    pub example_id: String,

    /// Input handed to the agent, copied for provenance
    pub input: String,

    /// Generated output; `None` when generation failed
    pub output: Option<String>,

    /// One outcome per configured scorer, keyed by scorer name
    pub metrics: HashMap<String, ScorerOutcome>,

    pub status: RecordStatus,
    pub timestamp: DateTime<Utc>,
}

impl InvocationRecord {
    /// Record for a successful generation, before scorer outcomes attach.
    pub fn succeeded(
        run_id: &str,
        model_name: &str,
        example_id: &str,
        input: &str,
        output: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            model_name: model_name.to_string(),
            example_id: example_id.to_string(),
            input: input.to_string(),
            output: Some(output),
            metrics: HashMap::new(),
            status: RecordStatus::Ok,
            timestamp: Utc::now(),
        }
    }

    /// Record for a failed generation attempt. Scoring is skipped entirely.
    pub fn failed(
        run_id: &str,
        model_name: &str,
        example_id: &str,
        input: &str,
        reason: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            model_name: model_name.to_string(),
            example_id: example_id.to_string(),
            input: input.to_string(),
            output: None,
            metrics: HashMap::new(),
            status: RecordStatus::Failed(reason),
            timestamp: Utc::now(),
        }
    }

    pub fn attach_outcome(&mut self, scorer_name: &str, outcome: ScorerOutcome) {
        self.metrics.insert(scorer_name.to_string(), outcome);
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// True when at least one scorer slot holds a failure marker.
    pub fn has_missing_metrics(&self) -> bool {
        self.metrics.values().any(|outcome| !outcome.is_scored())
    }

    /// Look up one metric value through its scorer's outcome.
    pub fn metric(&self, scorer_name: &str, metric_name: &str) -> Option<&MetricValue> {
        self.metrics
            .get(scorer_name)
            .and_then(ScorerOutcome::metrics)
            .and_then(|metrics| metrics.get(metric_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_value_serialization() {
        let value = MetricValue::Float(0.85);
        assert_eq!(serde_json::to_string(&value).unwrap(), "0.85");

        let value = MetricValue::Bool(true);
        assert_eq!(serde_json::to_string(&value).unwrap(), "true");
    }

    #[test]
    fn successful_record_collects_outcomes() {
        let mut record =
            InvocationRecord::succeeded("run-1", "gpt-test", "ex1", "input text", "output".into());

        record.attach_outcome(
            "rouge_l",
            ScorerOutcome::Scored(HashMap::from([(
                "rouge_l_fmeasure".to_string(),
                MetricValue::Float(0.9),
            )])),
        );
        record.attach_outcome("judge", ScorerOutcome::Failed("judge unreachable".into()));

        assert!(record.is_ok());
        assert!(record.has_missing_metrics());
        assert_eq!(
            record.metric("rouge_l", "rouge_l_fmeasure"),
            Some(&MetricValue::Float(0.9))
        );
        assert_eq!(record.metric("judge", "anything"), None);
    }

    #[test]
    fn failed_record_has_no_output() {
        let record = InvocationRecord::failed(
            "run-1",
            "gpt-test",
            "ex1",
            "input text",
            "backend request timed out".into(),
        );

        assert!(!record.is_ok());
        assert_eq!(record.output, None);
        assert!(record.metrics.is_empty());
    }

    #[test]
    fn record_ids_are_unique() {
        let a = InvocationRecord::succeeded("run-1", "m", "ex1", "in", "out".into());
        let b = InvocationRecord::succeeded("run-1", "m", "ex2", "in", "out".into());
        assert_ne!(a.id, b.id);
    }
}
