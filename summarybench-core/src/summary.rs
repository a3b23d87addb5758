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

//! Per-model aggregate statistics, recomputed from invocation records.

use crate::record::{InvocationRecord, ScorerOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate over one metric across a model's successful records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,

    /// Number of records contributing a value
    pub count: usize,

    /// Successful records where this metric is absent (scorer failed)
    pub missing: usize,
}

/// Per-model aggregate over one evaluation sweep.
///
/// Derived data: recomputed from records, never hand-edited. Failures never
/// silently shrink a denominator — `count_failed`, `count_skipped` and each
/// metric's `missing` count keep them visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub model_name: String,

    /// Examples in the dataset when the sweep started
    pub examples_total: usize,

    /// Records with a successful generation
    pub count_ok: usize,

    /// Records where generation failed
    pub count_failed: usize,

    /// Examples never attempted because the model's circuit opened
    pub count_skipped: usize,

    /// Successful records with at least one failed scorer slot
    pub count_partial: usize,

    /// Stats per metric, keyed `"scorer/metric"`
    pub metrics: BTreeMap<String, MetricStats>,
}

impl EvaluationSummary {
    /// Aggregate a model's records.
    ///
    /// Records are folded in example-id order, so the result is identical
    /// whatever order the concurrent sweep completed in. Only `Ok` records
    /// with a present numeric value contribute to a metric's statistics.
    pub fn from_records<'a, I>(model_name: &str, examples_total: usize, records: I) -> Self
    where
        I: IntoIterator<Item = &'a InvocationRecord>,
    {
        let mut records: Vec<&InvocationRecord> = records
            .into_iter()
            .filter(|record| record.model_name == model_name)
            .collect();
        records.sort_by(|a, b| a.example_id.cmp(&b.example_id));

        let count_ok = records.iter().filter(|r| r.is_ok()).count();
        let count_failed = records.len() - count_ok;
        let count_skipped = examples_total.saturating_sub(records.len());
        let count_partial = records
            .iter()
            .filter(|r| r.is_ok() && r.has_missing_metrics())
            .count();

        let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in records.iter().filter(|r| r.is_ok()) {
            for (scorer_name, outcome) in &record.metrics {
                let ScorerOutcome::Scored(metrics) = outcome else {
                    continue;
                };
                for (metric_name, value) in metrics {
                    if let Some(value) = value.as_f64() {
                        samples
                            .entry(format!("{scorer_name}/{metric_name}"))
                            .or_default()
                            .push(value);
                    }
                }
            }
        }

        let metrics = samples
            .into_iter()
            .map(|(name, values)| {
                let count = values.len();
                let mean = values.iter().sum::<f64>() / count as f64;
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let stats = MetricStats {
                    mean,
                    min,
                    max,
                    count,
                    missing: count_ok - count,
                };
                (name, stats)
            })
            .collect();

        Self {
            model_name: model_name.to_string(),
            examples_total,
            count_ok,
            count_failed,
            count_skipped,
            count_partial,
            metrics,
        }
    }
}

impl std::fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} scored, {} failed, {} skipped, {} partially scored",
            self.model_name,
            self.count_ok,
            self.examples_total,
            self.count_failed,
            self.count_skipped,
            self.count_partial
        )
    }
}
