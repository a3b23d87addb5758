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

//! # Summarybench Evals
//!
//! Scoring and orchestration for the evaluation harness:
//!
//! - **Scorer contract**: pluggable metric computation over
//!   (input, reference, output). Built-ins cover deterministic reference
//!   overlap ([`scorers::RougeLScorer`]) and judge-graded checks
//!   ([`scorers::HallucinationScorer`], [`scorers::SummaryQualityScorer`]).
//! - **Run orchestration**: [`run::EvaluationRun`] fans out every candidate
//!   over every dataset example with bounded concurrency, records one
//!   invocation per (model, example) pair, and aggregates per-model
//!   summaries.
//!
//! ## Example
//!
//! ```rust,ignore
//! use summarybench_evals::run::{EvaluationRun, RunConfig};
//! use summarybench_evals::context::RunContext;
//! use summarybench_evals::scorers::RougeLScorer;
//! use std::sync::Arc;
//!
//! let context = RunContext::open(Arc::new(sink));
//! let run = EvaluationRun::new(config, candidates, vec![Arc::new(RougeLScorer::new())], context);
//! let report = run.execute(&dataset).await?;
//! for summary in &report.summaries {
//!     println!("{summary}");
//! }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use summarybench_core::{MetricValue, Reference};
use thiserror::Error;

pub mod context;
pub mod run;
pub mod scorers;

pub use context::RunContext;
pub use run::{EvalRunError, EvaluationRun, RunConfig, RunReport};

/// What a scorer sees for one (model, example) pair.
///
/// Borrowed views only: scoring never mutates the dataset or the record.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    /// The example's source text
    pub input: &'a str,

    /// Golden output(s), when the example carries them
    pub reference: Option<&'a Reference>,

    /// The candidate's generated output
    pub output: &'a str,
}

/// Why one scorer could not produce a result for one pair.
///
/// A scorer failure degrades that scorer's slot in the record's metrics map;
/// it never aborts the record or the run.
#[derive(Debug, Error)]
pub enum ScorerFailure {
    #[error("example has no reference output")]
    MissingReference,

    #[error("judge call failed: {0}")]
    Judge(String),

    #[error("unparseable judge verdict: {0}")]
    MalformedVerdict(String),
}

/// Pluggable metric computation over (input, reference, output).
///
/// Implementations must be pure with respect to the run's state: no shared
/// mutable state between parallel invocations. Model-graded scorers call out
/// to a judge model and may suspend.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Key for this scorer's slot in a record's metrics map.
    fn name(&self) -> &str;

    async fn score(
        &self,
        input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure>;
}
