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

//! # Summarybench Core
//!
//! Shared data model for the Summarybench evaluation harness:
//!
//! - **Datasets**: immutable, ordered collections of examples with unique ids
//! - **Invocation records**: one durable trace per (model, example) attempt,
//!   carrying the output and one scorer outcome per configured scorer
//! - **Summaries**: per-model aggregates recomputed from records
//! - **Trace sinks**: structured per-record events for external recording
//! - **Feedback**: append-only human reactions/notes keyed by call id
//!
//! ## Example
//!
//! ```rust,ignore
//! use summarybench_core::{Dataset, Example, FeedbackStore, Reaction};
//!
//! let dataset = Dataset::new(
//!     "smoke",
//!     vec![Example::new("ex1", "The cat sat on the mat.")],
//! )?;
//!
//! let store = FeedbackStore::new();
//! store.register_call("2f6b...");
//! store.attach("2f6b...", Some(Reaction::Positive), Some("good summary".into()))?;
//! ```

pub mod dataset;
pub mod feedback;
pub mod record;
pub mod summary;
pub mod trace;

pub use dataset::{Dataset, DatasetError, Example, Reference};
pub use feedback::{FeedbackEntry, FeedbackError, FeedbackStore, Reaction};
pub use record::{InvocationRecord, MetricValue, RecordStatus, ScorerOutcome};
pub use summary::{EvaluationSummary, MetricStats};
pub use trace::{JsonlSink, MemorySink, NullSink, TraceEvent, TraceSink, TraceSinkError};
