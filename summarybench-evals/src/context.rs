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

//! Explicit per-run context: run id plus trace sink.
//!
//! There is no ambient global session. Every [`crate::run::EvaluationRun`]
//! owns one `RunContext` with an explicit `open`/`close` lifecycle, so
//! multiple runs can execute independently in the same process.

use std::sync::Arc;
use summarybench_core::{InvocationRecord, TraceEvent, TraceSink};
use tracing::{debug, warn};
use uuid::Uuid;

/// Carries a run's identity and its trace sink.
pub struct RunContext {
    run_id: String,
    sink: Arc<dyn TraceSink>,
}

impl RunContext {
    /// Open a context with a fresh run id.
    pub fn open(sink: Arc<dyn TraceSink>) -> Self {
        let run_id = Uuid::new_v4().to_string();
        debug!(run_id = %run_id, "run context opened");
        Self { run_id, sink }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit one trace event for a completed record.
    ///
    /// Recording is a collaborator concern: sink errors are logged and never
    /// abort the run.
    pub fn emit(&self, record: &InvocationRecord) {
        if let Err(err) = self.sink.record(&TraceEvent::from_record(record)) {
            warn!(
                call_id = %record.id,
                error = %err,
                "trace sink rejected event"
            );
        }
    }

    /// End the context's lifecycle.
    pub fn close(self) {
        debug!(run_id = %self.run_id, "run context closed");
    }
}
