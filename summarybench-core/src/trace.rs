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

//! Trace sinks: structured per-record events for external recording.
//!
//! The evaluation engine emits one [`TraceEvent`] per invocation record to a
//! [`TraceSink`]. The sink is a collaborator contract, not a storage format:
//! the built-in [`JsonlSink`] appends JSON lines to a file (and can replay
//! them, so call ids stay resolvable for feedback across process restarts),
//! [`MemorySink`] collects events for tests, and [`NullSink`] discards them.

use crate::record::{InvocationRecord, RecordStatus, ScorerOutcome};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// One structured event per invocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub run_id: String,

    /// The record's id, the stable handle feedback attaches to
    pub call_id: String,

    pub model_name: String,
    pub example_id: String,
    pub input: String,
    pub output: Option<String>,
    pub metrics: HashMap<String, ScorerOutcome>,
    pub status: RecordStatus,
    pub timestamp: DateTime<Utc>,
}

impl TraceEvent {
    pub fn from_record(record: &InvocationRecord) -> Self {
        Self {
            run_id: record.run_id.clone(),
            call_id: record.id.clone(),
            model_name: record.model_name.clone(),
            example_id: record.example_id.clone(),
            input: record.input.clone(),
            output: record.output.clone(),
            metrics: record.metrics.clone(),
            status: record.status.clone(),
            timestamp: record.timestamp,
        }
    }

    /// Rebuild the record a replayed event was emitted for.
    pub fn into_record(self) -> InvocationRecord {
        InvocationRecord {
            id: self.call_id,
            run_id: self.run_id,
            model_name: self.model_name,
            example_id: self.example_id,
            input: self.input,
            output: self.output,
            metrics: self.metrics,
            status: self.status,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Error)]
pub enum TraceSinkError {
    #[error("trace sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace sink serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for per-record trace events.
///
/// Implementations must tolerate concurrent callers; the run emits events as
/// completions arrive, in no particular order.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: &TraceEvent) -> Result<(), TraceSinkError>;
}

/// Appends one JSON line per event to a file.
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Open (or create) a trace log for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceSinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Read every event back from a trace log, in append order.
    ///
    /// Used to re-render reports and to re-register call ids with a feedback
    /// store after a restart.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<TraceEvent>, TraceSinkError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}

impl TraceSink for JsonlSink {
    fn record(&self, event: &TraceEvent) -> Result<(), TraceSinkError> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

/// Collects events in memory. Test double for the sink contract.
#[derive(Default)]
pub struct MemorySink {
    events: RwLock<Vec<TraceEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl TraceSink for MemorySink {
    fn record(&self, event: &TraceEvent) -> Result<(), TraceSinkError> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

/// Discards every event.
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&self, _event: &TraceEvent) -> Result<(), TraceSinkError> {
        Ok(())
    }
}
