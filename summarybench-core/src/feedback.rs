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

//! Append-only human feedback keyed by call id.

use crate::record::InvocationRecord;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Human reaction attached to a recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Positive,
    Negative,
}

/// One feedback entry. Entries are history, never overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub call_id: String,
    pub reaction: Option<Reaction>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    /// The call id does not resolve to any recorded invocation.
    #[error("unknown call id: {0}")]
    UnknownCall(String),

    #[error("feedback journal error: {0}")]
    Journal(#[from] std::io::Error),
}

/// Append-only store of feedback entries against recorded call ids.
///
/// A call id must be registered (from a run's records, or replayed from a
/// trace log) before feedback can attach to it; dangling references are a
/// usage error, not silently ignored. With a journal configured, every entry
/// is appended as one JSON line and replayed the next time the store opens,
/// making the audit trail durable across process restarts.
pub struct FeedbackStore {
    known_calls: RwLock<HashSet<String>>,
    entries: RwLock<HashMap<String, Vec<FeedbackEntry>>>,
    journal: Option<Mutex<BufWriter<File>>>,
}

impl FeedbackStore {
    /// In-memory store with no journal.
    pub fn new() -> Self {
        Self {
            known_calls: RwLock::new(HashSet::new()),
            entries: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    /// Store backed by an append-only JSON Lines journal.
    ///
    /// Existing entries are replayed; their call ids count as known.
    pub fn with_journal(path: impl AsRef<Path>) -> Result<Self, FeedbackError> {
        let path = path.as_ref();
        let mut known_calls = HashSet::new();
        let mut entries: HashMap<String, Vec<FeedbackEntry>> = HashMap::new();

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: FeedbackEntry = serde_json::from_str(&line).map_err(|err| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
                })?;
                known_calls.insert(entry.call_id.clone());
                entries.entry(entry.call_id.clone()).or_default().push(entry);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            known_calls: RwLock::new(known_calls),
            entries: RwLock::new(entries),
            journal: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Make a call id eligible for feedback.
    pub fn register_call(&self, call_id: &str) {
        self.known_calls.write().insert(call_id.to_string());
    }

    /// Register every call id from a run's records.
    pub fn register_records<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a InvocationRecord>,
    {
        let mut known = self.known_calls.write();
        for record in records {
            known.insert(record.id.clone());
        }
    }

    pub fn is_known(&self, call_id: &str) -> bool {
        self.known_calls.read().contains(call_id)
    }

    /// Append one feedback entry against a recorded call.
    ///
    /// Fails with [`FeedbackError::UnknownCall`] before anything is stored
    /// when the id does not resolve.
    pub fn attach(
        &self,
        call_id: &str,
        reaction: Option<Reaction>,
        note: Option<String>,
    ) -> Result<FeedbackEntry, FeedbackError> {
        if !self.is_known(call_id) {
            return Err(FeedbackError::UnknownCall(call_id.to_string()));
        }

        let entry = FeedbackEntry {
            call_id: call_id.to_string(),
            reaction,
            note,
            timestamp: Utc::now(),
        };

        if let Some(journal) = &self.journal {
            let line = serde_json::to_string(&entry)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            let mut writer = journal.lock();
            writeln!(writer, "{line}")?;
            writer.flush()?;
        }

        self.entries
            .write()
            .entry(entry.call_id.clone())
            .or_default()
            .push(entry.clone());

        Ok(entry)
    }

    /// All feedback for a call, in append order.
    pub fn feedback_for(&self, call_id: &str) -> Vec<FeedbackEntry> {
        self.entries
            .read()
            .get(call_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}
