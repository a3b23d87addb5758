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

//! Evaluation datasets: ordered, immutable example collections.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Reference output(s) for an example.
///
/// Deserializes from either a single string or a list of strings, so dataset
/// records may carry one golden answer or several acceptable ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Single(String),
    Many(Vec<String>),
}

impl Reference {
    /// All reference texts, in dataset order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Reference::Single(text) => vec![text.as_str()],
            Reference::Many(texts) => texts.iter().map(String::as_str).collect(),
        }
    }

    pub fn primary(&self) -> Option<&str> {
        self.texts().into_iter().next()
    }
}

/// One dataset record to be summarized and evaluated.
///
/// Examples are immutable once loaded into a [`Dataset`]; scoring never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Unique identifier within the dataset
    pub id: String,

    /// Source text handed to the summarizing agent
    pub input: String,

    /// Optional golden output(s) for reference-based scorers
    #[serde(default)]
    pub reference: Option<Reference>,
}

impl Example {
    pub fn new(id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Errors raised while constructing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Two examples share an id; the run must not start on ambiguous keys.
    #[error("duplicate example id: {id}")]
    DuplicateExampleId { id: String },
}

/// An ordered, immutable collection of examples with unique ids.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    examples: Vec<Example>,
}

impl Dataset {
    /// Build a dataset, failing if any example id repeats.
    pub fn new(name: impl Into<String>, examples: Vec<Example>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for example in &examples {
            if !seen.insert(example.id.as_str()) {
                return Err(DatasetError::DuplicateExampleId {
                    id: example.id.clone(),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            examples,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn get(&self, id: &str) -> Option<&Example> {
        self.examples.iter().find(|example| example.id == id)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}
