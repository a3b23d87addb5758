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

//! Summarybench CLI
//!
//! Command-line interface for running evaluations, re-rendering reports from
//! trace logs, and attaching feedback to recorded calls.

mod report;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summarybench_core::{
    Dataset, EvaluationSummary, Example, FeedbackStore, InvocationRecord, JsonlSink, Reaction,
    Reference,
};
use summarybench_evals::{EvaluationRun, RunContext};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "summarybench")]
#[command(about = "Summarybench - multi-model summarization evaluation", long_about = None)]
struct Cli {
    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every configured candidate over a dataset
    Run {
        /// JSON Lines dataset, one {id?, input, reference?} record per line
        dataset: PathBuf,

        /// TOML run settings
        #[arg(short, long)]
        settings: PathBuf,

        /// Trace log receiving one event per invocation
        #[arg(long, default_value = "./summarybench-trace.jsonl")]
        trace_log: PathBuf,
    },

    /// Re-render a report from a trace log
    Report {
        /// Trace log written by a previous run
        trace_log: PathBuf,
    },

    /// Attach or list feedback against recorded call ids
    Feedback {
        /// Trace log used to resolve call ids
        #[arg(long, default_value = "./summarybench-trace.jsonl")]
        trace_log: PathBuf,

        /// Append-only feedback journal
        #[arg(long, default_value = "./summarybench-feedback.jsonl")]
        journal: PathBuf,

        #[command(subcommand)]
        command: FeedbackCommands,
    },
}

#[derive(Subcommand)]
enum FeedbackCommands {
    /// Append one feedback entry to a recorded call
    Add {
        /// Call id from a record or trace event
        call_id: String,

        /// Positive reaction
        #[arg(long, conflicts_with = "negative")]
        positive: bool,

        /// Negative reaction
        #[arg(long)]
        negative: bool,

        /// Free-text note
        #[arg(long)]
        note: Option<String>,
    },

    /// List a call's feedback in append order
    List {
        call_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Run {
            dataset,
            settings,
            trace_log,
        } => run_evaluation(&dataset, &settings, &trace_log, cli.json).await,
        Commands::Report { trace_log } => render_from_trace(&trace_log, cli.json),
        Commands::Feedback {
            trace_log,
            journal,
            command,
        } => handle_feedback(command, &trace_log, &journal, cli.json),
    }
}

async fn run_evaluation(
    dataset_path: &Path,
    settings_path: &Path,
    trace_log: &Path,
    json: bool,
) -> Result<()> {
    let settings = settings::Settings::load(settings_path)?;
    let dataset = load_dataset(dataset_path)?;

    info!(
        dataset = %dataset.name(),
        examples = dataset.len(),
        candidates = settings.candidates.len(),
        "starting evaluation"
    );

    let sink = Arc::new(
        JsonlSink::open(trace_log)
            .with_context(|| format!("failed to open trace log {}", trace_log.display()))?,
    );
    let run = EvaluationRun::new(
        settings.run_config(),
        settings.candidates()?,
        settings.scorers()?,
        RunContext::open(sink),
    );

    let report = run.execute(&dataset).await?;
    run.finish();

    report::print_summaries(&report.run_id, &report.summaries, json)?;
    if !json {
        println!("trace log: {}", trace_log.display());
    }
    Ok(())
}

fn render_from_trace(trace_log: &Path, json: bool) -> Result<()> {
    let events = JsonlSink::replay(trace_log)
        .with_context(|| format!("failed to read trace log {}", trace_log.display()))?;
    anyhow::ensure!(!events.is_empty(), "trace log holds no events");

    let run_id = events[0].run_id.clone();
    let records: Vec<InvocationRecord> =
        events.into_iter().map(|event| event.into_record()).collect();

    // Group per model, preserving first-seen order. A replayed log carries no
    // dataset, so each model's total is its distinct example count.
    let mut order: Vec<String> = Vec::new();
    let mut by_model: BTreeMap<String, Vec<&InvocationRecord>> = BTreeMap::new();
    for record in &records {
        if !by_model.contains_key(&record.model_name) {
            order.push(record.model_name.clone());
        }
        by_model
            .entry(record.model_name.clone())
            .or_default()
            .push(record);
    }

    let summaries: Vec<EvaluationSummary> = order
        .iter()
        .map(|model| {
            let model_records = &by_model[model];
            EvaluationSummary::from_records(
                model,
                model_records.len(),
                model_records.iter().copied(),
            )
        })
        .collect();

    report::print_summaries(&run_id, &summaries, json)
}

fn handle_feedback(
    command: FeedbackCommands,
    trace_log: &Path,
    journal: &Path,
    json: bool,
) -> Result<()> {
    let store = FeedbackStore::with_journal(journal)
        .with_context(|| format!("failed to open feedback journal {}", journal.display()))?;

    // Call ids come from the trace log, so feedback stays attachable across
    // process restarts.
    if trace_log.exists() {
        for event in JsonlSink::replay(trace_log)? {
            store.register_call(&event.call_id);
        }
    }

    match command {
        FeedbackCommands::Add {
            call_id,
            positive,
            negative,
            note,
        } => {
            let reaction = if positive {
                Some(Reaction::Positive)
            } else if negative {
                Some(Reaction::Negative)
            } else {
                None
            };

            let entry = store
                .attach(&call_id, reaction, note)
                .with_context(|| format!("failed to attach feedback to call {call_id}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("✓ feedback recorded for call {call_id}");
            }
        }

        FeedbackCommands::List { call_id } => {
            let entries = store.feedback_for(&call_id);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("no feedback for call {call_id}");
            } else {
                for entry in entries {
                    let reaction = match entry.reaction {
                        Some(Reaction::Positive) => "+1",
                        Some(Reaction::Negative) => "-1",
                        None => "  ",
                    };
                    println!(
                        "{}  {}  {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        reaction,
                        entry.note.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }

    Ok(())
}

/// One JSON Lines dataset record. Records without an id get their line index.
#[derive(Debug, Deserialize)]
struct RawExample {
    id: Option<String>,
    input: String,

    #[serde(default)]
    reference: Option<Reference>,
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;

    let mut examples = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawExample = serde_json::from_str(line)
            .with_context(|| format!("bad dataset record on line {}", index + 1))?;

        let mut example = Example::new(
            raw.id.unwrap_or_else(|| index.to_string()),
            raw.input,
        );
        example.reference = raw.reference;
        examples.push(example);
    }

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("dataset");
    Ok(Dataset::new(name, examples)?)
}
