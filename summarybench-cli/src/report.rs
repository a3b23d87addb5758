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

//! Report rendering.
//!
//! Scored, generation-failed, partially-scored and skipped counts stay
//! separate columns; they are never collapsed into one pass/fail signal.

use anyhow::Result;
use summarybench_core::EvaluationSummary;

pub fn print_summaries(run_id: &str, summaries: &[EvaluationSummary], json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({
            "run_id": run_id,
            "summaries": summaries,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("run {run_id}");
    println!();
    for summary in summaries {
        let marker = if summary.count_failed == 0 && summary.count_skipped == 0 {
            "✓"
        } else {
            "✗"
        };
        println!("{marker} {}", summary.model_name);
        println!(
            "    scored ok:         {}/{}",
            summary.count_ok, summary.examples_total
        );
        println!("    generation failed: {}", summary.count_failed);
        println!("    partially scored:  {}", summary.count_partial);
        println!("    skipped:           {}", summary.count_skipped);

        for (metric, stats) in &summary.metrics {
            println!(
                "    {metric:<36} mean {:>7.3}  min {:>7.3}  max {:>7.3}  n={} missing={}",
                stats.mean, stats.min, stats.max, stats.count, stats.missing
            );
        }
        println!();
    }

    Ok(())
}
