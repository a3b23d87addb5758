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

//! TOML run settings: candidates, judge, scorers, limits.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use summarybench_evals::scorers::{HallucinationScorer, RougeLScorer, SummaryQualityScorer};
use summarybench_evals::{RunConfig, Scorer};
use summarybench_models::{
    AnthropicBackend, CandidateModel, GenerationBackend, GenerationConfig, OpenAiBackend,
};

/// Which provider client a model talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openai,
    Anthropic,
}

impl Provider {
    /// Build the provider's backend, reading its API key from the
    /// environment.
    fn backend(self) -> Result<Arc<dyn GenerationBackend>> {
        Ok(match self {
            Provider::Openai => {
                let key = std::env::var("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY is not set")?;
                Arc::new(OpenAiBackend::new(key))
            }
            Provider::Anthropic => {
                let key = std::env::var("ANTHROPIC_API_KEY")
                    .context("ANTHROPIC_API_KEY is not set")?;
                Arc::new(AnthropicBackend::new(key))
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSettings {
    pub name: String,
    pub provider: Provider,
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeSettings {
    pub provider: Provider,
    pub model: String,
}

/// Which built-in scorers a run enables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScorerSettings {
    pub rouge_l: bool,
    pub hallucination: bool,
    pub summary_quality: bool,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            rouge_l: true,
            hallucination: false,
            summary_quality: false,
        }
    }
}

/// One run's declarative settings, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub system_prompt: String,
    pub candidates: Vec<CandidateSettings>,

    /// Judge model for model-graded scorers; required when any is enabled
    pub judge: Option<JudgeSettings>,

    #[serde(default)]
    pub scorers: ScorerSettings,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: usize,
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_consecutive_failures() -> usize {
    5
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Settings = toml::from_str(&text)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;

        if settings.candidates.is_empty() {
            bail!("settings declare no candidates");
        }
        Ok(settings)
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.system_prompt.clone())
            .with_max_concurrent(self.max_concurrent)
            .with_max_consecutive_failures(self.max_consecutive_failures)
    }

    /// Build every configured candidate against its provider backend.
    pub fn candidates(&self) -> Result<Vec<CandidateModel>> {
        self.candidates
            .iter()
            .map(|candidate| {
                Ok(CandidateModel::new(
                    candidate.name.clone(),
                    GenerationConfig::new(
                        candidate.model.clone(),
                        candidate.temperature,
                        candidate.max_tokens,
                    ),
                    candidate.provider.backend()?,
                ))
            })
            .collect()
    }

    /// Build the enabled scorer set.
    pub fn scorers(&self) -> Result<Vec<Arc<dyn Scorer>>> {
        let mut scorers: Vec<Arc<dyn Scorer>> = Vec::new();

        if self.scorers.rouge_l {
            scorers.push(Arc::new(RougeLScorer::new()));
        }

        if self.scorers.hallucination || self.scorers.summary_quality {
            let judge_settings = self
                .judge
                .as_ref()
                .context("model-graded scorers are enabled but no [judge] is configured")?;
            let judge = CandidateModel::new(
                "judge",
                GenerationConfig::new(judge_settings.model.clone(), 0.0, 1024),
                judge_settings.provider.backend()?,
            );

            if self.scorers.hallucination {
                scorers.push(Arc::new(HallucinationScorer::new(judge.clone())));
            }
            if self.scorers.summary_quality {
                scorers.push(Arc::new(SummaryQualityScorer::new(judge)));
            }
        }

        if scorers.is_empty() {
            bail!("settings enable no scorers");
        }
        Ok(scorers)
    }
}
