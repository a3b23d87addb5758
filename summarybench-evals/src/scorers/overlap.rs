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

//! Deterministic reference-overlap scoring (ROUGE-L).

use crate::{ScoreInput, Scorer, ScorerFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use summarybench_core::MetricValue;

/// ROUGE-L over normalized strings.
///
/// Both strings are trimmed and lowercased before tokenization; tokens lose
/// edge punctuation and pass through a light suffix stemmer. The score is an
/// F-measure over longest-common-subsequence length against both token
/// counts. The normalization is fixed so scores stay comparable across runs.
/// With multiple references, the best-scoring reference wins.
pub struct RougeLScorer;

impl RougeLScorer {
    pub fn new() -> Self {
        Self
    }

    /// Precision, recall and F-measure for one (reference, candidate) pair.
    pub fn rouge_l(&self, reference: &str, candidate: &str) -> (f64, f64, f64) {
        let ref_tokens = tokenize(reference);
        let cand_tokens = tokenize(candidate);

        if ref_tokens.is_empty() || cand_tokens.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let lcs = lcs_length(&ref_tokens, &cand_tokens);
        let precision = lcs as f64 / cand_tokens.len() as f64;
        let recall = lcs as f64 / ref_tokens.len() as f64;
        let fmeasure = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        (precision, recall, fmeasure)
    }
}

impl Default for RougeLScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for RougeLScorer {
    fn name(&self) -> &str {
        "rouge_l"
    }

    async fn score(
        &self,
        input: ScoreInput<'_>,
    ) -> Result<HashMap<String, MetricValue>, ScorerFailure> {
        let reference = input.reference.ok_or(ScorerFailure::MissingReference)?;

        let (precision, recall, fmeasure) = reference
            .texts()
            .into_iter()
            .map(|text| self.rouge_l(text, input.output))
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .ok_or(ScorerFailure::MissingReference)?;

        Ok(HashMap::from([
            (
                "rouge_l_precision".to_string(),
                MetricValue::Float(precision),
            ),
            ("rouge_l_recall".to_string(), MetricValue::Float(recall)),
            ("rouge_l_fmeasure".to_string(), MetricValue::Float(fmeasure)),
        ]))
    }
}

/// Trim, lowercase, strip edge punctuation, stem.
fn tokenize(text: &str) -> Vec<String> {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(stem)
        .collect()
}

/// Light suffix stemmer so inflected forms line up ("sits"/"sitting" → "sit").
fn stem(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.len() > 5 && word.ends_with("ing") {
        return undouble(&word[..word.len() - 3]);
    }
    if word.len() > 4 && word.ends_with("ed") {
        return undouble(&word[..word.len() - 2]);
    }
    if word.len() > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Collapse a trailing doubled consonant left by suffix stripping.
fn undouble(stemmed: &str) -> String {
    let bytes = stemmed.as_bytes();
    if bytes.len() >= 2 {
        let last = bytes[bytes.len() - 1];
        if last == bytes[bytes.len() - 2] && last.is_ascii_alphabetic() && !b"aeiou".contains(&last)
        {
            return stemmed[..stemmed.len() - 1].to_string();
        }
    }
    stemmed.to_string()
}

/// LCS length via DP with the shorter sequence as the array dimension.
fn lcs_length(a: &[String], b: &[String]) -> usize {
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for i in 1..=long.len() {
        for j in 1..=short.len() {
            curr[j] = if long[i - 1] == short[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use summarybench_core::Reference;

    #[test]
    fn identical_strings_score_one() {
        let scorer = RougeLScorer::new();
        let (p, r, f) = scorer.rouge_l("The quick brown fox", "The quick brown fox");

        assert!((p - 1.0).abs() < 1e-9);
        assert!((r - 1.0).abs() < 1e-9);
        assert!((f - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stemming_lines_up_inflected_forms() {
        assert_eq!(stem("sits"), "sit");
        assert_eq!(stem("sitting"), "sit");
        assert_eq!(stem("jumped"), "jump");
        assert_eq!(stem("stopped"), "stop");
        assert_eq!(stem("stories"), "story");
        assert_eq!(stem("class"), "class");
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("the"), "the");
    }

    #[test]
    fn normalization_ignores_case_and_edge_punctuation() {
        let scorer = RougeLScorer::new();
        let (_, _, upper) = scorer.rouge_l("A CAT SITS ON A MAT.", "a cat sits on a mat");
        assert!((upper - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = RougeLScorer::new();
        let first = scorer.rouge_l("A cat sits on a mat.", "A cat is sitting on the mat.");
        let second = scorer.rouge_l("A cat sits on a mat.", "A cat is sitting on the mat.");
        assert_eq!(first, second);
    }

    #[test]
    fn paraphrased_summary_clears_the_bar() {
        let scorer = RougeLScorer::new();
        let (_, _, fmeasure) =
            scorer.rouge_l("A cat sits on a mat.", "A cat is sitting on the mat.");
        assert!(fmeasure > 0.7, "fmeasure was {fmeasure}");
    }

    #[test]
    fn empty_candidate_scores_zero() {
        let scorer = RougeLScorer::new();
        let (p, r, f) = scorer.rouge_l("A cat sits on a mat.", "");
        assert_eq!((p, r, f), (0.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn best_reference_wins() {
        let scorer = RougeLScorer::new();
        let reference = Reference::Many(vec![
            "Completely unrelated text about weather patterns.".to_string(),
            "A cat sits on a mat.".to_string(),
        ]);

        let metrics = scorer
            .score(ScoreInput {
                input: "The cat sat on the mat.",
                reference: Some(&reference),
                output: "A cat is sitting on the mat.",
            })
            .await
            .unwrap();

        let MetricValue::Float(fmeasure) = metrics["rouge_l_fmeasure"] else {
            panic!("fmeasure should be a float");
        };
        assert!(fmeasure > 0.7);
    }

    #[tokio::test]
    async fn missing_reference_is_a_scorer_failure() {
        let scorer = RougeLScorer::new();
        let result = scorer
            .score(ScoreInput {
                input: "source",
                reference: None,
                output: "summary",
            })
            .await;

        assert!(matches!(result, Err(ScorerFailure::MissingReference)));
    }
}
