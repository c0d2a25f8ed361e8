//! Logit policy pipeline.
//!
//! Transforms one step's raw logits into a final sampling distribution:
//!
//! ```text
//! Logits [vocab_size]
//!     │
//!     ▼ Temperature pre-scale
//!     ▼ Repetition penalty (once per token per request)
//!     ▼ Hard bans (<unk> + configured IDs)
//!     ▼ Softmax (max-subtracted)
//!     ▼ Sort descending (ties by ascending ID)
//!     ▼ Nucleus / top-k truncation
//!     ▼ Substring ban filter
//! Candidates + probabilities
//! ```
//!
//! The step order is load-bearing: each stage consumes the previous
//! stage's output, and the substring filter runs after truncation so it
//! can only shrink the candidate set, never re-admit tokens.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::warn;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Logit value assigned to banned tokens; effectively zero probability
/// after exponentiation.
pub const BAN_LOGIT: f32 = -1e8;

/// One step's sampling distribution.
#[derive(Debug, Clone)]
pub struct Candidates {
    /// Candidate token IDs, descending probability, truncated and filtered.
    pub order: Vec<u32>,
    /// Full-vocabulary probability distribution the candidates index into.
    pub probs: Vec<f32>,
}

/// The policy pipeline for one request: borrows the request's config and
/// the shared vocabulary, and is re-applied to fresh logits every step.
#[derive(Debug)]
pub struct LogitPolicy<'a> {
    config: &'a GenerationConfig,
    vocab: &'a Vocabulary,
}

impl<'a> LogitPolicy<'a> {
    pub fn new(config: &'a GenerationConfig, vocab: &'a Vocabulary) -> Self {
        Self { config, vocab }
    }

    /// Run the pipeline over one step's raw logits.
    ///
    /// `sequence_so_far` is every valid token up to and including the
    /// current position; `penalized` is the request-scoped penalty set,
    /// accumulated across steps so a token's logit is discounted at most
    /// once per generation run.
    ///
    /// # Errors
    ///
    /// [`Error::Inference`] when the logits row does not match the
    /// vocabulary; [`Error::NoCandidates`] when the substring filter
    /// empties the candidate list and fallback is disabled.
    pub fn apply(
        &self,
        mut logits: Vec<f32>,
        sequence_so_far: &[u32],
        penalized: &mut HashSet<u32>,
    ) -> Result<Candidates> {
        let vocab_size = self.vocab.vocab_size();
        if logits.len() != vocab_size {
            return Err(Error::Inference(format!(
                "logits row has length {}, expected vocab size {}",
                logits.len(),
                vocab_size
            )));
        }

        // 1. Temperature pre-scale. Greedy mode (temperature 0) skips
        //    scaling entirely; selection handles it.
        if self.config.temperature > 0.0 {
            for logit in &mut logits {
                *logit /= self.config.temperature;
            }
        }

        // 2. Repetition penalty. Newlines are exempt to preserve
        //    paragraph structure.
        if self.config.repetition_penalty > 0.0 {
            let newline = self.vocab.newline_id();
            for &token in sequence_so_far {
                if token == newline {
                    continue;
                }
                if !penalized.insert(token) {
                    continue;
                }
                if let Some(logit) = logits.get_mut(token as usize) {
                    *logit /= self.config.repetition_penalty;
                }
            }
        }

        // 3. Hard bans.
        logits[self.vocab.unknown_id() as usize] = BAN_LOGIT;
        for &token in &self.config.disallowed_tokens {
            if let Some(logit) = logits.get_mut(token as usize) {
                *logit = BAN_LOGIT;
            }
        }

        // 4. Softmax, max-subtracted so exponentiation cannot overflow.
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut probs: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
        let sum: f32 = probs.iter().sum();
        for p in &mut probs {
            *p /= sum;
        }

        // 5. Candidate order: descending probability, ties broken by
        //    ascending token ID for determinism.
        let mut order: Vec<u32> = (0..vocab_size as u32).collect();
        order.sort_by(|&a, &b| {
            probs[b as usize]
                .partial_cmp(&probs[a as usize])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        // 6. Truncation: nucleus > top-k > unrestricted.
        let count = if self.config.top_p > 0.0 {
            let mut cumulative = 0.0f32;
            let mut count = order.len();
            for (i, &token) in order.iter().enumerate() {
                cumulative += probs[token as usize];
                if cumulative > self.config.top_p {
                    // Include the token that pushed us over.
                    count = i + 1;
                    break;
                }
            }
            count.max(1)
        } else if self.config.top_k > 0 {
            self.config.top_k.min(order.len())
        } else {
            order.len()
        };
        order.truncate(count);

        // 7. Substring ban filter, after truncation. May shrink the set
        //    below the nucleus/top-k count.
        if !self.config.disallowed_substrings.is_empty() {
            let best = order[0];
            order.retain(|&token| {
                let text = self.vocab.string_of(token);
                !self
                    .config
                    .disallowed_substrings
                    .iter()
                    .any(|sub| text.contains(sub.as_str()))
            });

            if order.is_empty() {
                if !self.config.fallback_on_empty {
                    return Err(Error::NoCandidates);
                }
                warn!(
                    token = best,
                    "substring filter emptied candidate list, falling back to top token"
                );
                order.push(best);
            }
        }

        Ok(Candidates { order, probs })
    }
}
