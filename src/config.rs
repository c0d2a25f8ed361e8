//! Configuration types for nano-decode.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-request generation configuration.
///
/// One instance is validated at request setup and read (never mutated) for
/// the lifetime of that request, so concurrent requests stay isolated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Total sequence length to generate, prompt included (generation budget).
    pub max_tokens: usize,
    /// Maximum number of tokens fed to the model per step. The window slides
    /// (keeping the first token as an anchor) once the sequence outgrows it.
    pub max_window: usize,
    /// Sampling temperature (0 = greedy decoding).
    pub temperature: f32,
    /// Repetition penalty; each token's logit is divided by this value at
    /// most once per request (0 = disabled).
    pub repetition_penalty: f32,
    /// Nucleus (top-p) truncation threshold (0 = disabled). Takes precedence
    /// over `top_k` when both are set.
    pub top_p: f32,
    /// Top-k truncation (0 = disabled).
    pub top_k: usize,
    /// Token IDs that may never be selected. The unknown token is always
    /// banned in addition to these.
    pub disallowed_tokens: HashSet<u32>,
    /// Substrings that disqualify a candidate token (matched against its
    /// string form, after truncation).
    pub disallowed_substrings: Vec<String>,
    /// When the substring filter empties the candidate list, fall back to
    /// the highest-probability token instead of aborting the request.
    pub fallback_on_empty: bool,
    /// Bound on a single model call, in milliseconds (None = unbounded).
    /// Exceeding it aborts the request with a partial result.
    pub infer_timeout_ms: Option<u64>,
    /// RNG seed for reproducible stochastic sampling (None = entropy).
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            max_window: 256,
            temperature: 0.0,
            repetition_penalty: 1.2,
            top_p: 0.0,
            top_k: 0,
            disallowed_tokens: HashSet::new(),
            disallowed_substrings: Vec::new(),
            fallback_on_empty: true,
            infer_timeout_ms: None,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Validate the configuration. Called at request setup, before the
    /// decode loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".into()));
        }
        if self.max_window == 0 {
            return Err(Error::Config("max_window must be positive".into()));
        }
        if self.max_window > self.max_tokens {
            return Err(Error::Config(format!(
                "max_window ({}) must not exceed max_tokens ({})",
                self.max_window, self.max_tokens
            )));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(Error::Config(format!(
                "temperature must be finite and >= 0, got {}",
                self.temperature
            )));
        }
        if !self.repetition_penalty.is_finite() || self.repetition_penalty < 0.0 {
            return Err(Error::Config(format!(
                "repetition_penalty must be finite and >= 0, got {}",
                self.repetition_penalty
            )));
        }
        if !self.top_p.is_finite() || !(0.0..1.0).contains(&self.top_p) {
            return Err(Error::Config(format!(
                "top_p must be in [0, 1), got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// Model call timeout as a `Duration`, if configured.
    pub fn infer_timeout(&self) -> Option<Duration> {
        self.infer_timeout_ms.map(Duration::from_millis)
    }
}
