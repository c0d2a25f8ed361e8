//! Decode loop controller.
//!
//! [`DecodeEngine`] orchestrates one generation request per call: build the
//! context window, invoke the model port, run the logit policy pipeline,
//! select a token, append it, repeat until the budget is exhausted.
//!
//! ## Engine flow
//!
//! ```text
//! prompt ──► Tokenize ──► SequenceBuffer (priming)
//!                              │
//!              ┌───────────────▼───────────────┐
//!              │  build_window                 │
//!              │  LanguageModel::infer         │  one decode step,
//!              │  LogitPolicy::apply           │  repeated until the
//!              │  Sampler::select              │  budget is exhausted
//!              │  SequenceBuffer::push         │
//!              └───────────────┬───────────────┘
//!                              ▼
//!                      Detokenizer render
//! ```
//!
//! Failures after priming never propagate to the caller: the engine logs
//! the cause, aborts the loop, and returns the text produced so far with a
//! `PartialDueToError` status. Only setup failures (bad configuration, an
//! unresolvable prompt) surface as hard errors.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::core::sequence::SequenceBuffer;
use crate::detok::render;
use crate::engine::logits::LogitPolicy;
use crate::engine::sampler::Sampler;
use crate::engine::window::build_window;
use crate::error::{Error, Result};
use crate::model::LanguageModel;
use crate::tokenizer::Tokenize;
use crate::vocab::Vocabulary;

/// How a generation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// The full generation budget was produced.
    Complete,
    /// A mid-run failure aborted the loop; the output holds everything
    /// decoded up to the last completed step.
    PartialDueToError,
    /// Cancelled between steps; the output holds everything decoded up to
    /// the last completed step.
    Cancelled,
}

/// Output of a generation request.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Input prompt text.
    pub prompt: String,
    /// Rendered text, prompt included.
    pub text: String,
    /// Token IDs backing `text`.
    pub tokens: Vec<u32>,
    /// How the request ended.
    pub status: GenerationStatus,
}

/// Cooperative cancellation flag, checked between decode steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The current step still completes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Single-sequence decode engine.
///
/// Holds the shared, read-only collaborators (model port, tokenizer,
/// vocabulary). All per-request state (sequence buffer, penalty set,
/// sampler) is created inside [`generate`](Self::generate) and discarded
/// when it returns, so one engine can serve concurrent requests as long as
/// the model port is internally thread-safe.
pub struct DecodeEngine<M, T> {
    model: M,
    tokenizer: T,
    vocab: Arc<Vocabulary>,
}

impl<M: LanguageModel, T: Tokenize> DecodeEngine<M, T> {
    /// Create an engine over a model port, tokenizer, and vocabulary.
    pub fn new(model: M, tokenizer: T, vocab: Arc<Vocabulary>) -> Self {
        Self {
            model,
            tokenizer,
            vocab,
        }
    }

    /// The shared vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Run one generation request to completion.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned as errors: an invalid
    /// configuration or a prompt the tokenizer cannot resolve. Every
    /// failure after that degrades to a partial result.
    pub fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationOutput> {
        self.generate_with_cancel(prompt, config, &CancelToken::new())
    }

    /// [`generate`](Self::generate) with a cooperative cancellation flag.
    /// Cancellation takes effect between steps, never mid-step.
    pub fn generate_with_cancel(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        cancel: &CancelToken,
    ) -> Result<GenerationOutput> {
        config.validate()?;

        let prompt_tokens = self.tokenizer.encode(prompt)?;
        let mut buffer = SequenceBuffer::new(prompt_tokens, config.max_tokens)?;
        let mut penalized: HashSet<u32> = HashSet::new();
        let mut sampler = match config.seed {
            Some(seed) => Sampler::with_seed(seed),
            None => Sampler::new(),
        };
        let policy = LogitPolicy::new(config, &self.vocab);

        let mut status = GenerationStatus::Complete;
        if !buffer.is_full() {
            buffer.begin_stepping()?;
            // Step indexes the last valid token; the result lands at
            // step + 1, so the loop stops one short of the budget.
            for step in (buffer.prompt_len() - 1)..(config.max_tokens - 1) {
                if cancel.is_cancelled() {
                    debug!(step, "generation cancelled between steps");
                    status = GenerationStatus::Cancelled;
                    break;
                }

                match self.decode_step(&buffer, step, config, &policy, &mut penalized, &mut sampler)
                {
                    Ok(token) => buffer.push(token),
                    Err(err) => {
                        warn!(step, error = %err, "generation aborted, returning partial output");
                        status = GenerationStatus::PartialDueToError;
                        break;
                    }
                }
            }
        }

        match status {
            GenerationStatus::Complete => buffer.finish()?,
            _ => buffer.fail(),
        }

        let tokens = buffer.generated().to_vec();
        let text = render(&self.vocab, &tokens);
        Ok(GenerationOutput {
            prompt: prompt.to_string(),
            text,
            tokens,
            status,
        })
    }

    /// One decode step: window -> model -> policy -> selection.
    fn decode_step(
        &self,
        buffer: &SequenceBuffer,
        step: usize,
        config: &GenerationConfig,
        policy: &LogitPolicy<'_>,
        penalized: &mut HashSet<u32>,
        sampler: &mut Sampler,
    ) -> Result<u32> {
        let (window, target) = build_window(buffer.padded(), step, config.max_window);

        let started = Instant::now();
        let logits = self.model.infer(&window)?;
        if let Some(limit) = config.infer_timeout() {
            let elapsed = started.elapsed();
            if elapsed > limit {
                return Err(Error::Inference(format!(
                    "model call took {elapsed:?}, exceeding the {limit:?} timeout"
                )));
            }
        }

        let rows = logits.len();
        let position = target.index(window.len());
        let row = logits.into_iter().nth(position).ok_or_else(|| {
            Error::Inference(format!(
                "model returned {rows} logits rows, expected position {position}"
            ))
        })?;

        let candidates = policy.apply(row, buffer.generated(), penalized)?;
        sampler.select(&candidates, config.temperature)
    }
}
