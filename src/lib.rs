//! nano-decode: a minimalistic decoding and sampling engine for causal
//! language models.
//!
//! This crate implements the single-sequence decode loop around a
//! black-box model port:
//! - Sliding context window with a first-token anchor
//! - Logit policy pipeline (repetition penalty, disallow lists,
//!   nucleus/top-k truncation)
//! - Greedy and categorical token selection
//! - Best-effort partial results on mid-run failure

pub mod config;
pub mod error;

pub mod core;
pub mod detok;
pub mod engine;
pub mod model;
pub mod tokenizer;
pub mod vocab;

pub use crate::core::{DecodeState, SequenceBuffer};
pub use config::GenerationConfig;
pub use detok::render;
pub use engine::{
    build_window, CancelToken, Candidates, DecodeEngine, GenerationOutput, GenerationStatus,
    LogitPolicy, Sampler, TargetPosition,
};
pub use error::{Error, Result};
pub use model::{LanguageModel, TableModel};
pub use tokenizer::{Tokenize, VocabTokenizer};
pub use vocab::Vocabulary;
