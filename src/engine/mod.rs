//! Decoding engine.
//!
//! This module contains:
//! - DecodeEngine for orchestrating the per-step loop
//! - Context window construction
//! - The logit policy pipeline
//! - The token selector

pub mod decode;
pub mod logits;
pub mod sampler;
pub mod window;

pub use decode::{CancelToken, DecodeEngine, GenerationOutput, GenerationStatus};
pub use logits::{Candidates, LogitPolicy, BAN_LOGIT};
pub use sampler::Sampler;
pub use window::{build_window, TargetPosition};
