//! Core infrastructure for nano-decode.
//!
//! This module contains the per-request sequence buffer and its decode
//! state machine.

pub mod sequence;

pub use sequence::{DecodeState, SequenceBuffer, PAD_TOKEN};
