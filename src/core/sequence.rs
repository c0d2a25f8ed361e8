//! Per-request sequence buffer.
//!
//! A [`SequenceBuffer`] holds one generation request's tokens: the prompt,
//! then each decoded token, in a buffer pre-allocated to the generation
//! budget and padded with a sentinel. It is owned exclusively by the decode
//! loop for the lifetime of one request and discarded afterwards.

use crate::error::{Error, Result};

/// Sentinel value for not-yet-written buffer positions.
pub const PAD_TOKEN: u32 = 0;

/// State of a decode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeState {
    /// Prompt consumed, loop not yet started.
    Priming,
    /// Decoding, one step at a time.
    Stepping,
    /// Budget exhausted.
    Done,
    /// Aborted mid-run; the buffer holds a partial sequence.
    Failed,
}

impl DecodeState {
    /// Get the state name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priming => "Priming",
            Self::Stepping => "Stepping",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    /// Check if the request can no longer advance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Fixed-capacity token buffer for a single generation request.
///
/// # Example
///
/// ```
/// use nano_decode::core::{DecodeState, SequenceBuffer};
///
/// let mut buf = SequenceBuffer::new(vec![5, 9], 4).unwrap();
/// assert_eq!(buf.state(), DecodeState::Priming);
/// assert_eq!(buf.generated(), &[5, 9]);
///
/// buf.begin_stepping().unwrap();
/// buf.push(7);
/// assert_eq!(buf.generated(), &[5, 9, 7]);
/// ```
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    /// Token storage, length = budget, sentinel-padded past the cursor.
    tokens: Vec<u32>,
    /// Number of prompt tokens at the front of the buffer.
    prompt_len: usize,
    /// Number of valid tokens (prompt + decoded so far).
    cursor: usize,
    /// Current decode state.
    state: DecodeState,
}

impl SequenceBuffer {
    /// Create a buffer primed with the prompt, padded out to `budget`.
    ///
    /// # Errors
    ///
    /// The prompt must be non-empty and must fit within the budget.
    pub fn new(prompt: Vec<u32>, budget: usize) -> Result<Self> {
        if prompt.is_empty() {
            return Err(Error::Tokenization("empty prompt".to_string()));
        }
        if prompt.len() > budget {
            return Err(Error::Config(format!(
                "prompt length {} exceeds generation budget {}",
                prompt.len(),
                budget
            )));
        }

        let prompt_len = prompt.len();
        let mut tokens = prompt;
        tokens.resize(budget, PAD_TOKEN);

        Ok(Self {
            tokens,
            prompt_len,
            cursor: prompt_len,
            state: DecodeState::Priming,
        })
    }

    /// Transition into the stepping state.
    ///
    /// # Errors
    ///
    /// Returns an error unless the buffer is still priming.
    pub fn begin_stepping(&mut self) -> Result<()> {
        match self.state {
            DecodeState::Priming => {
                self.state = DecodeState::Stepping;
                Ok(())
            }
            _ => Err(Error::InvalidStateTransition {
                from: self.state.as_str(),
                to: "Stepping",
            }),
        }
    }

    /// Append a decoded token at the cursor.
    ///
    /// The decode loop's bounds guarantee the buffer is stepping and has
    /// room; both are debug-asserted.
    pub fn push(&mut self, token: u32) {
        debug_assert_eq!(self.state, DecodeState::Stepping);
        debug_assert!(self.cursor < self.tokens.len());
        if self.cursor < self.tokens.len() {
            self.tokens[self.cursor] = token;
            self.cursor += 1;
        }
    }

    /// Mark the request complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the request already terminated.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            DecodeState::Priming | DecodeState::Stepping => {
                self.state = DecodeState::Done;
                Ok(())
            }
            _ => Err(Error::InvalidStateTransition {
                from: self.state.as_str(),
                to: "Done",
            }),
        }
    }

    /// Mark the request aborted; the tokens written so far remain valid.
    pub fn fail(&mut self) {
        self.state = DecodeState::Failed;
    }

    /// Full padded buffer (length = budget), the view the window manager
    /// slices.
    pub fn padded(&self) -> &[u32] {
        &self.tokens
    }

    /// Valid tokens only: prompt plus everything decoded so far.
    pub fn generated(&self) -> &[u32] {
        &self.tokens[..self.cursor]
    }

    /// Number of prompt tokens.
    pub fn prompt_len(&self) -> usize {
        self.prompt_len
    }

    /// Number of valid tokens.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// True when no decoded tokens have been written yet.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Generation budget (total capacity).
    pub fn budget(&self) -> usize {
        self.tokens.len()
    }

    /// True once the buffer holds `budget` valid tokens.
    pub fn is_full(&self) -> bool {
        self.cursor == self.tokens.len()
    }

    /// Current decode state.
    pub fn state(&self) -> DecodeState {
        self.state
    }
}
