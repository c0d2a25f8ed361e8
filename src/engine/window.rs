//! Context window management.
//!
//! For each decode step this computes which sub-window of the sequence
//! buffer to feed the model, honoring the model's maximum input length.
//! Once the sequence outgrows the window, the window slides but always
//! keeps the first token of the sequence as an anchor. That anchor
//! preserves a long-range control signal (a persistent control prefix)
//! after the window has slid past the prompt start; dropping it changes
//! generation behavior materially.

use std::borrow::Cow;

/// Which logits row of the model output the policy pipeline consumes.
///
/// An explicit type instead of a `-1` index sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPosition {
    /// A fixed position within the window.
    Absolute(usize),
    /// The last position of the window, wherever that lands.
    LastInWindow,
}

impl TargetPosition {
    /// Resolve to a concrete row index for a window of `window_len` tokens.
    pub fn index(&self, window_len: usize) -> usize {
        match *self {
            Self::Absolute(n) => n,
            Self::LastInWindow => window_len.saturating_sub(1),
        }
    }
}

/// Compute the model input window for decode step `step`.
///
/// `sequence` is the full padded buffer (length = budget, budget >=
/// `max_window`); `step` is the index of the last valid token.
///
/// - While `step <= max_window`, the window is the buffer's first
///   `max_window` tokens (sentinel-padded past the cursor), and the target
///   is `step` itself while it still falls inside the window.
/// - Afterwards, the window is the anchor token followed by the most
///   recent `max_window - 1` tokens, and the target is the last position.
///
/// Borrowed in the prefix case, owned once the window slides.
pub fn build_window(sequence: &[u32], step: usize, max_window: usize) -> (Cow<'_, [u32]>, TargetPosition) {
    if step <= max_window {
        let window = Cow::Borrowed(&sequence[..max_window]);
        let target = if step < max_window {
            TargetPosition::Absolute(step)
        } else {
            TargetPosition::LastInWindow
        };
        (window, target)
    } else {
        let start = step - max_window + 2;
        let mut window = Vec::with_capacity(max_window);
        window.push(sequence[0]);
        window.extend_from_slice(&sequence[start..=step]);
        (Cow::Owned(window), TargetPosition::LastInWindow)
    }
}
