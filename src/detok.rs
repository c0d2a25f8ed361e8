//! Detokenization.
//!
//! Reassembles emitted token strings into human-readable text: vocabulary
//! lookup, single-space join, then collapse of the two-character subword
//! merge marker so `dra@@ gon` becomes `dragon`. Pure and stateless;
//! unknown IDs render as the literal unknown-token string.

use crate::vocab::Vocabulary;

/// Subword merge marker used by the vocabulary.
pub const MERGE_MARKER: &str = "@@";

/// Render token IDs into text.
pub fn render(vocab: &Vocabulary, tokens: &[u32]) -> String {
    let joined = tokens
        .iter()
        .map(|&id| vocab.string_of(id))
        .collect::<Vec<_>>()
        .join(" ");

    // A marker followed by a space glues subwords together; a trailing
    // marker at end-of-string is dropped.
    let collapsed = joined.replace("@@ ", "");
    collapsed
        .strip_suffix(MERGE_MARKER)
        .unwrap_or(&collapsed)
        .to_string()
}
