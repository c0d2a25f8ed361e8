//! Prompt tokenization collaborator.
//!
//! Subword segmentation itself is an external concern; the engine only
//! needs `encode(text) -> token IDs`. [`VocabTokenizer`] is the in-tree
//! implementation: whitespace split plus vocabulary lookup, which covers
//! pre-segmented text and test fixtures.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// Converts prompt text into token IDs.
pub trait Tokenize {
    /// Encode a prompt. Fails with [`Error::Tokenization`] when the text
    /// contains tokens the vocabulary cannot resolve; surfaced to the
    /// caller before any generation begins.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
}

/// Whitespace tokenizer backed by a [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct VocabTokenizer {
    vocab: Arc<Vocabulary>,
}

impl VocabTokenizer {
    /// Create a tokenizer over a shared vocabulary.
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }
}

impl Tokenize for VocabTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(Error::Tokenization("empty prompt".to_string()));
        }

        let mut ids = Vec::with_capacity(words.len());
        for word in words {
            let id = self
                .vocab
                .id_of(word)
                .ok_or_else(|| Error::Tokenization(format!("unresolvable token: {word:?}")))?;
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::from_tokens(vec![
            "You".into(),
            "attack".into(),
            "the".into(),
        ]))
    }

    #[test]
    fn test_encode_known_words() {
        let tokenizer = VocabTokenizer::new(test_vocab());
        assert_eq!(tokenizer.encode("You attack the").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_encode_collapses_whitespace() {
        let tokenizer = VocabTokenizer::new(test_vocab());
        assert_eq!(tokenizer.encode("  You   attack ").unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_empty_prompt_is_error() {
        let tokenizer = VocabTokenizer::new(test_vocab());
        assert!(matches!(
            tokenizer.encode("   "),
            Err(Error::Tokenization(_))
        ));
    }

    #[test]
    fn test_unknown_word_is_error() {
        let tokenizer = VocabTokenizer::new(test_vocab());
        assert!(matches!(
            tokenizer.encode("You defenestrate"),
            Err(Error::Tokenization(_))
        ));
    }
}
