//! Vocabulary table: bidirectional token string <-> ID mapping.
//!
//! Built once at load time and shared (via `Arc`) across all concurrent
//! generation requests; immutable afterwards.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::Result;

/// Reserved string for the unknown token.
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Reserved string for the newline token (exempt from repetition penalty).
pub const NEWLINE_TOKEN: &str = "\n";

/// Immutable vocabulary table.
///
/// Index into the ordered token list is the token ID. Always contains the
/// unknown and newline tokens; constructors append them when missing.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
    unknown_id: u32,
    newline_id: u32,
}

impl Vocabulary {
    /// Build a vocabulary from an ordered token list.
    ///
    /// `<unk>` and `"\n"` are appended if absent. When a string appears more
    /// than once, the first occurrence wins in the string->id index.
    pub fn from_tokens(mut tokens: Vec<String>) -> Self {
        if !tokens.iter().any(|t| t == UNKNOWN_TOKEN) {
            tokens.push(UNKNOWN_TOKEN.to_string());
        }
        if !tokens.iter().any(|t| t == NEWLINE_TOKEN) {
            tokens.push(NEWLINE_TOKEN.to_string());
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            index.entry(token.clone()).or_insert(id as u32);
        }

        let unknown_id = index[UNKNOWN_TOKEN];
        let newline_id = index[NEWLINE_TOKEN];

        Self {
            tokens,
            index,
            unknown_id,
            newline_id,
        }
    }

    /// Load a vocabulary file with one `token count` pair per line; the
    /// count is dropped. `<unk>` and `"\n"` are appended when absent.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut tokens = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let token = line.split(' ').next().unwrap_or(&line);
            tokens.push(token.to_string());
        }
        Ok(Self::from_tokens(tokens))
    }

    /// Number of tokens in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.tokens.len()
    }

    /// Look up a token's string form. Out-of-range IDs render as the
    /// unknown token.
    pub fn string_of(&self, id: u32) -> &str {
        self.tokens
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TOKEN)
    }

    /// Look up a string's token ID.
    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// ID of the reserved unknown token.
    pub fn unknown_id(&self) -> u32 {
        self.unknown_id
    }

    /// ID of the newline token.
    pub fn newline_id(&self) -> u32 {
        self.newline_id
    }
}
