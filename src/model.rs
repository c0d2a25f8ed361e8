//! Model inference port.
//!
//! The neural network itself lives outside this crate. The engine sees it
//! only through [`LanguageModel`]: given a window of token IDs, return one
//! logits row per input position. Implementations must be deterministic for
//! identical inputs (required for reproducibility testing) and internally
//! thread-safe if shared across concurrent requests.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Black-box interface to a causal language model.
pub trait LanguageModel {
    /// Run a forward pass over `window`, returning a logits row
    /// (length = vocab size) for every input position.
    fn infer(&self, window: &[u32]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic lookup-table model.
///
/// The logits row for each position depends only on the token at that
/// position: a configured row if present, otherwise a flat zero row. Used
/// as the reference mock in tests and loadable from JSON for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableModel {
    vocab_size: usize,
    rows: HashMap<u32, Vec<f32>>,
}

impl TableModel {
    /// Create an empty table for the given vocabulary size.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            rows: HashMap::new(),
        }
    }

    /// Set the logits row produced at positions holding `token`.
    ///
    /// # Errors
    ///
    /// Fails if the row length does not match the vocabulary size.
    pub fn insert_row(&mut self, token: u32, row: Vec<f32>) -> Result<()> {
        if row.len() != self.vocab_size {
            return Err(Error::Config(format!(
                "row for token {token} has length {}, expected {}",
                row.len(),
                self.vocab_size
            )));
        }
        self.rows.insert(token, row);
        Ok(())
    }

    /// Builder-style [`insert_row`](Self::insert_row).
    pub fn with_row(mut self, token: u32, row: Vec<f32>) -> Result<Self> {
        self.insert_row(token, row)?;
        Ok(self)
    }

    /// Load a table model from JSON.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    /// Vocabulary size the rows are sized for.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(Error::Config("table model has zero vocab_size".into()));
        }
        for (token, row) in &self.rows {
            if row.len() != self.vocab_size {
                return Err(Error::Config(format!(
                    "row for token {token} has length {}, expected {}",
                    row.len(),
                    self.vocab_size
                )));
            }
        }
        Ok(())
    }
}

impl LanguageModel for TableModel {
    fn infer(&self, window: &[u32]) -> Result<Vec<Vec<f32>>> {
        Ok(window
            .iter()
            .map(|token| {
                self.rows
                    .get(token)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.vocab_size])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_model_rows() {
        let model = TableModel::new(3)
            .with_row(0, vec![0.0, 5.0, 0.0])
            .unwrap();

        let logits = model.infer(&[0, 7]).unwrap();
        assert_eq!(logits.len(), 2);
        assert_eq!(logits[0], vec![0.0, 5.0, 0.0]);
        // Unconfigured token falls back to a flat row.
        assert_eq!(logits[1], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_row_length_checked() {
        let mut model = TableModel::new(3);
        assert!(model.insert_row(0, vec![1.0]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let model = TableModel::new(2).with_row(1, vec![0.5, -0.5]).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let loaded = TableModel::from_reader(json.as_bytes()).unwrap();

        assert_eq!(loaded.vocab_size(), 2);
        assert_eq!(loaded.infer(&[1]).unwrap()[0], vec![0.5, -0.5]);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let json = r#"{"vocab_size": 2, "rows": {"0": [1.0, 2.0, 3.0]}}"#;
        assert!(TableModel::from_reader(json.as_bytes()).is_err());
    }
}
