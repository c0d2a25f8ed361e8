//! Integration tests for DecodeEngine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nano_decode::{
    CancelToken, DecodeEngine, Error, GenerationConfig, GenerationStatus, LanguageModel, Result,
    TableModel, Tokenize, VocabTokenizer, Vocabulary,
};

// Word tokens 0..=7, then <unk> (8) and newline (9) appended.
fn adventure_vocab() -> Arc<Vocabulary> {
    Arc::new(Vocabulary::from_tokens(vec![
        "You".into(),      // 0
        "attack".into(),   // 1
        "the".into(),      // 2
        "dragon".into(),   // 3
        "with".into(),     // 4
        "a".into(),        // 5
        "sword".into(),    // 6
        "http://x".into(), // 7
    ]))
}

/// Row peaking at `peak`, sized for the adventure vocabulary.
fn peak_row(vocab_size: usize, peak: u32) -> Vec<f32> {
    let mut row = vec![0.0; vocab_size];
    row[peak as usize] = 10.0;
    row
}

/// Chain model: "attack" -> "the" -> "dragon" -> "with" -> "a" -> "sword".
fn adventure_model(vocab_size: usize) -> TableModel {
    let mut model = TableModel::new(vocab_size);
    for (token, next) in [(1u32, 2u32), (2, 3), (3, 4), (4, 5), (5, 6)] {
        model.insert_row(token, peak_row(vocab_size, next)).unwrap();
    }
    model
}

fn adventure_engine() -> DecodeEngine<TableModel, VocabTokenizer> {
    let vocab = adventure_vocab();
    let model = adventure_model(vocab.vocab_size());
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));
    DecodeEngine::new(model, tokenizer, vocab)
}

fn greedy_config(max_tokens: usize) -> GenerationConfig {
    GenerationConfig {
        max_tokens,
        max_window: max_tokens,
        temperature: 0.0,
        repetition_penalty: 0.0,
        ..Default::default()
    }
}

/// Model that fails on the nth call, delegating to an inner table model
/// before that.
struct FailingModel {
    inner: TableModel,
    calls: AtomicUsize,
    fail_at: usize,
}

impl LanguageModel for FailingModel {
    fn infer(&self, window: &[u32]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_at {
            return Err(Error::Inference("backend connection lost".into()));
        }
        self.inner.infer(window)
    }
}

/// Model that blocks longer than any reasonable timeout.
struct SlowModel {
    inner: TableModel,
}

impl LanguageModel for SlowModel {
    fn infer(&self, window: &[u32]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(Duration::from_millis(30));
        self.inner.infer(window)
    }
}

#[test]
fn test_greedy_adventure_scenario() {
    let engine = adventure_engine();
    let output = engine.generate("You attack", &greedy_config(6)).unwrap();

    assert_eq!(output.status, GenerationStatus::Complete);
    assert_eq!(output.tokens.len(), 6);
    assert_eq!(output.text, "You attack the dragon with a");
    assert!(output.text.starts_with("You attack the dragon"));
}

#[test]
fn test_greedy_is_deterministic() {
    let engine = adventure_engine();
    let a = engine.generate("You attack", &greedy_config(6)).unwrap();
    let b = engine.generate("You attack", &greedy_config(6)).unwrap();

    assert_eq!(a.text, b.text);
    assert_eq!(a.tokens, b.tokens);
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let engine = adventure_engine();
    let config = GenerationConfig {
        temperature: 1.0,
        seed: Some(42),
        ..greedy_config(8)
    };

    let a = engine.generate("You attack", &config).unwrap();
    let b = engine.generate("You attack", &config).unwrap();

    assert_eq!(a.tokens, b.tokens);
}

#[test]
fn test_partial_result_on_model_failure() {
    let vocab = adventure_vocab();
    let model = FailingModel {
        inner: adventure_model(vocab.vocab_size()),
        calls: AtomicUsize::new(0),
        fail_at: 2,
    };
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));
    let engine = DecodeEngine::new(model, tokenizer, vocab);

    // Budget of 10, failure on the third model call: only the two
    // completed steps survive.
    let output = engine.generate("You attack", &greedy_config(10)).unwrap();

    assert_eq!(output.status, GenerationStatus::PartialDueToError);
    assert_eq!(output.tokens, vec![0, 1, 2, 3]);
    assert_eq!(output.text, "You attack the dragon");
}

#[test]
fn test_timeout_degrades_to_partial() {
    let vocab = adventure_vocab();
    let model = SlowModel {
        inner: adventure_model(vocab.vocab_size()),
    };
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));
    let engine = DecodeEngine::new(model, tokenizer, vocab);

    let config = GenerationConfig {
        infer_timeout_ms: Some(1),
        ..greedy_config(6)
    };
    let output = engine.generate("You attack", &config).unwrap();

    assert_eq!(output.status, GenerationStatus::PartialDueToError);
    // First step already exceeded the bound; only the prompt survives.
    assert_eq!(output.tokens, vec![0, 1]);
    assert_eq!(output.text, "You attack");
}

#[test]
fn test_cancellation_between_steps() {
    let engine = adventure_engine();
    let cancel = CancelToken::new();
    cancel.cancel();

    let output = engine
        .generate_with_cancel("You attack", &greedy_config(6), &cancel)
        .unwrap();

    assert_eq!(output.status, GenerationStatus::Cancelled);
    assert_eq!(output.text, "You attack");
}

#[test]
fn test_substring_ban_skips_top_candidate() {
    let vocab = adventure_vocab();
    let mut model = TableModel::new(vocab.vocab_size());
    // "attack" ranks the link token first, "the" second.
    let mut row = vec![0.0; vocab.vocab_size()];
    row[7] = 10.0;
    row[2] = 5.0;
    model.insert_row(1, row).unwrap();
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));
    let engine = DecodeEngine::new(model, tokenizer, vocab);

    let config = GenerationConfig {
        disallowed_substrings: vec!["http".into()],
        ..greedy_config(3)
    };
    let output = engine.generate("You attack", &config).unwrap();

    assert_eq!(output.status, GenerationStatus::Complete);
    assert_eq!(output.tokens[2], 2);
    assert_eq!(output.text, "You attack the");
}

#[test]
fn test_sliding_window_run_completes() {
    let engine = adventure_engine();
    // Budget well past the window so the anchor-sliding path is exercised.
    let config = GenerationConfig {
        max_tokens: 12,
        max_window: 4,
        temperature: 0.0,
        repetition_penalty: 0.0,
        ..Default::default()
    };

    let output = engine.generate("You attack", &config).unwrap();

    assert_eq!(output.status, GenerationStatus::Complete);
    assert_eq!(output.tokens.len(), 12);
}

#[test]
fn test_invalid_config_is_setup_error() {
    let engine = adventure_engine();
    let config = GenerationConfig {
        max_tokens: 4,
        max_window: 8,
        ..Default::default()
    };

    assert!(matches!(
        engine.generate("You attack", &config),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_unresolvable_prompt_is_setup_error() {
    let engine = adventure_engine();

    assert!(matches!(
        engine.generate("You teleport", &greedy_config(6)),
        Err(Error::Tokenization(_))
    ));
    assert!(matches!(
        engine.generate("", &greedy_config(6)),
        Err(Error::Tokenization(_))
    ));
}

#[test]
fn test_prompt_filling_budget_is_complete() {
    let engine = adventure_engine();
    let output = engine.generate("You attack", &greedy_config(2)).unwrap();

    assert_eq!(output.status, GenerationStatus::Complete);
    assert_eq!(output.text, "You attack");
}

#[test]
fn test_detokenization_round_trip() {
    let vocab = adventure_vocab();
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));

    let text = "You attack the dragon with a sword";
    let tokens = tokenizer.encode(text).unwrap();
    assert_eq!(nano_decode::render(&vocab, &tokens), text);
}
