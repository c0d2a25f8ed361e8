use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nano_decode::{
    DecodeEngine, GenerationConfig, GenerationStatus, Result, TableModel, VocabTokenizer,
    Vocabulary,
};

#[derive(Parser, Debug)]
#[command(name = "nano-decode")]
#[command(about = "A minimalistic decoding engine for causal language models")]
struct Args {
    /// Vocabulary file (one `token count` pair per line)
    #[arg(long)]
    vocab: PathBuf,

    /// Lookup-table model JSON
    #[arg(long)]
    model: PathBuf,

    /// Input prompt
    #[arg(short, long)]
    prompt: String,

    /// Generation budget (total tokens, prompt included)
    #[arg(long, default_value = "256")]
    max_tokens: usize,

    /// Maximum model input window
    #[arg(long, default_value = "256")]
    max_window: usize,

    /// Sampling temperature (0 = greedy)
    #[arg(long, default_value = "0.0")]
    temperature: f32,

    /// Repetition penalty (0 = disabled)
    #[arg(long, default_value = "1.2")]
    penalty: f32,

    /// Nucleus sampling threshold (0 = disabled)
    #[arg(long, default_value = "0.0")]
    top_p: f32,

    /// Top-k sampling (0 = disabled)
    #[arg(long, default_value = "0")]
    top_k: usize,

    /// Substrings that disqualify candidate tokens
    #[arg(long = "ban-substring")]
    ban_substrings: Vec<String>,

    /// RNG seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let vocab = Arc::new(Vocabulary::from_reader(BufReader::new(File::open(
        &args.vocab,
    )?))?);
    let model = TableModel::from_reader(BufReader::new(File::open(&args.model)?))?;
    let tokenizer = VocabTokenizer::new(Arc::clone(&vocab));
    let engine = DecodeEngine::new(model, tokenizer, vocab);

    let config = GenerationConfig {
        max_tokens: args.max_tokens,
        max_window: args.max_window,
        temperature: args.temperature,
        repetition_penalty: args.penalty,
        top_p: args.top_p,
        top_k: args.top_k,
        disallowed_substrings: args.ban_substrings,
        seed: args.seed,
        ..Default::default()
    };

    let output = engine.generate(&args.prompt, &config)?;
    println!("{}", output.text);
    if output.status != GenerationStatus::Complete {
        eprintln!("status: {:?}", output.status);
    }

    Ok(())
}
