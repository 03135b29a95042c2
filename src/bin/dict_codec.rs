//! dict_codec - train a shared-dictionary model from hex records, then
//! encode and decode single documents with it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use shared_dict_codec::{
    DocumentSource, Error, InputError, Model, RecordCorpus, TrainingConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model from hex record lines (one document per line)
    Train {
        /// Record file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Where to write the model
        #[arg(short, long, default_value = "session.model")]
        model: PathBuf,

        /// JSON training config; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dictionary budget in bytes
        #[arg(long)]
        dict_size: Option<usize>,

        /// Shortest copy to emit
        #[arg(long)]
        min_match: Option<u16>,

        /// Statistics threads (0 = one per CPU)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Compress a hex-encoded document
    Encode {
        hex: String,

        #[arg(short, long, default_value = "session.model")]
        model: PathBuf,
    },
    /// Decompress a hex-encoded blob
    Decode {
        hex: String,

        #[arg(short, long, default_value = "session.model")]
        model: PathBuf,
    },
    /// Print what a model file contains
    Inspect {
        #[arg(short, long, default_value = "session.model")]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let args = Args::parse();

    match args.command {
        Command::Train { input, model, config, dict_size, min_match, workers } => {
            let mut cfg = match config {
                Some(path) => TrainingConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => TrainingConfig::default(),
            };
            if let Some(v) = dict_size {
                cfg.dictionary_budget = v;
            }
            if let Some(v) = min_match {
                cfg.min_match = v;
            }
            if let Some(v) = workers {
                cfg.workers = v;
            }
            train(&input, &model, &cfg)
        }
        Command::Encode { hex, model } => encode(&hex, &model),
        Command::Decode { hex, model } => decode(&hex, &model),
        Command::Inspect { model } => inspect(&model),
    }
}

fn train(input: &str, model_path: &Path, cfg: &TrainingConfig) -> Result<()> {
    let corpus = if input == "-" {
        RecordCorpus::from_reader(BufReader::new(io::stdin().lock()))?
    } else {
        RecordCorpus::open(input).with_context(|| format!("reading records from {}", input))?
    };
    info!("Training on {} documents ({} bytes)", corpus.len(), corpus.total_bytes());

    let model = match Model::train(&corpus, cfg) {
        Ok(m) => m,
        Err(Error::Input(InputError::EmptyCorpus)) => {
            warn!("No documents to train on; no model written");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    model.save(model_path)?;
    println!("model {} written to {}", model.id(), model_path.display());
    Ok(())
}

fn encode(input: &str, model_path: &Path) -> Result<()> {
    let model = Model::load(model_path)?;
    let document = hex::decode(input.trim()).map_err(InputError::from)?;

    let start = Instant::now();
    let blob = model.encode(&document)?;
    let elapsed = start.elapsed();

    let net = document.len() as i64 - blob.len() as i64;
    println!("compressed {} bytes to {} bytes, {} net bytes", document.len(), blob.len(), net);
    println!("original:   {}", hex::encode(&document));
    println!("compressed: {}", hex::encode(&blob));
    println!("took {:?}", elapsed);
    Ok(())
}

fn decode(input: &str, model_path: &Path) -> Result<()> {
    let model = Model::load(model_path)?;
    let blob = hex::decode(input.trim()).map_err(InputError::from)?;

    let start = Instant::now();
    let document = model.decode(&blob)?;
    let elapsed = start.elapsed();

    println!("decoded: {}", hex::encode(&document));
    if let Ok(text) = std::str::from_utf8(&document) {
        println!("text:    {}", text);
    }
    println!("took {:?}", elapsed);
    Ok(())
}

fn inspect(model_path: &Path) -> Result<()> {
    let model = Model::load(model_path)?;
    let summary = model.summary();
    let params = model.params();
    println!("id:           {}", model.id());
    println!("format:       v{}", shared_dict_codec::model::MODEL_VERSION);
    println!("dictionary:   {} bytes, {} entries", model.dictionary().len(), model.dictionary().entry_lengths().len());
    println!("trained on:   {} documents, {} bytes", summary.documents, summary.corpus_bytes);
    println!("min_match:    {}", params.min_match);
    println!("max_chain:    {}", params.max_chain);
    Ok(())
}
