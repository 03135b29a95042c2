//! shared_dict_codec: compression for large numbers of small, similar records
//! using a dictionary and entropy tables trained once on a sample corpus.
//!
//! # Usage
//! ```no_run
//! use shared_dict_codec::{Model, TrainingConfig};
//!
//! let corpus = vec![
//!     br#"{"level":"info","msg":"started"}"#.to_vec(),
//!     br#"{"level":"info","msg":"stopped"}"#.to_vec(),
//! ];
//! let model = Model::train(&corpus, &TrainingConfig::default())?;
//! let blob = model.encode(br#"{"level":"info","msg":"restarted"}"#)?;
//! assert_eq!(model.decode(&blob)?, br#"{"level":"info","msg":"restarted"}"#.to_vec());
//! # Ok::<(), shared_dict_codec::Error>(())
//! ```

pub mod bits;
pub mod config;
pub mod corpus;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod huffman;
pub mod matcher;
pub mod model;
pub mod suffix;
pub mod symbols;
pub mod token;

pub use config::TrainingConfig;
pub use corpus::{DocumentSource, RecordCorpus};
pub use dictionary::Dictionary;
pub use error::{CodecError, Error, ErrorKind, InputError, ModelError, Result};
pub use model::{Model, ModelId, TrainingSummary};
pub use symbols::SymbolModel;
pub use token::Token;
