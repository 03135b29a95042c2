//! Error taxonomy shared by training, model persistence and the codec.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which of the three failure families an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Model,
    Codec,
}

/// Bad caller input: corpus, records or configuration.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("corpus contains no documents")]
    EmptyCorpus,

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("I/O error reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems with a persisted (or about to be persisted) model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("model truncated: need {needed} bytes, found {found}")]
    Truncated { needed: usize, found: usize },

    #[error("not a model file (bad magic {found:02x?})")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("corrupt model: {0}")]
    Corrupt(String),

    #[error("model serialization failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while encoding or decoding a single document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("corrupt stream at bit {bit_offset} (token {token}): {reason}")]
    CorruptStream {
        bit_offset: usize,
        token: usize,
        reason: &'static str,
    },

    #[error("invalid reference in token {token}: distance {distance} with only {available} bytes available")]
    InvalidReference {
        token: usize,
        distance: u64,
        available: usize,
    },

    #[error("blob was produced by another model (tag {found:#04x}, model tag {expected:#04x})")]
    ModelMismatch { expected: u8, found: u8 },

    #[error("output buffer cannot grow to {requested} bytes")]
    OutputOverflow { requested: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) => ErrorKind::Input,
            Error::Model(_) => ErrorKind::Model,
            Error::Codec(_) => ErrorKind::Codec,
        }
    }
}
