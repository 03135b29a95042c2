//! A trained model: dictionary, symbol tables and match parameters, plus the
//! on-disk format used to share it between encoders and decoders.
//!
//! File layout (little-endian):
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | magic `SDCM`                           |
//! | 4      | 2    | format version                          |
//! | 6      | 4    | uncompressed body length               |
//! | 10     | 4    | compressed body length                 |
//! | 14     | 32   | blake3 digest of the uncompressed body |
//! | 46     | ..   | zstd-compressed bincode body           |
//!
//! The body digest doubles as the model's identity.

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{TrainingConfig, MAX_DICTIONARY_BUDGET, MAX_MIN_MATCH};
use crate::corpus::DocumentSource;
use crate::dictionary::{Dictionary, DictionaryBuilder, DictionaryIndex};
use crate::error::{CodecError, InputError, ModelError, Result};
use crate::huffman::HuffmanTable;
use crate::matcher::MatchParams;
use crate::symbols::{SymbolModel, SymbolModelBuilder};
use crate::token::MIN_HASH_LEN;
use crate::{decoder, encoder};

pub const MODEL_MAGIC: [u8; 4] = *b"SDCM";
pub const MODEL_VERSION: u16 = 1;
pub const MODEL_HEADER_LEN: usize = 46;

const ZSTD_LEVEL: i32 = 19;

/// Identity of a model: the blake3 digest of its serialized body.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId([u8; 32]);

impl ModelId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First byte, stamped on every blob this model produces.
    pub fn tag(&self) -> u8 {
        self.0[0]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.to_hex())
    }
}

/// What the model was trained on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub documents: u64,
    pub corpus_bytes: u64,
}

#[derive(Serialize, Deserialize)]
struct ModelBody {
    #[serde(with = "serde_bytes")]
    dictionary: Vec<u8>,
    entry_lengths: Vec<u32>,
    #[serde(with = "serde_bytes")]
    literal_lengths: Vec<u8>,
    #[serde(with = "serde_bytes")]
    length_lengths: Vec<u8>,
    #[serde(with = "serde_bytes")]
    distance_lengths: Vec<u8>,
    min_match: u16,
    max_chain: u32,
    documents: u64,
    corpus_bytes: u64,
}

/// Immutable once built; share it across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Model {
    dictionary: Dictionary,
    index: DictionaryIndex,
    symbols: SymbolModel,
    params: MatchParams,
    summary: TrainingSummary,
    id: ModelId,
}

impl Model {
    /// Trains a model on `corpus`: dictionary selection, then a parallel
    /// statistics pass over the same documents, then table construction.
    #[tracing::instrument(skip_all, fields(documents = corpus.len()))]
    pub fn train<S: DocumentSource + ?Sized>(corpus: &S, config: &TrainingConfig) -> Result<Model> {
        config.validate()?;
        if corpus.is_empty() {
            return Err(InputError::EmptyCorpus.into());
        }
        let started = Instant::now();

        let dictionary = DictionaryBuilder::new(config).build(corpus)?;
        let index = DictionaryIndex::build(dictionary.bytes());
        let params = MatchParams { min_match: config.min_match, max_chain: config.max_chain };
        let workers = config.worker_count();
        let symbols = SymbolModelBuilder::new(&dictionary, &index, params, workers).build(corpus);

        let corpus_bytes = (0..corpus.len()).map(|i| corpus.document(i).len() as u64).sum();
        let summary = TrainingSummary { documents: corpus.len() as u64, corpus_bytes };

        let model = Model::assemble(dictionary, index, symbols, params, summary)?;
        info!(
            "Model {} trained in {:?}: {} documents, {} corpus bytes, {} byte dictionary",
            model.id,
            started.elapsed(),
            summary.documents,
            summary.corpus_bytes,
            model.dictionary.len()
        );
        Ok(model)
    }

    fn assemble(
        dictionary: Dictionary,
        index: DictionaryIndex,
        symbols: SymbolModel,
        params: MatchParams,
        summary: TrainingSummary,
    ) -> std::result::Result<Model, ModelError> {
        let body = body_of(&dictionary, &symbols, params, summary);
        let raw = bincode::serialize(&body)?;
        let id = ModelId(*blake3::hash(&raw).as_bytes());
        Ok(Model { dictionary, index, symbols, params, summary, id })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub(crate) fn index(&self) -> &DictionaryIndex {
        &self.index
    }

    pub fn symbols(&self) -> &SymbolModel {
        &self.symbols
    }

    pub fn params(&self) -> MatchParams {
        self.params
    }

    pub fn summary(&self) -> TrainingSummary {
        self.summary
    }

    pub fn encode(&self, document: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        encoder::encode(self, document)
    }

    pub fn decode(&self, blob: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
        decoder::decode(self, blob)
    }

    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, ModelError> {
        let body = body_of(&self.dictionary, &self.symbols, self.params, self.summary);
        let raw = bincode::serialize(&body)?;
        let compressed = zstd::bulk::compress(&raw, ZSTD_LEVEL)?;
        let body_len = u32::try_from(raw.len())
            .map_err(|_| ModelError::Corrupt(format!("body of {} bytes is too large", raw.len())))?;
        let compressed_len = u32::try_from(compressed.len())
            .map_err(|_| ModelError::Corrupt(format!("compressed body of {} bytes is too large", compressed.len())))?;

        let mut out = Vec::with_capacity(MODEL_HEADER_LEN + compressed.len());
        out.extend_from_slice(&MODEL_MAGIC);
        out.extend_from_slice(&MODEL_VERSION.to_le_bytes());
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(&compressed_len.to_le_bytes());
        out.extend_from_slice(blake3::hash(&raw).as_bytes());
        out.extend_from_slice(&compressed);
        debug!("Serialized model {}: {} body bytes, {} on disk", self.id, raw.len(), out.len());
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Model, ModelError> {
        if bytes.len() < MODEL_MAGIC.len() {
            return Err(ModelError::Truncated { needed: MODEL_HEADER_LEN, found: bytes.len() });
        }
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MODEL_MAGIC {
            return Err(ModelError::BadMagic { found: magic });
        }
        if bytes.len() < MODEL_HEADER_LEN {
            return Err(ModelError::Truncated { needed: MODEL_HEADER_LEN, found: bytes.len() });
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != MODEL_VERSION {
            return Err(ModelError::UnsupportedVersion { found: version, expected: MODEL_VERSION });
        }
        let body_len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        let compressed_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]) as usize;
        let digest = &bytes[14..MODEL_HEADER_LEN];

        let needed = MODEL_HEADER_LEN + compressed_len;
        if bytes.len() < needed {
            return Err(ModelError::Truncated { needed, found: bytes.len() });
        }
        if bytes.len() > needed {
            return Err(ModelError::Corrupt(format!("{} trailing bytes after body", bytes.len() - needed)));
        }

        let raw = zstd::bulk::decompress(&bytes[MODEL_HEADER_LEN..], body_len)
            .map_err(|e| ModelError::Corrupt(format!("body does not decompress: {}", e)))?;
        if raw.len() != body_len {
            return Err(ModelError::Corrupt(format!(
                "body is {} bytes, header says {}",
                raw.len(),
                body_len
            )));
        }
        let hash = blake3::hash(&raw);
        if hash.as_bytes()[..] != digest[..] {
            return Err(ModelError::Corrupt("body digest mismatch".into()));
        }
        let body: ModelBody = bincode::deserialize(&raw)
            .map_err(|e| ModelError::Corrupt(format!("body does not parse: {}", e)))?;

        let model = Model::from_body(body, ModelId(*hash.as_bytes())).map_err(ModelError::Corrupt)?;
        Ok(model)
    }

    fn from_body(body: ModelBody, id: ModelId) -> std::result::Result<Model, String> {
        if !(MIN_HASH_LEN as u16..=MAX_MIN_MATCH).contains(&body.min_match) {
            return Err(format!("min_match {} out of range", body.min_match));
        }
        if body.max_chain == 0 {
            return Err("max_chain is zero".into());
        }
        if body.dictionary.len() > MAX_DICTIONARY_BUDGET {
            return Err(format!("dictionary of {} bytes exceeds the maximum", body.dictionary.len()));
        }
        let dictionary = Dictionary::from_parts(body.dictionary, body.entry_lengths)
            .ok_or_else(|| "entry lengths do not cover the dictionary".to_string())?;
        let symbols = SymbolModel::from_tables(
            HuffmanTable::from_code_lengths(body.literal_lengths)?,
            HuffmanTable::from_code_lengths(body.length_lengths)?,
            HuffmanTable::from_code_lengths(body.distance_lengths)?,
        )?;
        let index = DictionaryIndex::build(dictionary.bytes());
        Ok(Model {
            dictionary,
            index,
            symbols,
            params: MatchParams { min_match: body.min_match, max_chain: body.max_chain },
            summary: TrainingSummary { documents: body.documents, corpus_bytes: body.corpus_bytes },
            id,
        })
    }

    /// Writes to a sibling temp file and renames it into place, so readers
    /// never observe a partial model.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ModelError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        info!("Saved model {} to {} ({} bytes)", self.id, path.display(), bytes.len());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Model, ModelError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ModelError::Missing(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Err(ModelError::Truncated { needed: MODEL_HEADER_LEN, found: 0 });
        }
        let mmap = unsafe { Mmap::map(&file)? };
        let model = Model::from_bytes(&mmap)?;
        info!(
            "Loaded model {} from {}: {} byte dictionary, {} entries",
            model.id,
            path.display(),
            model.dictionary.len(),
            model.dictionary.entry_lengths().len()
        );
        Ok(model)
    }
}

fn body_of(dictionary: &Dictionary, symbols: &SymbolModel, params: MatchParams, summary: TrainingSummary) -> ModelBody {
    ModelBody {
        dictionary: dictionary.bytes().to_vec(),
        entry_lengths: dictionary.entry_lengths().to_vec(),
        literal_lengths: symbols.literals().lengths().to_vec(),
        length_lengths: symbols.lengths().lengths().to_vec(),
        distance_lengths: symbols.distances().lengths().to_vec(),
        min_match: params.min_match,
        max_chain: params.max_chain,
        documents: summary.documents,
        corpus_bytes: summary.corpus_bytes,
    }
}
