//! Token statistics and the three entropy-coding tables derived from them.

use crossbeam_channel::unbounded;
use std::thread;
use tracing::{debug, info, warn};

use crate::bits::{BitReader, BitWriter};
use crate::corpus::DocumentSource;
use crate::dictionary::{Dictionary, DictionaryIndex};
use crate::error::CodecError;
use crate::huffman::{HuffmanTable, Lookup};
use crate::matcher::{tokenize, MatchParams};
use crate::token::{
    join, split, extra_bits_for, Token, COPY_SYMBOL, DISTANCE_SYMBOLS, END_SYMBOL, LENGTH_SYMBOLS,
    LITERAL_SYMBOLS,
};

/// Weight of one observation relative to the floor every symbol receives.
pub const OBSERVED_WEIGHT: u64 = 64;

/// Raw symbol frequencies for the three streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCounts {
    pub literals: Vec<u64>,
    pub lengths: Vec<u64>,
    pub distances: Vec<u64>,
}

impl Default for SymbolCounts {
    fn default() -> Self {
        Self {
            literals: vec![0; LITERAL_SYMBOLS],
            lengths: vec![0; LENGTH_SYMBOLS],
            distances: vec![0; DISTANCE_SYMBOLS],
        }
    }
}

impl SymbolCounts {
    /// Tallies one document's tokens plus its end marker.
    pub fn record(&mut self, tokens: &[Token], min_match: u16) {
        for token in tokens {
            match *token {
                Token::Literal(b) => self.literals[b as usize] += 1,
                Token::Copy { distance, length } => {
                    self.literals[COPY_SYMBOL as usize] += 1;
                    self.lengths[split(length - min_match as u32).bucket as usize] += 1;
                    self.distances[split(distance - 1).bucket as usize] += 1;
                }
            }
        }
        self.literals[END_SYMBOL as usize] += 1;
    }

    pub fn merge(&mut self, other: &SymbolCounts) {
        for (a, b) in self.literals.iter_mut().zip(&other.literals) {
            *a += b;
        }
        for (a, b) in self.lengths.iter_mut().zip(&other.lengths) {
            *a += b;
        }
        for (a, b) in self.distances.iter_mut().zip(&other.distances) {
            *a += b;
        }
    }
}

/// Literal (with copy and end markers), length and distance tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolModel {
    literals: HuffmanTable,
    lengths: HuffmanTable,
    distances: HuffmanTable,
}

fn smoothed(counts: &[u64]) -> Vec<u64> {
    counts.iter().map(|&c| c.saturating_mul(OBSERVED_WEIGHT).saturating_add(1)).collect()
}

impl SymbolModel {
    /// Every symbol keeps a code, so documents containing bytes, lengths or
    /// distances never seen in training still encode.
    pub fn from_counts(counts: &SymbolCounts) -> Self {
        Self {
            literals: HuffmanTable::from_frequencies(&smoothed(&counts.literals)),
            lengths: HuffmanTable::from_frequencies(&smoothed(&counts.lengths)),
            distances: HuffmanTable::from_frequencies(&smoothed(&counts.distances)),
        }
    }

    /// Validates persisted tables: right alphabet sizes and every symbol coded.
    pub fn from_tables(
        literals: HuffmanTable,
        lengths: HuffmanTable,
        distances: HuffmanTable,
    ) -> Result<Self, String> {
        for (name, table, size) in [
            ("literal", &literals, LITERAL_SYMBOLS),
            ("length", &lengths, LENGTH_SYMBOLS),
            ("distance", &distances, DISTANCE_SYMBOLS),
        ] {
            if table.symbol_count() != size {
                return Err(format!("{} table has {} symbols, expected {}", name, table.symbol_count(), size));
            }
            if !table.is_total() {
                return Err(format!("{} table leaves symbols without a code", name));
            }
        }
        Ok(Self { literals, lengths, distances })
    }

    pub fn literals(&self) -> &HuffmanTable {
        &self.literals
    }

    pub fn lengths(&self) -> &HuffmanTable {
        &self.lengths
    }

    pub fn distances(&self) -> &HuffmanTable {
        &self.distances
    }

    pub fn write_token(&self, w: &mut BitWriter, token: Token, min_match: u16) -> Result<(), CodecError> {
        match token {
            Token::Literal(b) => self.literals.write(w, b as u16),
            Token::Copy { distance, length } => {
                self.literals.write(w, COPY_SYMBOL)?;
                let len = split(length - min_match as u32);
                self.lengths.write(w, len.bucket)?;
                w.write_bits(len.extra, len.extra_bits)?;
                let dist = split(distance - 1);
                self.distances.write(w, dist.bucket)?;
                w.write_bits(dist.extra, dist.extra_bits)
            }
        }
    }

    pub fn write_end(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        self.literals.write(w, END_SYMBOL)
    }

    /// Reads one token; `Ok(None)` is the end marker.
    pub fn read_token(&self, r: &mut BitReader<'_>, min_match: u16, token: usize) -> Result<Option<Token>, CodecError> {
        let sym = lookup(self.literals.read(r), r, token)?;
        match sym {
            END_SYMBOL => Ok(None),
            COPY_SYMBOL => {
                let length = read_bucketed(&self.lengths, r, token)? as u64 + min_match as u64;
                let distance = read_bucketed(&self.distances, r, token)? as u64 + 1;
                if length > u32::MAX as u64 || distance > u32::MAX as u64 {
                    return Err(corrupt(r, token, "copy field out of range"));
                }
                Ok(Some(Token::Copy { distance: distance as u32, length: length as u32 }))
            }
            b => Ok(Some(Token::Literal(b as u8))),
        }
    }
}

fn corrupt(r: &BitReader<'_>, token: usize, reason: &'static str) -> CodecError {
    CodecError::CorruptStream { bit_offset: r.position(), token, reason }
}

fn lookup(result: Lookup, r: &BitReader<'_>, token: usize) -> Result<u16, CodecError> {
    match result {
        Lookup::Symbol(s) => Ok(s),
        Lookup::NoMatch => Err(corrupt(r, token, "bits match no table entry")),
        Lookup::Exhausted => Err(corrupt(r, token, "stream ends mid-token")),
    }
}

fn read_bucketed(table: &HuffmanTable, r: &mut BitReader<'_>, token: usize) -> Result<u32, CodecError> {
    let bucket = lookup(table.read(r), r, token)?;
    let extra = r
        .read_bits(extra_bits_for(bucket))
        .ok_or_else(|| corrupt(r, token, "stream ends mid-token"))?;
    join(bucket, extra).ok_or_else(|| corrupt(r, token, "copy field out of range"))
}

/// Gathers token statistics for a corpus against a candidate dictionary.
pub struct SymbolModelBuilder<'a> {
    dictionary: &'a Dictionary,
    index: &'a DictionaryIndex,
    params: MatchParams,
    workers: usize,
}

impl<'a> SymbolModelBuilder<'a> {
    pub fn new(dictionary: &'a Dictionary, index: &'a DictionaryIndex, params: MatchParams, workers: usize) -> Self {
        Self { dictionary, index, params, workers: workers.max(1) }
    }

    /// Tokenizes every document. Each worker handles one contiguous range of
    /// documents; the per-worker counts are summed, which does not depend on
    /// the order results arrive in.
    pub fn count<S: DocumentSource + ?Sized>(&self, corpus: &S) -> SymbolCounts {
        let n = corpus.len();
        let workers = self.workers.min(n.max(1));
        let chunk = (n + workers - 1) / workers.max(1);
        let (tx, rx) = unbounded::<SymbolCounts>();

        thread::scope(|scope| {
            for w in 0..workers {
                let tx = tx.clone();
                let start = w * chunk;
                let end = ((w + 1) * chunk).min(n);
                scope.spawn(move || {
                    let mut counts = SymbolCounts::default();
                    for i in start..end {
                        let doc = corpus.document(i);
                        if self.dictionary.len() as u64 + doc.len() as u64 > u32::MAX as u64 {
                            warn!("Skipping document {} ({} bytes): too large to tokenize", i, doc.len());
                            continue;
                        }
                        let tokens = tokenize(self.dictionary.bytes(), self.index, &doc, self.params);
                        counts.record(&tokens, self.params.min_match);
                    }
                    let _ = tx.send(counts);
                });
            }
        });
        drop(tx);

        let mut total = SymbolCounts::default();
        for partial in rx.iter() {
            total.merge(&partial);
        }
        debug!(
            "Token statistics: {} literals, {} copies, {} documents",
            total.literals[..256].iter().sum::<u64>(),
            total.literals[COPY_SYMBOL as usize],
            total.literals[END_SYMBOL as usize]
        );
        total
    }

    pub fn build<S: DocumentSource + ?Sized>(&self, corpus: &S) -> SymbolModel {
        let counts = self.count(corpus);
        let model = SymbolModel::from_counts(&counts);
        info!(
            "Symbol tables built ({} workers): max code lengths literal={} length={} distance={}",
            self.workers,
            max_len(&model.literals),
            max_len(&model.lengths),
            max_len(&model.distances)
        );
        model
    }
}

fn max_len(table: &HuffmanTable) -> u8 {
    table.lengths().iter().copied().max().unwrap_or(0)
}
