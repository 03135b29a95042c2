//! Document to blob.
//!
//! A blob is a 1-byte model tag, a 4-byte little-endian checksum of the
//! document, then the token bitstream terminated by the end symbol and
//! zero-padded to a whole byte.

use crate::bits::BitWriter;
use crate::error::CodecError;
use crate::matcher::tokenize;
use crate::model::{Model, ModelId};
use crate::token::{Token, MAX_MATCH};

pub const BLOB_HEADER_LEN: usize = 5;

/// First four bytes of `blake3(model id || document)`, little-endian.
pub fn checksum(id: &ModelId, document: &[u8]) -> u32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(id.as_bytes());
    hasher.update(document);
    let digest = hasher.finalize();
    let b = digest.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

pub fn encode(model: &Model, document: &[u8]) -> Result<Vec<u8>, CodecError> {
    let dict = model.dictionary().bytes();
    if dict.len() as u64 + document.len() as u64 > u32::MAX as u64 {
        return Err(CodecError::OutputOverflow { requested: dict.len().saturating_add(document.len()) });
    }
    let tokens = tokenize(dict, model.index(), document, model.params());
    encode_tokens(model, &tokens, checksum(&model.id(), document))
}

/// Writes an arbitrary token sequence under `model`. Tokens are not checked
/// against the dictionary, so the result may fail to decode.
pub fn encode_tokens(model: &Model, tokens: &[Token], checksum: u32) -> Result<Vec<u8>, CodecError> {
    let min_match = model.params().min_match;
    let mut header = Vec::with_capacity(BLOB_HEADER_LEN + tokens.len() / 2 + 1);
    header.push(model.id().tag());
    header.extend_from_slice(&checksum.to_le_bytes());

    let mut w = BitWriter::from_prefix(header);
    for (i, &token) in tokens.iter().enumerate() {
        if let Token::Copy { distance, length } = token {
            if distance == 0 || length < min_match as u32 || length as usize > MAX_MATCH {
                return Err(CodecError::CorruptStream {
                    bit_offset: w.bit_len(),
                    token: i,
                    reason: "copy outside the encodable range",
                });
            }
        }
        model.symbols().write_token(&mut w, token, min_match)?;
    }
    model.symbols().write_end(&mut w)?;
    w.finish()
}
