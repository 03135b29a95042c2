//! Blob to document. Every malformed input is reported as a [`CodecError`];
//! nothing here panics on untrusted bytes.

use crate::bits::BitReader;
use crate::encoder::{checksum, BLOB_HEADER_LEN};
use crate::error::CodecError;
use crate::model::Model;
use crate::token::{Token, MAX_MATCH};

fn grow(out: &mut Vec<u8>, additional: usize) -> Result<(), CodecError> {
    out.try_reserve(additional).map_err(|_| CodecError::OutputOverflow {
        requested: out.len().saturating_add(additional),
    })
}

pub fn decode(model: &Model, blob: &[u8]) -> Result<Vec<u8>, CodecError> {
    if blob.len() < BLOB_HEADER_LEN {
        return Err(CodecError::CorruptStream {
            bit_offset: blob.len() * 8,
            token: 0,
            reason: "blob shorter than its header",
        });
    }
    let tag = model.id().tag();
    if blob[0] != tag {
        return Err(CodecError::ModelMismatch { expected: tag, found: blob[0] });
    }
    let expected = u32::from_le_bytes([blob[1], blob[2], blob[3], blob[4]]);

    let dict = model.dictionary().bytes();
    let min_match = model.params().min_match;
    let mut r = BitReader::skipping(blob, BLOB_HEADER_LEN);

    let mut out: Vec<u8> = Vec::new();
    let mut token = 0usize;
    while let Some(t) = model.symbols().read_token(&mut r, min_match, token)? {
        match t {
            Token::Literal(b) => {
                grow(&mut out, 1)?;
                out.push(b);
            }
            Token::Copy { distance, length } => {
                if length as usize > MAX_MATCH {
                    return Err(CodecError::CorruptStream {
                        bit_offset: r.position(),
                        token,
                        reason: "copy longer than the maximum match",
                    });
                }
                let available = dict.len() + out.len();
                if distance as usize > available {
                    return Err(CodecError::InvalidReference { token, distance: distance as u64, available });
                }
                grow(&mut out, length as usize)?;
                // Byte by byte: the source may overlap the bytes being written.
                let start = available - distance as usize;
                for k in 0..length as usize {
                    let abs = start + k;
                    let b = if abs < dict.len() { dict[abs] } else { out[abs - dict.len()] };
                    out.push(b);
                }
            }
        }
        token += 1;
    }

    if !r.only_padding_left() {
        return Err(CodecError::CorruptStream {
            bit_offset: r.position(),
            token,
            reason: "data after the end marker",
        });
    }
    if checksum(&model.id(), &out) != expected {
        return Err(CodecError::CorruptStream {
            bit_offset: r.position(),
            token,
            reason: "checksum mismatch",
        });
    }
    Ok(out)
}
