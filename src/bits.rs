//! MSB-first bit packing for the token stream.

use crate::error::CodecError;

/// Accumulates bits and flushes whole bytes into a growable buffer.
pub struct BitWriter {
    out: Vec<u8>,
    acc: u64,
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self { out: Vec::with_capacity(bytes), acc: 0, pending: 0 }
    }

    /// Starts from an existing prefix (e.g. a blob header).
    pub fn from_prefix(prefix: Vec<u8>) -> Self {
        Self { out: prefix, acc: 0, pending: 0 }
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u32) -> Result<(), CodecError> {
        debug_assert!(count <= 32);
        if count == 0 {
            return Ok(());
        }
        let mask = if count == 32 { u32::MAX } else { (1u32 << count) - 1 };
        self.acc = (self.acc << count) | (value & mask) as u64;
        self.pending += count;
        while self.pending >= 8 {
            self.pending -= 8;
            let byte = (self.acc >> self.pending) as u8;
            self.push(byte)?;
        }
        self.acc &= (1u64 << self.pending) - 1;
        Ok(())
    }

    pub fn bit_len(&self) -> usize {
        self.out.len() * 8 + self.pending as usize
    }

    /// Pads the final partial byte with zeros and returns the buffer.
    pub fn finish(mut self) -> Result<Vec<u8>, CodecError> {
        if self.pending > 0 {
            let byte = (self.acc << (8 - self.pending)) as u8;
            self.pending = 0;
            self.push(byte)?;
        }
        Ok(self.out)
    }

    fn push(&mut self, byte: u8) -> Result<(), CodecError> {
        if self.out.len() == self.out.capacity() {
            let grow = self.out.capacity().max(64);
            self.out.try_reserve(grow).map_err(|_| CodecError::OutputOverflow {
                requested: self.out.len().saturating_add(grow),
            })?;
        }
        self.out.push(byte);
        Ok(())
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bits back in the order [`BitWriter`] wrote them. Running out of
/// input is reported as `None` rather than padded with zeros.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Starts reading after the first `bytes` bytes.
    pub fn skipping(data: &'a [u8], bytes: usize) -> Self {
        Self { data, pos: bytes.min(data.len()) * 8 }
    }

    pub fn read_bit(&mut self) -> Option<u32> {
        let byte = *self.data.get(self.pos / 8)?;
        let bit = (byte >> (7 - (self.pos % 8))) & 1;
        self.pos += 1;
        Some(bit as u32)
    }

    pub fn read_bits(&mut self, count: u32) -> Option<u32> {
        debug_assert!(count <= 32);
        if self.remaining() < count as usize {
            return None;
        }
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Some(value as u32)
    }

    /// Bit offset of the next unread bit.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// True when everything left is fewer than 8 zero bits.
    pub fn only_padding_left(&self) -> bool {
        let left = self.remaining();
        if left >= 8 {
            return false;
        }
        if left == 0 {
            return true;
        }
        let last = self.data[self.data.len() - 1];
        last & ((1u8 << left) - 1) == 0
    }
}
