//! Canonical, length-limited Huffman tables.
//!
//! Only the code lengths are persisted; codes are reassigned canonically by
//! (length, symbol) on load, so a table is fully described by its lengths.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;

pub const MAX_CODE_LEN: u8 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    lengths: Vec<u8>,
    codes: Vec<u32>,
    /// Number of codes of each length, index 0 unused.
    counts: [u32; MAX_CODE_LEN as usize + 1],
    /// Symbols ordered by (length, symbol), the canonical decode order.
    sorted: Vec<u16>,
    max_len: u8,
}

/// Outcome of reading one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Symbol(u16),
    /// The bits read are not a prefix of any code.
    NoMatch,
    /// Input ended in the middle of a code.
    Exhausted,
}

impl HuffmanTable {
    /// Builds a table where symbols with zero frequency get no code. Ties
    /// are broken by symbol ordinal so the result is deterministic.
    pub fn from_frequencies(freqs: &[u64]) -> Self {
        let mut weights = freqs.to_vec();
        loop {
            let depths = tree_depths(&weights);
            if depths.iter().all(|&d| d <= MAX_CODE_LEN as u32) {
                let lengths = depths.into_iter().map(|d| d as u8).collect();
                return Self::canonical(lengths);
            }
            for w in weights.iter_mut().filter(|w| **w > 0) {
                *w = (*w + 1) / 2;
            }
        }
    }

    /// Rebuilds a table from persisted code lengths.
    pub fn from_code_lengths(lengths: Vec<u8>) -> Result<Self, String> {
        if lengths.len() > u16::MAX as usize + 1 {
            return Err(format!("alphabet of {} symbols is too large", lengths.len()));
        }
        let mut kraft: u64 = 0;
        for (sym, &len) in lengths.iter().enumerate() {
            if len > MAX_CODE_LEN {
                return Err(format!("symbol {} has code length {}", sym, len));
            }
            if len > 0 {
                kraft += 1u64 << (MAX_CODE_LEN - len);
            }
        }
        if kraft > 1u64 << MAX_CODE_LEN {
            return Err("code lengths are oversubscribed".into());
        }
        Ok(Self::canonical(lengths))
    }

    fn canonical(lengths: Vec<u8>) -> Self {
        let mut counts = [0u32; MAX_CODE_LEN as usize + 1];
        for &len in &lengths {
            if len > 0 {
                counts[len as usize] += 1;
            }
        }

        let mut next = [0u32; MAX_CODE_LEN as usize + 1];
        let mut code = 0u32;
        for len in 1..=MAX_CODE_LEN as usize {
            next[len] = code;
            code = (code + counts[len]) << 1;
        }

        let mut codes = vec![0u32; lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                codes[sym] = next[len as usize];
                next[len as usize] += 1;
            }
        }

        let mut sorted: Vec<u16> = (0..lengths.len() as u32)
            .filter(|&s| lengths[s as usize] > 0)
            .map(|s| s as u16)
            .collect();
        sorted.sort_by_key(|&s| (lengths[s as usize], s));

        let max_len = lengths.iter().copied().max().unwrap_or(0);
        Self { lengths, codes, counts, sorted, max_len }
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    pub fn symbol_count(&self) -> usize {
        self.lengths.len()
    }

    /// `(code, length)` for a symbol; length 0 means the symbol has no code.
    pub fn code(&self, symbol: u16) -> (u32, u8) {
        let s = symbol as usize;
        (self.codes[s], self.lengths[s])
    }

    /// True when every symbol of the alphabet is encodable.
    pub fn is_total(&self) -> bool {
        self.lengths.iter().all(|&l| l > 0)
    }

    pub fn write(&self, w: &mut BitWriter, symbol: u16) -> Result<(), CodecError> {
        let (code, len) = self.code(symbol);
        debug_assert!(len > 0, "symbol {} has no code", symbol);
        w.write_bits(code, len as u32)
    }

    /// Canonical decode, one bit at a time.
    pub fn read(&self, r: &mut BitReader<'_>) -> Lookup {
        let mut code: u32 = 0;
        let mut first: u32 = 0;
        let mut index: u32 = 0;
        for len in 1..=self.max_len as usize {
            let Some(bit) = r.read_bit() else {
                return Lookup::Exhausted;
            };
            code |= bit;
            let count = self.counts[len];
            if code < first + count {
                return Lookup::Symbol(self.sorted[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Lookup::NoMatch
    }
}

/// Plain Huffman tree depths. A lone used symbol gets depth 1.
fn tree_depths(freqs: &[u64]) -> Vec<u32> {
    let mut depths = vec![0u32; freqs.len()];
    let leaves: Vec<usize> = (0..freqs.len()).filter(|&s| freqs[s] > 0).collect();
    match leaves.len() {
        0 => return depths,
        1 => {
            depths[leaves[0]] = 1;
            return depths;
        }
        _ => {}
    }

    // Node ids: leaves in symbol order, then internal nodes in creation order.
    let mut parent: Vec<usize> = vec![usize::MAX; leaves.len()];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = leaves
        .iter()
        .enumerate()
        .map(|(node, &sym)| Reverse((freqs[sym], node)))
        .collect();

    while heap.len() > 1 {
        let (Some(Reverse((fa, a))), Some(Reverse((fb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let id = parent.len();
        parent.push(usize::MAX);
        parent[a] = id;
        parent[b] = id;
        heap.push(Reverse((fa.saturating_add(fb), id)));
    }

    // Parents always have larger ids, so walking down from the root fills
    // every node's depth before its children need it.
    let mut node_depth = vec![0u32; parent.len()];
    for id in (0..parent.len() - 1).rev() {
        node_depth[id] = node_depth[parent[id]] + 1;
    }
    for (node, &sym) in leaves.iter().enumerate() {
        depths[sym] = node_depth[node];
    }
    depths
}
