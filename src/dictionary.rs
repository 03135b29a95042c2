//! The shared dictionary: selection of common substrings from a corpus and
//! the hash-chain index the matcher searches.

use fxhash::FxHashMap;
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::corpus::DocumentSource;
use crate::error::InputError;
use crate::suffix::{lcp_array, lcp_intervals, suffix_array};
use crate::token::{MAX_MATCH, MIN_HASH_LEN};

/// Contiguous dictionary bytes plus the boundaries of the substrings they
/// were assembled from. The most valuable entries sit at the end, closest
/// to the document being encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    bytes: Vec<u8>,
    entry_lengths: Vec<u32>,
}

impl Dictionary {
    pub fn from_parts(bytes: Vec<u8>, entry_lengths: Vec<u32>) -> Option<Self> {
        let total: u64 = entry_lengths.iter().map(|&l| l as u64).sum();
        if total != bytes.len() as u64 || entry_lengths.contains(&0) {
            return None;
        }
        Some(Self { bytes, entry_lengths })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn entry_lengths(&self) -> &[u32] {
        &self.entry_lengths
    }

    pub fn entries(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut start = 0usize;
        self.entry_lengths.iter().map(move |&len| {
            let entry = &self.bytes[start..start + len as usize];
            start += len as usize;
            entry
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Position of one occurrence in the joined text.
    start: usize,
    len: usize,
    gain: i64,
    /// Suffix array range holding every occurrence.
    sa_left: usize,
    count: usize,
}

/// Selects dictionary entries from a corpus.
pub struct DictionaryBuilder<'a> {
    config: &'a TrainingConfig,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(config: &'a TrainingConfig) -> Self {
        Self { config }
    }

    pub fn build<S: DocumentSource + ?Sized>(&self, corpus: &S) -> Result<Dictionary, InputError> {
        if corpus.is_empty() {
            return Err(InputError::EmptyCorpus);
        }
        let budget = self.config.dictionary_budget;
        let min_len = self.config.min_match as usize;

        // Joined text: document bytes, each document followed by its own
        // separator symbol. `raw` mirrors it byte-for-byte for comparisons.
        let mut text: Vec<u32> = Vec::new();
        let mut raw: Vec<u8> = Vec::new();
        for i in 0..corpus.len() {
            let doc = corpus.document(i);
            text.extend(doc.iter().map(|&b| b as u32));
            raw.extend_from_slice(&doc);
            text.push(256 + i as u32);
            raw.push(0);
        }
        if budget < min_len || text.len() <= corpus.len() {
            info!("No room for dictionary entries (budget {}, {} bytes of text)", budget, raw.len() - corpus.len());
            return Ok(Dictionary::default());
        }

        let sa = suffix_array(&text);
        let lcp = lcp_array(&text, &sa);
        let max_len = budget.min(MAX_MATCH);

        let mut candidates: Vec<Candidate> = lcp_intervals(&lcp, min_len as u32)
            .into_iter()
            .filter_map(|iv| {
                let len = (iv.depth as usize).min(max_len);
                let gain = (len as i64 - 1) * iv.count as i64 - self.config.entry_overhead as i64;
                (gain > 0).then(|| Candidate {
                    start: sa[iv.left] as usize,
                    len,
                    gain,
                    sa_left: iv.left,
                    count: iv.count,
                })
            })
            .collect();
        info!(
            "Scanned {} documents ({} bytes): {} repeated-substring candidates",
            corpus.len(),
            raw.len() - corpus.len(),
            candidates.len()
        );

        candidates.sort_by(|a, b| rank(&raw, a, b));

        let accepted = select(&raw, &sa, &candidates, budget);
        Ok(assemble(&raw, accepted))
    }
}

/// Descending gain, then longer, then lexicographically smaller, then the
/// earlier occurrence.
fn rank(raw: &[u8], a: &Candidate, b: &Candidate) -> Ordering {
    b.gain
        .cmp(&a.gain)
        .then(b.len.cmp(&a.len))
        .then_with(|| raw[a.start..a.start + a.len].cmp(&raw[b.start..b.start + b.len]))
        .then(a.start.cmp(&b.start))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Greedy selection under the byte budget. Returns accepted candidates in
/// acceptance order.
fn select(raw: &[u8], sa: &[u32], candidates: &[Candidate], budget: usize) -> Vec<Candidate> {
    let mut covered = Coverage::new(raw.len());
    let mut accepted: Vec<Candidate> = Vec::new();
    let mut used = 0usize;
    let min_len = candidates.iter().map(|c| c.len).min().unwrap_or(0);

    for cand in candidates {
        if budget - used < min_len {
            break;
        }
        let occurrences = &sa[cand.sa_left..cand.sa_left + cand.count];
        if occurrences.iter().all(|&p| covered.is_covered(p as usize, cand.len)) {
            continue;
        }
        let bytes = &raw[cand.start..cand.start + cand.len];
        if accepted.iter().any(|a| contains(&raw[a.start..a.start + a.len], bytes)) {
            continue;
        }
        let absorbed: usize = accepted
            .iter()
            .filter(|a| contains(bytes, &raw[a.start..a.start + a.len]))
            .map(|a| a.len)
            .sum();
        if used - absorbed + cand.len > budget {
            continue;
        }
        if absorbed > 0 {
            accepted.retain(|a| !contains(bytes, &raw[a.start..a.start + a.len]));
            debug!("Entry of {} bytes absorbs {} bytes of earlier entries", cand.len, absorbed);
        }
        used = used - absorbed + cand.len;
        for &p in occurrences {
            covered.cover(p as usize, cand.len);
        }
        accepted.push(*cand);
    }
    accepted
}

fn assemble(raw: &[u8], mut accepted: Vec<Candidate>) -> Dictionary {
    // Least valuable first so the best entries end up nearest the document.
    accepted.sort_by(|a, b| rank(raw, b, a));
    let mut bytes = Vec::with_capacity(accepted.iter().map(|c| c.len).sum());
    let mut entry_lengths = Vec::with_capacity(accepted.len());
    for c in &accepted {
        bytes.extend_from_slice(&raw[c.start..c.start + c.len]);
        entry_lengths.push(c.len as u32);
    }
    info!("Dictionary assembled: {} entries, {} bytes", entry_lengths.len(), bytes.len());
    Dictionary { bytes, entry_lengths }
}

/// Tracks which positions of the joined text are already represented by an
/// accepted entry. Fenwick tree over covered-position counts.
struct Coverage {
    marked: Vec<bool>,
    tree: Vec<u32>,
}

impl Coverage {
    fn new(n: usize) -> Self {
        Self { marked: vec![false; n], tree: vec![0; n + 1] }
    }

    fn cover(&mut self, start: usize, len: usize) {
        for p in start..start + len {
            if !self.marked[p] {
                self.marked[p] = true;
                let mut i = p + 1;
                while i < self.tree.len() {
                    self.tree[i] += 1;
                    i += i & i.wrapping_neg();
                }
            }
        }
    }

    fn prefix(&self, end: usize) -> u32 {
        let mut sum = 0;
        let mut i = end;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }

    fn is_covered(&self, start: usize, len: usize) -> bool {
        (self.prefix(start + len) - self.prefix(start)) as usize == len
    }
}

const NO_POS: u32 = u32::MAX;

#[inline]
pub(crate) fn hash_key(bytes: &[u8], pos: usize) -> u32 {
    (bytes[pos] as u32) << 16 | (bytes[pos + 1] as u32) << 8 | bytes[pos + 2] as u32
}

/// Hash chains over the dictionary keyed on exact 3-byte prefixes. `heads`
/// holds the highest position for each prefix and `prev` links to the next
/// lower one, so a walk visits candidates in order of increasing distance.
#[derive(Debug, Clone, Default)]
pub struct DictionaryIndex {
    heads: FxHashMap<u32, u32>,
    prev: Vec<u32>,
}

impl DictionaryIndex {
    pub fn build(dict: &[u8]) -> Self {
        let mut heads = FxHashMap::default();
        let mut prev = vec![NO_POS; dict.len()];
        if dict.len() >= MIN_HASH_LEN {
            for pos in 0..=dict.len() - MIN_HASH_LEN {
                let key = hash_key(dict, pos);
                prev[pos] = heads.insert(key, pos as u32).unwrap_or(NO_POS);
            }
        }
        Self { heads, prev }
    }

    pub(crate) fn head(&self, key: u32) -> Option<u32> {
        self.heads.get(&key).copied()
    }

    pub(crate) fn next(&self, pos: u32) -> Option<u32> {
        match self.prev[pos as usize] {
            NO_POS => None,
            p => Some(p),
        }
    }
}
