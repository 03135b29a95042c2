//! Greedy longest-match tokenizer shared by training and encoding.

use fxhash::FxHashMap;

use crate::dictionary::{hash_key, DictionaryIndex};
use crate::token::{Token, MAX_MATCH, MIN_HASH_LEN};

/// Parameters that shape the token stream. They are stored in the model so
/// a reloaded model tokenizes exactly like the one that was trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParams {
    pub min_match: u16,
    pub max_chain: u32,
}

/// Searches the logical buffer `dict ++ doc[..pos]` for the longest prefix
/// of `doc[pos..]`. Document positions are indexed as encoding advances.
pub struct Matcher<'a> {
    dict: &'a [u8],
    index: &'a DictionaryIndex,
    doc: &'a [u8],
    params: MatchParams,
    heads: FxHashMap<u32, u32>,
    prev: Vec<u32>,
}

const NO_POS: u32 = u32::MAX;

impl<'a> Matcher<'a> {
    pub fn new(dict: &'a [u8], index: &'a DictionaryIndex, doc: &'a [u8], params: MatchParams) -> Self {
        Self {
            dict,
            index,
            doc,
            params,
            heads: FxHashMap::default(),
            prev: vec![NO_POS; doc.len()],
        }
    }

    #[inline]
    fn byte_at(&self, abs: usize) -> u8 {
        if abs < self.dict.len() {
            self.dict[abs]
        } else {
            self.doc[abs - self.dict.len()]
        }
    }

    fn match_len(&self, src_abs: usize, pos: usize, limit: usize) -> usize {
        let mut n = 0;
        while n < limit && self.byte_at(src_abs + n) == self.doc[pos + n] {
            n += 1;
        }
        n
    }

    /// Longest match at `pos` as `(distance, length)`. Candidates are visited
    /// nearest first and only a strictly longer match replaces the current
    /// best, so equal lengths resolve to the smallest distance.
    pub fn longest_match(&self, pos: usize) -> Option<(u32, u32)> {
        if pos + MIN_HASH_LEN > self.doc.len() {
            return None;
        }
        let key = hash_key(self.doc, pos);
        let abs = self.dict.len() + pos;
        let limit = (self.doc.len() - pos).min(MAX_MATCH);
        let mut best_len = 0usize;
        let mut best_src = 0usize;
        let mut steps = 0u32;

        let mut cand = self.heads.get(&key).copied();
        while let Some(p) = cand {
            if steps >= self.params.max_chain {
                break;
            }
            steps += 1;
            let src = self.dict.len() + p as usize;
            let len = self.match_len(src, pos, limit);
            if len > best_len {
                best_len = len;
                best_src = src;
                if len == limit {
                    break;
                }
            }
            cand = match self.prev[p as usize] {
                NO_POS => None,
                q => Some(q),
            };
        }

        if best_len < limit {
            let mut steps = 0u32;
            let mut cand = self.index.head(key);
            while let Some(p) = cand {
                if steps >= self.params.max_chain {
                    break;
                }
                steps += 1;
                let len = self.match_len(p as usize, pos, limit);
                if len > best_len {
                    best_len = len;
                    best_src = p as usize;
                    if len == limit {
                        break;
                    }
                }
                cand = self.index.next(p);
            }
        }

        if best_len >= self.params.min_match as usize {
            Some(((abs - best_src) as u32, best_len as u32))
        } else {
            None
        }
    }

    /// Makes `doc[start..end]` visible to later lookups.
    pub fn insert_range(&mut self, start: usize, end: usize) {
        let last = self.doc.len().saturating_sub(MIN_HASH_LEN - 1);
        for pos in start..end.min(last) {
            let key = hash_key(self.doc, pos);
            self.prev[pos] = self.heads.insert(key, pos as u32).unwrap_or(NO_POS);
        }
    }
}

/// Tokenizes a whole document. The caller guarantees
/// `dict.len() + doc.len()` fits in 32 bits.
pub fn tokenize(dict: &[u8], index: &DictionaryIndex, doc: &[u8], params: MatchParams) -> Vec<Token> {
    let mut matcher = Matcher::new(dict, index, doc, params);
    let mut tokens = Vec::with_capacity(doc.len() / 4 + 1);
    let mut pos = 0usize;
    while pos < doc.len() {
        match matcher.longest_match(pos) {
            Some((distance, length)) => {
                tokens.push(Token::Copy { distance, length });
                matcher.insert_range(pos, pos + length as usize);
                pos += length as usize;
            }
            None => {
                tokens.push(Token::Literal(doc[pos]));
                matcher.insert_range(pos, pos + 1);
                pos += 1;
            }
        }
    }
    tokens
}
