//! Suffix array and LCP construction over a symbol text.
//!
//! Symbols are `u32` so documents can be joined with separators that are
//! unique per document (values above 255); no common prefix can run across
//! a separator.

/// Prefix-doubling construction, O(n log^2 n).
pub fn suffix_array(text: &[u32]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    let mut sa: Vec<u32> = (0..n as u32).collect();
    let mut rank: Vec<u64> = text.iter().map(|&s| s as u64).collect();
    let mut next_rank = vec![0u64; n];
    let mut k = 1usize;

    loop {
        let key = |rank: &[u64], i: u32| -> (u64, u64) {
            let i = i as usize;
            let second = if i + k < n { rank[i + k] + 1 } else { 0 };
            (rank[i], second)
        };
        sa.sort_unstable_by_key(|&i| key(&rank, i));

        next_rank[sa[0] as usize] = 0;
        for w in 1..n {
            let bump = key(&rank, sa[w - 1]) != key(&rank, sa[w]);
            next_rank[sa[w] as usize] = next_rank[sa[w - 1] as usize] + bump as u64;
        }
        std::mem::swap(&mut rank, &mut next_rank);

        if rank[sa[n - 1] as usize] as usize == n - 1 || k >= n {
            break;
        }
        k *= 2;
    }
    sa
}

/// Kasai's algorithm. `lcp[i]` is the common prefix length of the suffixes
/// at `sa[i - 1]` and `sa[i]`; `lcp[0]` is 0.
pub fn lcp_array(text: &[u32], sa: &[u32]) -> Vec<u32> {
    let n = text.len();
    let mut lcp = vec![0u32; n];
    if n == 0 {
        return lcp;
    }
    let mut rank = vec![0usize; n];
    for (r, &pos) in sa.iter().enumerate() {
        rank[pos as usize] = r;
    }
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] > 0 {
            let j = sa[rank[i] - 1] as usize;
            while i + h < n && j + h < n && text[i + h] == text[j + h] {
                h += 1;
            }
            lcp[rank[i]] = h as u32;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}

/// A maximal repeat: `count` suffixes `sa[left..left + count]` share a
/// prefix of `depth` symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcpInterval {
    pub depth: u32,
    pub left: usize,
    pub count: usize,
}

/// Bottom-up traversal of the LCP interval tree, reporting every interval of
/// depth at least `min_depth`.
pub fn lcp_intervals(lcp: &[u32], min_depth: u32) -> Vec<LcpInterval> {
    let n = lcp.len();
    let mut out = Vec::new();
    let mut stack: Vec<(u32, usize)> = vec![(0, 0)];
    for i in 1..=n {
        let cur = if i < n { lcp[i] } else { 0 };
        let mut left = i - 1;
        while let Some(&(depth, lb)) = stack.last() {
            if cur >= depth {
                break;
            }
            stack.pop();
            left = lb;
            if depth >= min_depth {
                out.push(LcpInterval { depth, left: lb, count: i - lb });
            }
        }
        let top = stack.last().map(|&(d, _)| d).unwrap_or(0);
        if cur > top {
            stack.push((cur, left));
        }
    }
    out
}
