//! Tokens and the bucketing used to keep the length and distance tables small.

/// Length of the prefix the hash chains are keyed on.
pub const MIN_HASH_LEN: usize = 3;
pub const MAX_MATCH: usize = 1 << 16;

pub const COPY_SYMBOL: u16 = 256;
pub const END_SYMBOL: u16 = 257;
pub const LITERAL_SYMBOLS: usize = 258;
pub const LENGTH_SYMBOLS: usize = 32;
pub const DISTANCE_SYMBOLS: usize = 64;

/// One unit of the compressed representation.
///
/// `distance` counts backwards from the current position in the logical
/// buffer (dictionary followed by output so far), so `distance == 1` repeats
/// the previous byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Copy { distance: u32, length: u32 },
}

/// A value split into its table symbol plus raw extra bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketed {
    pub bucket: u16,
    pub extra_bits: u32,
    pub extra: u32,
}

/// Values below 4 are their own bucket. Above that each power of two is
/// split in two halves, so bucket `2n + h` covers `[(2 + h) << (n - 1), ..)`
/// with `n - 1` extra bits.
pub fn split(value: u32) -> Bucketed {
    if value < 4 {
        return Bucketed { bucket: value as u16, extra_bits: 0, extra: 0 };
    }
    let n = 31 - value.leading_zeros();
    let half = (value >> (n - 1)) & 1;
    let extra_bits = n - 1;
    Bucketed {
        bucket: (2 * n + half) as u16,
        extra_bits,
        extra: value & ((1u32 << extra_bits) - 1),
    }
}

/// Extra bits that follow `bucket`.
pub fn extra_bits_for(bucket: u16) -> u32 {
    if bucket < 4 {
        0
    } else {
        bucket as u32 / 2 - 1
    }
}

/// Inverse of [`split`]; `None` when the bucket cannot be represented in 32 bits.
pub fn join(bucket: u16, extra: u32) -> Option<u32> {
    if bucket < 4 {
        return Some(bucket as u32);
    }
    let n = bucket as u32 / 2;
    if n > 31 {
        return None;
    }
    let half = bucket as u32 & 1;
    // n <= 31, so the base is at most 3 << 30
    let base = (2 + half) << (n - 1);
    base.checked_add(extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_have_no_extra_bits() {
        for v in 0..4 {
            assert_eq!(split(v), Bucketed { bucket: v as u16, extra_bits: 0, extra: 0 });
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(split(4), Bucketed { bucket: 4, extra_bits: 1, extra: 0 });
        assert_eq!(split(5), Bucketed { bucket: 4, extra_bits: 1, extra: 1 });
        assert_eq!(split(6), Bucketed { bucket: 5, extra_bits: 1, extra: 0 });
        assert_eq!(split(8), Bucketed { bucket: 6, extra_bits: 2, extra: 0 });
        assert_eq!(split(17).bucket, 8);
        assert_eq!(split(u32::MAX).bucket, 63);
        assert!(split((MAX_MATCH - MIN_HASH_LEN) as u32).bucket < LENGTH_SYMBOLS as u16);
    }

    #[test]
    fn test_join_inverts_split() {
        let samples = [0u32, 1, 3, 4, 7, 8, 100, 1023, 1024, 65_533, 1 << 20, u32::MAX - 1, u32::MAX];
        for v in samples {
            let b = split(v);
            assert_eq!(extra_bits_for(b.bucket), b.extra_bits);
            assert_eq!(join(b.bucket, b.extra), Some(v), "value {}", v);
        }
    }

    #[test]
    fn test_join_rejects_out_of_range_bucket() {
        assert_eq!(join(64, 0), None);
    }
}
