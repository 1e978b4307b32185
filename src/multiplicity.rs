// SPDX-License-Identifier: Apache-2.0

//! Column multiplicity of a truth table under a free-set/bound-set split.
//!
//! The lowest `k` variables form the free set; the remaining variables form
//! the bound set. Reading the table as a matrix whose columns are indexed by
//! bound-set assignments, each column is a `2^k`-bit pattern (the function of
//! the free set for that bound-set assignment). The column multiplicity is the
//! number of distinct patterns.

use ahash::AHashSet;

use crate::truth_table::StaticTruthTable;

/// Largest free-set size whose columns fit in one machine word.
pub const MAX_COLUMN_VARS: u32 = 6;

/// Counts distinct `2^K`-bit columns with a presence bitmask over all
/// `2^(2^K)` possible patterns (4, 16 or 256 bits for `K` = 1, 2, 3).
#[inline(always)]
fn count_columns_bitmask<const K: u32, const W: usize>(tt: &StaticTruthTable<W>) -> u32 {
    debug_assert!((1..=3).contains(&K));
    let total_columns = 1usize << (tt.num_vars() - K);
    let per_word = total_columns.min(64 >> K);
    let mask = (1u64 << (1u32 << K)) - 1;
    let mut seen = [0u64; 4];
    for &word in tt.words() {
        let mut w = word;
        for _ in 0..per_word {
            let pattern = (w & mask) as usize;
            seen[pattern >> 6] |= 1u64 << (pattern & 63);
            w >>= 1u32 << K;
        }
    }
    seen.iter().map(|m| m.count_ones()).sum()
}

/// Returns the column multiplicity for free-set size `k` (`k <= 6`).
///
/// A free set that is empty, or that swallows every input, leaves a single
/// column and yields 1.
pub fn column_multiplicity<const W: usize>(tt: &StaticTruthTable<W>, k: u32) -> u32 {
    assert!(
        k <= MAX_COLUMN_VARS,
        "column_multiplicity: free-set size {k} is out of range"
    );
    if k == 0 || tt.num_vars() <= k {
        return 1;
    }
    match k {
        1 => count_columns_bitmask::<1, W>(tt),
        2 => count_columns_bitmask::<2, W>(tt),
        3 => count_columns_bitmask::<3, W>(tt),
        _ => {
            let total_columns = 1usize << (tt.num_vars() - k);
            let mut seen: AHashSet<u64> = AHashSet::with_capacity(total_columns.min(1024));
            for index in 0..total_columns {
                seen.insert(tt.column(index, k));
            }
            seen.len() as u32
        }
    }
}

/// Like [`column_multiplicity`] but gives up as soon as more than `limit`
/// distinct columns are seen, returning `limit + 1`.
///
/// Allocation-free; `limit` must be below 16.
pub fn column_multiplicity_bounded<const W: usize>(
    tt: &StaticTruthTable<W>,
    k: u32,
    limit: u32,
) -> u32 {
    assert!(k <= MAX_COLUMN_VARS);
    assert!(limit < 16, "column_multiplicity_bounded: limit {limit} too large");
    if k == 0 || tt.num_vars() <= k {
        return 1;
    }
    let total_columns = 1usize << (tt.num_vars() - k);
    let mut patterns = [0u64; 16];
    let mut count = 0usize;
    for index in 0..total_columns {
        let column = tt.column(index, k);
        if patterns[..count].contains(&column) {
            continue;
        }
        if count as u32 == limit {
            return limit + 1;
        }
        patterns[count] = column;
        count += 1;
    }
    count as u32
}
