// SPDX-License-Identifier: Apache-2.0

//! Seeded random truth tables for the driver's batch mode, benches, and
//! randomized tests.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::truth_table::StaticTruthTable;

pub fn seeded_rng(seed: u64) -> Pcg64Mcg {
    Pcg64Mcg::seed_from_u64(seed)
}

/// Uniformly random function of `num_vars` inputs.
pub fn random_truth_table<const W: usize, R: RngCore>(
    num_vars: u32,
    rng: &mut R,
) -> StaticTruthTable<W> {
    let mut tt = StaticTruthTable::<W>::new(num_vars);
    for w in tt.words_mut() {
        *w = rng.next_u64();
    }
    if num_vars < 6 {
        tt.words_mut()[0] &= (1u64 << (1u32 << num_vars)) - 1;
    }
    tt
}

/// Random function built as `top(free, g(bound))` for a random split of the
/// inputs, so that some free set of size `free_set_size` has multiplicity at
/// most 2.
pub fn random_cascade<const W: usize, R: RngCore>(
    num_vars: u32,
    free_set_size: u32,
    rng: &mut R,
) -> StaticTruthTable<W> {
    assert!(free_set_size < num_vars && free_set_size <= 6);
    assert!(num_vars - free_set_size <= 16);
    // Random ordering of the inputs; the first `free_set_size` are free.
    let mut order: Vec<u32> = (0..num_vars).collect();
    for i in (1..order.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    let bound_vars = num_vars - free_set_size;
    let g_words: Vec<u64> = (0..(1usize << bound_vars).div_ceil(64))
        .map(|_| rng.next_u64())
        .collect();
    let top_low = rng.next_u64();
    let top_high = rng.next_u64();
    let mut tt = StaticTruthTable::<W>::new(num_vars);
    for a in 0..tt.num_bits() {
        let mut f = 0usize;
        for (i, &v) in order[..free_set_size as usize].iter().enumerate() {
            f |= ((a >> v) & 1) << i;
        }
        let mut b = 0usize;
        for (i, &v) in order[free_set_size as usize..].iter().enumerate() {
            b |= ((a >> v) & 1) << i;
        }
        let g = (g_words[b >> 6] >> (b & 63)) & 1 == 1;
        let top = if g { top_high } else { top_low };
        tt.set_bit(a, (top >> f) & 1 == 1);
    }
    tt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search;
    use crate::truth_table::Tt11;

    #[test]
    fn test_random_tables_are_reproducible() {
        let a: Tt11 = random_truth_table(9, &mut seeded_rng(7));
        let b: Tt11 = random_truth_table(9, &mut seeded_rng(7));
        let c: Tt11 = random_truth_table(9, &mut seeded_rng(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_small_random_table_has_no_stray_bits() {
        let tt: Tt11 = random_truth_table(3, &mut seeded_rng(1));
        assert_eq!(tt.words()[0] >> 8, 0);
    }

    #[test]
    fn test_random_cascade_has_low_multiplicity_free_set() {
        let mut rng = seeded_rng(3);
        for _ in 0..8 {
            let tt: Tt11 = random_cascade(8, 3, &mut rng);
            assert!(search(&tt, 3).multiplicity <= 2);
        }
    }
}
