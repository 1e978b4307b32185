// SPDX-License-Identifier: Apache-2.0

//! Example of multi-threaded use of the decomposition engines: every rayon
//! task owns its own engine, and nothing is shared between them.

use rayon::prelude::*;
use xlsynth_acd::random::{random_cascade, seeded_rng};
use xlsynth_acd::{Acd666, Acd666Params, Tt11};

/// Builds `count` random cascades of `num_vars` inputs from `seed` and
/// returns how many fit three 6-input LUTs, checking every rebuilt network.
pub fn count_decomposable_in_parallel(count: usize, num_vars: u32, seed: u64) -> usize {
    let mut rng = seeded_rng(seed);
    let tables: Vec<Tt11> = (0..count)
        .map(|i| random_cascade(num_vars, 2 + (i as u32 % 4), &mut rng))
        .collect();

    tables
        .par_iter()
        .filter(|tt| {
            let mut acd = Acd666::from_truth_table(tt, Acd666Params::default());
            if !acd.run() {
                return false;
            }
            assert_eq!(acd.compute_decomposition(), 0, "0x{}", tt.to_hex());
            true
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_threads_decompose_cascades() {
        let _ = env_logger::try_init();
        // Every generated function is a two-LUT cascade.
        assert_eq!(count_decomposable_in_parallel(32, 8, 11), 32);
    }
}
