// SPDX-License-Identifier: Apache-2.0

//! Structural properties of multiplicity and of independent engine
//! instances.

use rand::Rng;
use rayon::prelude::*;
use xlsynth_acd::multiplicity::column_multiplicity;
use xlsynth_acd::search::search;
use xlsynth_acd::random::{random_cascade, random_truth_table, seeded_rng};
use xlsynth_acd::{Acd666, Acd666Params, Tt11};

#[test]
fn test_multiplicity_ignores_order_within_each_set() {
    let mut rng = seeded_rng(17);
    for _ in 0..16 {
        let n = rng.gen_range(4..=9u32);
        let k = rng.gen_range(1..n.min(6));
        let tt: Tt11 = random_truth_table(n, &mut rng);
        let want = column_multiplicity(&tt, k);
        let mut shuffled = tt.clone();
        for _ in 0..8 {
            // Pick two positions on the same side of the free/bound split.
            let (lo, hi) = if rng.gen_bool(0.5) && k >= 2 { (0, k) } else { (k, n) };
            if hi - lo < 2 {
                continue;
            }
            let i = rng.gen_range(lo..hi);
            let j = rng.gen_range(lo..hi);
            shuffled.swap_inplace(i, j);
        }
        assert_eq!(column_multiplicity(&shuffled, k), want, "n={n} k={k}");
    }
}

#[test]
fn test_searched_multiplicity_at_most_halves_per_extra_free_variable() {
    let mut rng = seeded_rng(23);
    for _ in 0..6 {
        let tt: Tt11 = random_truth_table(8, &mut rng);
        // Each column of a free set of k + 1 variables splits into two
        // columns of any k-subset of it.
        let best: Vec<u32> = (1..=5).map(|k| search(&tt, k).multiplicity).collect();
        for k in 1..=5u32 {
            assert!(best[k as usize - 1] <= 1 << (8 - k));
        }
        for k in 0..4 {
            assert!(best[k] <= 2 * best[k + 1], "k={} best={:?}", k + 1, best);
        }
    }
}

#[test]
fn test_parallel_engines_agree_with_serial_run() {
    let mut rng = seeded_rng(99);
    let tables: Vec<Tt11> = (0..24)
        .map(|i| {
            if i % 2 == 0 {
                random_cascade(9, 3, &mut rng)
            } else {
                random_truth_table(8, &mut rng)
            }
        })
        .collect();
    let decide = |tt: &Tt11| {
        let mut acd = Acd666::from_truth_table(tt, Acd666Params::default());
        let ok = acd.run();
        (ok, ok.then(|| acd.compute_decomposition()))
    };
    let serial: Vec<_> = tables.iter().map(decide).collect();
    let parallel: Vec<_> = tables.par_iter().map(decide).collect();
    assert_eq!(serial, parallel);
    for (i, (ok, status)) in serial.iter().enumerate() {
        if i % 2 == 0 {
            assert!(ok, "cascade {i} must decompose");
        }
        if *ok {
            assert_eq!(*status, Some(0));
        }
    }
}
