// SPDX-License-Identifier: Apache-2.0

//! Decomposition into two cascaded 6-input LUTs.
//!
//! Shape of a solution with free set `F`, bound set `B`, and optional shared
//! variable `s` in `B`:
//!
//! ```text
//! g = LUT_B(B)                  |B| <= 6
//! f = LUT_top(F, [s], g)        |F| + 1 (+1) <= 6
//! ```
//!
//! Without a shared variable the bound set must induce at most two distinct
//! columns. With one, each cofactor of `s` may induce at most two, so up to
//! four columns are accepted.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::acd_error::AcdError;
use crate::decomposition_utils::{
    bitvec_from_fn, column_classes, min_base, shared_variable_split, to_bitvec,
};
use crate::lut_network::{LutNetwork, LutSignal};
use crate::multiplicity::column_multiplicity_bounded;
use crate::search::{VarPerm, for_each_free_set, place_late_arriving};
use crate::truth_table::Tt11;

/// Inputs per LUT.
pub const LUT_SIZE: u32 = 6;

/// Largest function the cascade engines accept.
pub const ACD66_MAX_VARS: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acd66Params {
    /// Allow one bound-set variable to also feed the top LUT.
    pub allow_shared_set: bool,
    /// Re-simulate the rebuilt network in `compute_decomposition`.
    pub verify: bool,
}

impl Default for Acd66Params {
    fn default() -> Self {
        Self {
            allow_shared_set: true,
            verify: true,
        }
    }
}

/// An accepted arrangement.
#[derive(Debug, Clone)]
pub struct Acd66Solution {
    /// The function with the free set moved to the low positions.
    pub tt: Tt11,
    pub perm: VarPerm,
    /// Equal to the variable count when the function fits one LUT.
    pub free_set_size: u32,
    pub multiplicity: u32,
    /// Position (in `tt`) of the bound-set variable shared with the top LUT.
    pub shared_position: Option<u32>,
}

impl Acd66Solution {
    pub fn num_luts(&self) -> usize {
        if self.free_set_size == self.tt.num_vars() || self.multiplicity == 1 {
            1
        } else {
            2
        }
    }
}

pub struct Acd66 {
    tt: Tt11,
    params: Acd66Params,
    solution: Option<Acd66Solution>,
    network: Option<LutNetwork>,
}

impl Acd66 {
    pub fn new(words: &[u64], num_vars: u32, params: Acd66Params) -> Result<Self, AcdError> {
        let tt = Tt11::from_words(num_vars, words)?;
        Ok(Self::from_truth_table(&tt, params))
    }

    pub fn from_truth_table(tt: &Tt11, params: Acd66Params) -> Self {
        Self {
            tt: tt.clone(),
            params,
            solution: None,
            network: None,
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.tt.num_vars()
    }

    /// Returns true if the function fits the two-LUT cascade.
    pub fn run(&mut self) -> bool {
        self.run_late_arriving(&[])
    }

    /// Like [`Acd66::run`], but every variable in `late` must feed the top
    /// LUT directly.
    pub fn run_late_arriving(&mut self, late: &[u32]) -> bool {
        self.network = None;
        self.solution = find_acd66(&self.tt, late, &self.params);
        self.solution.is_some()
    }

    pub fn solution(&self) -> Option<&Acd66Solution> {
        self.solution.as_ref()
    }

    /// Builds the LUT network for the accepted arrangement and, if enabled,
    /// checks it against the function.
    ///
    /// Returns 0 on success and 1 if the network disagrees with the function.
    /// Panics if `run` has not succeeded.
    pub fn compute_decomposition(&mut self) -> i32 {
        let solution = self
            .solution
            .as_ref()
            .expect("compute_decomposition called without a successful run");
        let network = build_acd66_network(solution);
        let status = if self.params.verify && !network.matches_truth_table(&self.tt) {
            log::error!(
                "acd66: rebuilt network disagrees with function 0x{}",
                self.tt.to_hex()
            );
            1
        } else {
            0
        };
        self.network = Some(network);
        status
    }

    pub fn get_result_ntk(&self) -> Option<LutNetwork> {
        self.network.clone()
    }

    pub fn num_luts(&self) -> Option<usize> {
        self.solution.as_ref().map(|s| s.num_luts())
    }

    pub fn num_edges(&self) -> Option<usize> {
        self.network.as_ref().map(|n| n.num_edges())
    }
}

/// Searches for a two-LUT cascade, trying free-set sizes in increasing order
/// and arrangements in enumeration order; the first acceptable one wins.
pub(crate) fn find_acd66(tt: &Tt11, late: &[u32], params: &Acd66Params) -> Option<Acd66Solution> {
    let num_vars = tt.num_vars();
    assert!(
        num_vars <= ACD66_MAX_VARS,
        "acd66: {num_vars} variables exceed {ACD66_MAX_VARS}"
    );
    if num_vars > LUT_SIZE && late.len() as u32 >= LUT_SIZE {
        // The top LUT needs one input for the bound-set function.
        return None;
    }
    if num_vars <= LUT_SIZE {
        return Some(Acd66Solution {
            tt: tt.clone(),
            perm: VarPerm::identity(num_vars),
            free_set_size: num_vars,
            multiplicity: 1,
            shared_position: None,
        });
    }

    let mut work = tt.clone();
    let mut perm = VarPerm::identity(num_vars);
    place_late_arriving(&mut work, &mut perm, late);
    let offset = late.len() as u32;

    let low = (num_vars - LUT_SIZE).max(offset);
    for free_set_size in low..LUT_SIZE {
        let mut found: Option<Acd66Solution> = None;
        let _ = for_each_free_set(&mut work, &mut perm, free_set_size, offset, |cand, p| {
            let multiplicity = column_multiplicity_bounded(cand, free_set_size, 4);
            if multiplicity <= 2 {
                found = Some(Acd66Solution {
                    tt: cand.clone(),
                    perm: *p,
                    free_set_size,
                    multiplicity,
                    shared_position: None,
                });
                return ControlFlow::Break(());
            }
            if params.allow_shared_set && multiplicity <= 4 && free_set_size + 2 <= LUT_SIZE {
                if let Some(split) = shared_variable_split(cand, free_set_size) {
                    found = Some(Acd66Solution {
                        tt: cand.clone(),
                        perm: *p,
                        free_set_size,
                        multiplicity,
                        shared_position: Some(split.position),
                    });
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        if let Some(solution) = found {
            log::debug!(
                "acd66: n={} free set {} multiplicity {} shared {:?} perm {:?}",
                num_vars,
                solution.free_set_size,
                solution.multiplicity,
                solution.shared_position,
                solution.perm.as_slice()
            );
            return Some(solution);
        }
    }
    log::trace!("acd66: no two-LUT cascade for 0x{}", tt.to_hex());
    None
}

/// Rebuilds the network described by `solution`. Network inputs are the
/// original (unpermuted) variables.
pub(crate) fn build_acd66_network(solution: &Acd66Solution) -> LutNetwork {
    let tt = &solution.tt;
    let perm = &solution.perm;
    let num_vars = tt.num_vars();
    let k = solution.free_set_size;
    let mut network = LutNetwork::new(num_vars);
    let input = |position: u32| LutSignal::Input(perm.var_at(position));
    let free_fanins: Vec<LutSignal> = (0..k).map(input).collect();

    if k == num_vars {
        let lut = network.add_lut(free_fanins, to_bitvec(tt));
        network.set_output(lut);
        return network;
    }

    let bound_vars = num_vars - k;
    match solution.shared_position {
        None => {
            let classes = column_classes(tt, k);
            debug_assert!(classes.multiplicity() <= 2);
            if classes.multiplicity() == 1 {
                let pattern = classes.patterns[0];
                let top =
                    network.add_lut(free_fanins, bitvec_from_fn(k, |f| (pattern >> f) & 1 == 1));
                network.set_output(top);
                return network;
            }
            let g = bound_set_lut(&mut network, tt, perm, k, |b| classes.class_of[b] == 1);
            let mut fanins = free_fanins;
            fanins.push(g);
            let top_function = bitvec_from_fn(k + 1, |index| {
                let f = index & ((1usize << k) - 1);
                let code = index >> k;
                (classes.patterns[code] >> f) & 1 == 1
            });
            let top = network.add_lut(fanins, top_function);
            network.set_output(top);
        }
        Some(shared) => {
            let split = shared_variable_split(tt, k)
                .filter(|s| s.position == shared)
                .expect("acd66: recorded shared variable no longer splits the columns");
            let bit = shared - k;
            debug_assert!(bit < bound_vars);
            let g = bound_set_lut(&mut network, tt, perm, k, |b| {
                let half = (b >> bit) & 1;
                tt.column(b, k) != split.patterns[half][0]
            });
            let mut fanins = free_fanins;
            fanins.push(input(shared));
            fanins.push(g);
            let top_function = bitvec_from_fn(k + 2, |index| {
                let f = index & ((1usize << k) - 1);
                let half = (index >> k) & 1;
                let code = (index >> (k + 1)) & 1;
                (split.patterns[half][code] >> f) & 1 == 1
            });
            let top = network.add_lut(fanins, top_function);
            network.set_output(top);
        }
    }
    network
}

/// Adds the bound-set LUT computing `g(b)` over positions `k..n` of `tt`,
/// with unused inputs removed.
pub(crate) fn bound_set_lut(
    network: &mut LutNetwork,
    tt: &Tt11,
    perm: &VarPerm,
    k: u32,
    g: impl Fn(usize) -> bool,
) -> LutSignal {
    let bound_vars = tt.num_vars() - k;
    let mut g_tt = Tt11::new(bound_vars);
    for b in 0..(1usize << bound_vars) {
        g_tt.set_bit(b, g(b));
    }
    let (g_tt, positions) = min_base(&g_tt);
    if positions.is_empty() {
        return LutSignal::Const(g_tt.get_bit(0));
    }
    let fanins = positions
        .iter()
        .map(|&p| LutSignal::Input(perm.var_at(k + p)))
        .collect();
    network.add_lut(fanins, to_bitvec(&g_tt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SHARED_CASCADE_8_HEX, THREE_LUT_8_WORDS};

    #[test]
    fn test_decomposable_needs_shared_variable() {
        let tt = Tt11::from_hex(8, SHARED_CASCADE_8_HEX).unwrap();
        let mut acd = Acd66::from_truth_table(&tt, Acd66Params::default());
        assert!(acd.run());
        let solution = acd.solution().unwrap();
        assert!(solution.shared_position.is_some());
        assert_eq!(acd.compute_decomposition(), 0);
        assert_eq!(acd.num_luts(), Some(2));

        let mut no_shared = Acd66::from_truth_table(
            &tt,
            Acd66Params {
                allow_shared_set: false,
                ..Acd66Params::default()
            },
        );
        assert!(!no_shared.run());
    }

    #[test]
    fn test_adversarial_is_rejected() {
        let mut acd = Acd66::new(&THREE_LUT_8_WORDS, 8, Acd66Params::default()).unwrap();
        assert!(!acd.run());
        assert!(acd.solution().is_none());
    }

    #[test]
    fn test_small_function_is_one_lut() {
        let tt = Tt11::from_hex(5, "deadbeef").unwrap();
        let mut acd = Acd66::from_truth_table(&tt, Acd66Params::default());
        assert!(acd.run());
        assert_eq!(acd.compute_decomposition(), 0);
        let ntk = acd.get_result_ntk().unwrap();
        assert_eq!(ntk.num_luts(), 1);
        assert_eq!(ntk.num_edges(), 5);
    }

    #[test]
    fn test_plain_cascade_structure() {
        // f = (x0 ^ x1) & majority(x2..x8 minus some) style: and of a 2-input
        // free function with a 6-input bound function.
        let mut tt = Tt11::new(8);
        for i in 0..256usize {
            let free = ((i & 1) ^ ((i >> 1) & 1)) == 1;
            let bound = ((i >> 2) & 0x3F).count_ones() >= 3;
            tt.set_bit(i, free && bound);
        }
        let mut acd = Acd66::from_truth_table(&tt, Acd66Params::default());
        assert!(acd.run());
        let solution = acd.solution().unwrap();
        assert_eq!(solution.free_set_size, 2);
        assert_eq!(solution.shared_position, None);
        assert_eq!(solution.multiplicity, 2);
        assert_eq!(acd.compute_decomposition(), 0);
        let ntk = acd.get_result_ntk().unwrap();
        assert_eq!(ntk.depth(), 2);
        assert!(ntk.max_fanin() <= LUT_SIZE as usize);
    }

    #[test]
    fn test_late_arriving_variable_feeds_top_lut() {
        let tt = Tt11::from_hex(8, SHARED_CASCADE_8_HEX).unwrap();
        let mut acd = Acd66::from_truth_table(&tt, Acd66Params::default());
        assert!(acd.run_late_arriving(&[3]));
        assert_eq!(acd.solution().unwrap().perm.var_at(0), 3);
        assert_eq!(acd.compute_decomposition(), 0);
        let ntk = acd.get_result_ntk().unwrap();
        let top = ntk.nodes().last().unwrap();
        assert!(top.fanins.contains(&LutSignal::Input(3)));

        // x7 cannot be moved into the top LUT.
        assert!(!acd.run_late_arriving(&[7]));
        // Six late-arriving inputs leave no room for the bound-set function.
        assert!(!acd.run_late_arriving(&[0, 1, 2, 3, 4, 5]));
    }
}
