// SPDX-License-Identifier: Apache-2.0

//! Ashenhurst-Curtis decomposition engine for functions of up to 16 inputs.
//!
//! A run picks a free set of `k` inputs (placed at the lowest positions) and
//! measures the column multiplicity `mu` of the remaining bound set. The
//! function is then rebuilt as
//!
//! ```text
//! f(F, B) = top(F, g_0(B), ..., g_{m-1}(B))      m = ceil(log2(mu))
//! ```
//!
//! where the `g_i` binary-encode which distinct column a bound-set assignment
//! selects.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::acd_error::AcdError;
use crate::decomposition_utils::{bitvec_from_fn, ceil_log2, column_classes, min_base, to_bitvec};
use crate::lut_network::{LutNetwork, LutSignal};
use crate::multiplicity::{MAX_COLUMN_VARS, column_multiplicity};
use crate::search::{INFEASIBLE, SearchResult, VarPerm, search_late_arriving, search_with_offset};
use crate::truth_table::Tt16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcDecompositionParams {
    /// Input limit for the top-level LUT (free set plus encoding bits). The
    /// encoding functions over the bound set are not limited by it.
    pub lut_size: u32,
    /// Largest free-set size `run_auto` will try.
    pub max_free_set_size: u32,
    /// Drop bound-set inputs that an encoding function ignores.
    pub support_minimization: bool,
    /// Re-simulate the rebuilt network in `compute_decomposition`.
    pub verify: bool,
}

impl Default for AcDecompositionParams {
    fn default() -> Self {
        Self {
            lut_size: 6,
            max_free_set_size: 3,
            support_minimization: true,
            verify: true,
        }
    }
}

/// One encoding function `g_i` of the bound set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSetFunction {
    /// Original input indices feeding the function, least-significant first.
    pub support: Vec<u32>,
    pub function: BitVec<u64, Lsb0>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Original inputs in the free set, in position order.
    pub free_set: Vec<u32>,
    /// Original inputs in the bound set, in position order.
    pub bound_set: Vec<u32>,
    pub multiplicity: u32,
    /// Distinct columns (functions of the free set) by class index.
    pub column_patterns: Vec<u64>,
    pub bound_set_functions: Vec<BoundSetFunction>,
    /// Top-level function; the free set supplies the low selector bits and
    /// the encoding bits the high ones.
    pub top_function: BitVec<u64, Lsb0>,
}

struct Best {
    result: SearchResult<1024>,
    free_set_size: u32,
}

pub struct AcDecomposition {
    tt: Box<Tt16>,
    params: AcDecompositionParams,
    best: Option<Box<Best>>,
    decomposition: Option<Decomposition>,
    network: Option<LutNetwork>,
}

impl AcDecomposition {
    pub fn new(
        words: &[u64],
        num_vars: u32,
        params: AcDecompositionParams,
    ) -> Result<Self, AcdError> {
        let tt = Tt16::from_words(num_vars, words)?;
        Ok(Self::from_truth_table(&tt, params))
    }

    pub fn from_truth_table(tt: &Tt16, params: AcDecompositionParams) -> Self {
        assert!(
            (2..=6).contains(&params.lut_size),
            "AcDecomposition: lut_size {} outside 2..=6",
            params.lut_size
        );
        assert!(
            (1..=3).contains(&params.max_free_set_size),
            "AcDecomposition: max_free_set_size {} outside 1..=3",
            params.max_free_set_size
        );
        Self {
            tt: Box::new(tt.clone()),
            params,
            best: None,
            decomposition: None,
            network: None,
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.tt.num_vars()
    }

    pub fn params(&self) -> &AcDecompositionParams {
        &self.params
    }

    /// Column multiplicity of the unpermuted function for free-set size `k`.
    pub fn multiplicity(&self, k: u32) -> u32 {
        column_multiplicity(self.tt.as_ref(), k)
    }

    /// Searches all free sets of size `k`; returns the best multiplicity.
    pub fn run(&mut self, k: u32) -> u32 {
        self.run_offset(k, 0)
    }

    /// Like [`AcDecomposition::run`] with the first `offset` inputs pinned to
    /// the free set.
    pub fn run_offset(&mut self, k: u32, offset: u32) -> u32 {
        check_free_set_size(k);
        let result = search_with_offset(self.tt.as_ref(), k, offset);
        self.record(result, k)
    }

    /// Searches free sets of size `k` that contain every variable in `late`.
    ///
    /// Returns [`INFEASIBLE`] when `late` does not fit in the free set.
    pub fn run_late_arriving(&mut self, k: u32, late: &[u32]) -> u32 {
        check_free_set_size(k);
        self.reset();
        match search_late_arriving(self.tt.as_ref(), k, late) {
            Some(result) => self.record(result, k),
            None => INFEASIBLE,
        }
    }

    /// Tries free-set sizes from the largest allowed down to `late.len()` and
    /// keeps the first whose top LUT fits `lut_size`. Functions that already
    /// fit one LUT are accepted as a single node.
    pub fn run_auto(&mut self, late: &[u32]) -> bool {
        self.reset();
        let num_vars = self.num_vars();
        if num_vars <= self.params.lut_size {
            let k = num_vars.max(1);
            let result = search_with_offset(self.tt.as_ref(), k, 0);
            self.record(result, k);
            return true;
        }
        let low = (late.len() as u32).max(1);
        let high = self
            .params
            .max_free_set_size
            .min(num_vars - 1)
            .min(self.params.lut_size - 1);
        for k in (low..=high).rev() {
            let Some(result) = search_late_arriving(self.tt.as_ref(), k, late) else {
                continue;
            };
            let top_inputs = top_lut_inputs(k, result.multiplicity);
            log::debug!(
                "run_auto: k={} multiplicity={} top LUT inputs={}",
                k,
                result.multiplicity,
                top_inputs
            );
            if top_inputs <= self.params.lut_size {
                self.record(result, k);
                return true;
            }
        }
        false
    }

    fn reset(&mut self) {
        self.best = None;
        self.decomposition = None;
        self.network = None;
    }

    fn record(&mut self, result: SearchResult<1024>, k: u32) -> u32 {
        self.decomposition = None;
        self.network = None;
        let multiplicity = result.multiplicity;
        log::debug!(
            "AcDecomposition: n={} k={} multiplicity={} perm={:?}",
            self.num_vars(),
            k,
            multiplicity,
            result.perm.as_slice()
        );
        self.best = Some(Box::new(Best {
            result,
            free_set_size: k.min(self.num_vars()),
        }));
        multiplicity
    }

    /// The input permutation of the recorded run.
    pub fn perm(&self) -> Option<&VarPerm> {
        self.best.as_ref().map(|b| &b.result.perm)
    }

    pub fn free_set_size(&self) -> Option<u32> {
        self.best.as_ref().map(|b| b.free_set_size)
    }

    pub fn best_multiplicity(&self) -> Option<u32> {
        self.best.as_ref().map(|b| b.result.multiplicity)
    }

    /// Inputs of the top LUT for the recorded run: the free set plus the
    /// encoding bits.
    pub fn top_lut_inputs(&self) -> Option<u32> {
        self.best
            .as_ref()
            .map(|b| top_lut_inputs(b.free_set_size, b.result.multiplicity))
    }

    /// Whether the recorded run's top LUT fits `lut_size`. Only `run_auto`
    /// enforces this; `run` and its variants record the best arrangement
    /// regardless.
    pub fn fits_lut_size(&self) -> bool {
        self.top_lut_inputs()
            .is_some_and(|inputs| inputs <= self.params.lut_size)
    }

    /// Rebuilds the function from the recorded run and, if enabled, checks
    /// the rebuilt network against the original function.
    ///
    /// Returns 0 on success and 1 if the network disagrees with the function.
    /// Panics if no run has been recorded.
    pub fn compute_decomposition(&mut self) -> i32 {
        let best = self
            .best
            .as_ref()
            .expect("compute_decomposition called without a successful run");
        let (decomposition, network) = build_decomposition(
            &best.result,
            best.free_set_size,
            self.params.support_minimization,
        );
        let status = if self.params.verify && !network.matches_truth_table(self.tt.as_ref()) {
            log::error!(
                "AcDecomposition: rebuilt network disagrees with function 0x{}",
                self.tt.to_hex()
            );
            1
        } else {
            0
        };
        self.decomposition = Some(decomposition);
        self.network = Some(network);
        status
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.decomposition.as_ref()
    }

    /// The rebuilt network; `None` until `compute_decomposition` has run.
    pub fn get_result_ntk(&self) -> Option<LutNetwork> {
        self.network.clone()
    }

    pub fn num_luts(&self) -> Option<usize> {
        self.network.as_ref().map(|n| n.num_luts())
    }

    pub fn num_edges(&self) -> Option<usize> {
        self.network.as_ref().map(|n| n.num_edges())
    }
}

fn top_lut_inputs(free_set_size: u32, multiplicity: u32) -> u32 {
    free_set_size + ceil_log2(multiplicity)
}

fn check_free_set_size(k: u32) {
    assert!(
        (1..=MAX_COLUMN_VARS).contains(&k),
        "free-set size {k} outside 1..={MAX_COLUMN_VARS}"
    );
}

fn build_decomposition(
    result: &SearchResult<1024>,
    k: u32,
    support_minimization: bool,
) -> (Decomposition, LutNetwork) {
    let tt = &result.tt;
    let num_vars = tt.num_vars();
    let bound_vars = num_vars - k;
    let free_set = result.free_set(k);
    let bound_set = result.bound_set(k);
    let classes = column_classes(tt, k);
    let multiplicity = classes.multiplicity();
    let code_bits = ceil_log2(multiplicity);

    let mut network = LutNetwork::new(num_vars);
    let mut bound_set_functions = Vec::with_capacity(code_bits as usize);
    let mut code_signals = Vec::with_capacity(code_bits as usize);
    for bit in 0..code_bits {
        let mut g = Tt16::new(bound_vars);
        for (b, &class) in classes.class_of.iter().enumerate() {
            g.set_bit(b, (class >> bit) & 1 == 1);
        }
        let (g, positions) = if support_minimization {
            min_base(&g)
        } else {
            (g, (0..bound_vars).collect())
        };
        let support: Vec<u32> = positions.iter().map(|&p| bound_set[p as usize]).collect();
        let function = to_bitvec(&g);
        let signal = if support.is_empty() {
            LutSignal::Const(function[0])
        } else {
            let fanins = support.iter().map(|&v| LutSignal::Input(v)).collect();
            network.add_lut(fanins, function.clone())
        };
        code_signals.push(signal);
        bound_set_functions.push(BoundSetFunction { support, function });
    }

    let top_function = bitvec_from_fn(k + code_bits, |index| {
        let free = index & ((1usize << k) - 1);
        let code = index >> k;
        let pattern = classes
            .patterns
            .get(code)
            .copied()
            .unwrap_or(classes.patterns[0]);
        (pattern >> free) & 1 == 1
    });
    let mut top_fanins: Vec<LutSignal> = free_set.iter().map(|&v| LutSignal::Input(v)).collect();
    top_fanins.extend(code_signals);
    let top = network.add_lut(top_fanins, top_function.clone());
    network.set_output(top);

    let decomposition = Decomposition {
        free_set,
        bound_set,
        multiplicity,
        column_patterns: classes.patterns,
        bound_set_functions,
        top_function,
    };
    (decomposition, network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference_6() -> Tt16 {
        Tt16::from_hex(6, "8804800184148111").unwrap()
    }

    #[test]
    fn test_cost_mode_matches_reference() {
        let acd =
            AcDecomposition::from_truth_table(&reference_6(), AcDecompositionParams::default());
        assert_eq!(acd.multiplicity(1), 3);
        assert_eq!(acd.multiplicity(2), 4);
        assert_eq!(acd.multiplicity(3), 8);
    }

    #[test]
    fn test_run_and_rebuild_each_free_set_size() {
        for k in 1..=3 {
            let mut acd =
                AcDecomposition::from_truth_table(&reference_6(), AcDecompositionParams::default());
            let mu = acd.run(k);
            assert_eq!(acd.compute_decomposition(), 0, "k={k}");
            let d = acd.decomposition().unwrap();
            assert_eq!(d.multiplicity, mu);
            assert_eq!(d.bound_set_functions.len() as u32, ceil_log2(mu));
            let ntk = acd.get_result_ntk().unwrap();
            assert!(ntk.matches_truth_table(&reference_6()));
            assert_eq!(ntk.num_luts(), 1 + ceil_log2(mu) as usize);
        }
    }

    #[test]
    fn test_run_late_arriving_infeasible_sentinel() {
        let mut acd =
            AcDecomposition::from_truth_table(&reference_6(), AcDecompositionParams::default());
        assert_eq!(acd.run_late_arriving(2, &[0, 1, 2]), INFEASIBLE);
        assert!(acd.perm().is_none());
        assert_eq!(acd.run_late_arriving(2, &[4]), acd.best_multiplicity().unwrap());
        assert_eq!(acd.perm().unwrap().var_at(0), 4);
    }

    #[test]
    fn test_run_auto_prefers_large_free_set() {
        let params = AcDecompositionParams {
            lut_size: 4,
            ..AcDecompositionParams::default()
        };
        let mut acd = AcDecomposition::from_truth_table(&reference_6(), params);
        // k=3 needs 3 + ceil_log2(5) = 6 inputs; k=2 needs 2 + 2 = 4.
        assert!(acd.run_auto(&[]));
        assert_eq!(acd.free_set_size(), Some(2));
        assert_eq!(acd.compute_decomposition(), 0);
        assert!(acd.get_result_ntk().unwrap().max_fanin() <= 4);
    }

    #[test]
    fn test_fixed_free_set_size_checks_top_lut() {
        for (lut_size, fits) in [(5, false), (6, true)] {
            let params = AcDecompositionParams {
                lut_size,
                ..AcDecompositionParams::default()
            };
            let mut acd = AcDecomposition::from_truth_table(&reference_6(), params);
            assert!(!acd.fits_lut_size());
            // k=3 searches down to multiplicity 5: 3 + 3 top LUT inputs.
            assert_eq!(acd.run(3), 5);
            assert_eq!(acd.top_lut_inputs(), Some(6));
            assert_eq!(acd.fits_lut_size(), fits, "lut_size={lut_size}");
        }
    }

    #[test]
    fn test_small_function_is_single_lut() {
        let tt = Tt16::from_hex(3, "e8").unwrap();
        let mut acd = AcDecomposition::from_truth_table(&tt, AcDecompositionParams::default());
        assert!(acd.run_auto(&[]));
        assert_eq!(acd.compute_decomposition(), 0);
        assert_eq!(acd.num_luts(), Some(1));
        assert_eq!(acd.num_edges(), Some(3));
    }

    #[test]
    #[should_panic(expected = "without a successful run")]
    fn test_compute_without_run_panics() {
        let mut acd =
            AcDecomposition::from_truth_table(&reference_6(), AcDecompositionParams::default());
        acd.compute_decomposition();
    }
}
