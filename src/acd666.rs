// SPDX-License-Identifier: Apache-2.0

//! Decomposition into three 6-input LUTs.
//!
//! A function that fits the two-LUT cascade of [`crate::acd66`] is handled
//! directly. Otherwise a first bound set `B1` is collapsed into a single
//! signal `g1`, and the residual function over the remaining variables plus
//! that signal must itself fit the two-LUT cascade:
//!
//! ```text
//! g1 = LUT_1(B1)                 2 <= |B1| <= 6
//! f  = acd66(F1, [s], g1)        |F1| + 1 (+1) <= 11
//! ```
//!
//! Without a shared variable `B1` must induce at most two distinct columns.
//! With one, `s` is a variable of `B1` that also feeds the residual, and each
//! of its cofactors may induce at most two.

use std::ops::ControlFlow;

use crate::acd_error::AcdError;
use crate::acd66::{
    ACD66_MAX_VARS, Acd66Params, Acd66Solution, LUT_SIZE, bound_set_lut, build_acd66_network,
    find_acd66,
};
use crate::lut_network::{LutNetwork, LutSignal};
use crate::search::{VarPerm, for_each_free_set, place_late_arriving};
use crate::truth_table::Tt11;

/// Parameters are shared with the two-LUT engine.
pub type Acd666Params = Acd66Params;

/// First-stage collapse followed by a two-LUT cascade on the residual.
#[derive(Debug, Clone)]
pub struct CascadeSolution {
    /// The function with the first-stage free set moved to the low positions.
    pub tt: Tt11,
    pub perm: VarPerm,
    pub free_set_size: u32,
    /// Position (in `tt`) of the first-stage variable that also feeds the
    /// residual.
    pub shared_position: Option<u32>,
    /// For each first-stage bound-set address, whether its column differs
    /// from the first column seen in its cofactor of the shared variable.
    pub class_of: Vec<bool>,
    /// Residual over the free set (positions `0..free_set_size`), the
    /// first-stage output (position `free_set_size`) and, if any, the shared
    /// variable (position `free_set_size + 1`).
    pub residual: Acd66Solution,
}

#[derive(Debug, Clone)]
pub enum Acd666Plan {
    Direct(Acd66Solution),
    Cascade(CascadeSolution),
}

impl Acd666Plan {
    pub fn num_luts(&self) -> usize {
        match self {
            Acd666Plan::Direct(s) => s.num_luts(),
            Acd666Plan::Cascade(c) => {
                let first = usize::from(c.class_of.iter().any(|&b| b));
                first + c.residual.num_luts()
            }
        }
    }
}

pub struct Acd666 {
    tt: Tt11,
    params: Acd666Params,
    plan: Option<Acd666Plan>,
    network: Option<LutNetwork>,
}

impl Acd666 {
    pub fn new(words: &[u64], num_vars: u32, params: Acd666Params) -> Result<Self, AcdError> {
        let tt = Tt11::from_words(num_vars, words)?;
        Ok(Self::from_truth_table(&tt, params))
    }

    pub fn from_truth_table(tt: &Tt11, params: Acd666Params) -> Self {
        Self {
            tt: tt.clone(),
            params,
            plan: None,
            network: None,
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.tt.num_vars()
    }

    /// Returns true if the function fits the two-LUT cascade, or a first
    /// bound-set LUT feeding such a cascade.
    pub fn run(&mut self) -> bool {
        self.run_late_arriving(&[])
    }

    /// Like [`Acd666::run`], but every variable in `late` must feed the
    /// output LUT directly.
    pub fn run_late_arriving(&mut self, late: &[u32]) -> bool {
        self.network = None;
        self.plan = match find_acd66(&self.tt, late, &self.params) {
            Some(direct) => Some(Acd666Plan::Direct(direct)),
            None => find_cascade(&self.tt, late, &self.params).map(Acd666Plan::Cascade),
        };
        self.plan.is_some()
    }

    pub fn plan(&self) -> Option<&Acd666Plan> {
        self.plan.as_ref()
    }

    /// Builds the LUT network for the accepted plan and, if enabled, checks
    /// it against the function. Returns 0 on success and 1 on mismatch.
    ///
    /// Panics if `run` has not succeeded.
    pub fn compute_decomposition(&mut self) -> i32 {
        let plan = self
            .plan
            .as_ref()
            .expect("compute_decomposition called without a successful run");
        let network = match plan {
            Acd666Plan::Direct(solution) => build_acd66_network(solution),
            Acd666Plan::Cascade(cascade) => build_cascade_network(cascade),
        };
        let status = if self.params.verify && !network.matches_truth_table(&self.tt) {
            log::error!(
                "acd666: rebuilt network disagrees with function 0x{}",
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
        self.plan.as_ref().map(|p| p.num_luts())
    }

    pub fn num_edges(&self) -> Option<usize> {
        self.network.as_ref().map(|n| n.num_edges())
    }
}

/// Columns of `tt` at bound-set addresses `a` and `b` under a free set of
/// `k` variables are equal.
fn same_column(tt: &Tt11, k: u32, a: usize, b: usize) -> bool {
    if k >= 6 {
        let span = 1usize << (k - 6);
        let words = tt.words();
        words[a * span..(a + 1) * span] == words[b * span..(b + 1) * span]
    } else {
        tt.column(a, k) == tt.column(b, k)
    }
}

/// Column classes of a first-stage bound set.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FirstStage {
    /// Bound-set bit of the shared variable.
    shared_bit: Option<u32>,
    class_of: Vec<bool>,
    /// `representatives[v][c]` is a bound-set address whose column is class
    /// `c` of the cofactor `v` of the shared variable.
    representatives: [[usize; 2]; 2],
}

/// Splits the columns of `tt` under a free set of `k` variables into at most
/// two classes per cofactor of `shared_bit` (or two in total without one).
/// Returns `None` once a third distinct column shows up.
fn first_stage_classes(tt: &Tt11, k: u32, shared_bit: Option<u32>) -> Option<FirstStage> {
    let total_columns = 1usize << (tt.num_vars() - k);
    let mut seen: [[Option<usize>; 2]; 2] = [[None; 2]; 2];
    let mut class_of = Vec::with_capacity(total_columns);
    for b in 0..total_columns {
        let half = shared_bit.map_or(0, |s| (b >> s) & 1);
        let slot = &mut seen[half];
        let current = *slot;
        let class = match current {
            [None, _] => {
                slot[0] = Some(b);
                false
            }
            [Some(r0), _] if same_column(tt, k, r0, b) => false,
            [Some(_), None] => {
                slot[1] = Some(b);
                true
            }
            [Some(_), Some(r1)] if same_column(tt, k, r1, b) => true,
            [Some(_), Some(_)] => return None,
        };
        class_of.push(class);
    }
    let representatives = seen.map(|slot| {
        let r0 = slot[0].unwrap_or(0);
        [r0, slot[1].unwrap_or(r0)]
    });
    Some(FirstStage {
        shared_bit,
        class_of,
        representatives,
    })
}

/// Residual over the free set, the first-stage output and, if any, the
/// shared variable: block `(s, c)` holds the class-`c` column of cofactor `s`.
fn residual_table(tt: &Tt11, k: u32, stage: &FirstStage) -> Tt11 {
    let extra = if stage.shared_bit.is_some() { 2 } else { 1 };
    let mut residual = Tt11::new(k + extra);
    let mask = (1usize << k) - 1;
    for index in 0..residual.num_bits() {
        let f = index & mask;
        let code = (index >> k) & 1;
        let half = (index >> (k + 1)) & 1;
        let address = stage.representatives[half][code];
        residual.set_bit(index, tt.get_bit((address << k) | f));
    }
    residual
}

fn find_cascade(tt: &Tt11, late: &[u32], params: &Acd666Params) -> Option<CascadeSolution> {
    let num_vars = tt.num_vars();
    assert!(
        num_vars <= ACD66_MAX_VARS,
        "acd666: {num_vars} variables exceed {ACD66_MAX_VARS}"
    );
    if num_vars <= LUT_SIZE {
        return None;
    }
    let mut work = tt.clone();
    let mut perm = VarPerm::identity(num_vars);
    place_late_arriving(&mut work, &mut perm, late);
    let offset = late.len() as u32;
    let residual_late: Vec<u32> = (0..offset).collect();

    for bound_size in (2..=LUT_SIZE).rev() {
        if bound_size >= num_vars || num_vars - bound_size < offset {
            continue;
        }
        let free_set_size = num_vars - bound_size;
        // Smaller free sets leave a residual of at most six variables, which
        // the two-LUT search already covers.
        let disjoint = free_set_size >= LUT_SIZE;
        let shared = params.allow_shared_set
            && free_set_size + 1 >= LUT_SIZE
            && free_set_size + 2 <= ACD66_MAX_VARS;
        if !disjoint && !shared {
            continue;
        }
        let shared_bits = if shared { 0..bound_size } else { 0..0 };
        let options: Vec<Option<u32>> = disjoint
            .then_some(None)
            .into_iter()
            .chain(shared_bits.map(Some))
            .collect();

        let mut found: Option<CascadeSolution> = None;
        let _ = for_each_free_set(&mut work, &mut perm, free_set_size, offset, |cand, p| {
            for &shared_bit in &options {
                let Some(stage) = first_stage_classes(cand, free_set_size, shared_bit) else {
                    continue;
                };
                let residual = residual_table(cand, free_set_size, &stage);
                if let Some(solution) = find_acd66(&residual, &residual_late, params) {
                    found = Some(CascadeSolution {
                        tt: cand.clone(),
                        perm: *p,
                        free_set_size,
                        shared_position: shared_bit.map(|bit| free_set_size + bit),
                        class_of: stage.class_of,
                        residual: solution,
                    });
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        if let Some(cascade) = found {
            log::debug!(
                "acd666: n={} first bound set {:?} shared {:?} residual free set {}",
                num_vars,
                &cascade.perm.as_slice()[cascade.free_set_size as usize..],
                cascade.shared_position,
                cascade.residual.free_set_size
            );
            return Some(cascade);
        }
    }
    log::trace!("acd666: no three-LUT cascade for 0x{}", tt.to_hex());
    None
}

fn build_cascade_network(cascade: &CascadeSolution) -> LutNetwork {
    let num_vars = cascade.tt.num_vars();
    let k = cascade.free_set_size;
    let mut network = LutNetwork::new(num_vars);
    let g = bound_set_lut(&mut network, &cascade.tt, &cascade.perm, k, |b| cascade.class_of[b]);
    let inner = build_acd66_network(&cascade.residual);
    let input = |position: u32| LutSignal::Input(cascade.perm.var_at(position));
    let input_map: Vec<LutSignal> = (0..k)
        .map(input)
        .chain(std::iter::once(g))
        .chain(cascade.shared_position.map(input))
        .collect();
    let out = network.append_network(&inner, &input_map);
    network.set_output(out);
    network
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use crate::test_utils::{SHARED_CASCADE_8_HEX, THREE_LUT_8_WORDS};
    use rand::RngCore;
    use test_case::test_case;

    #[test]
    fn test_adversarial_needs_three_luts() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut acd = Acd666::new(&THREE_LUT_8_WORDS, 8, Acd666Params::default()).unwrap();
        assert!(acd.run());
        assert!(matches!(acd.plan(), Some(Acd666Plan::Cascade(_))));
        assert_eq!(acd.num_luts(), Some(3));
        assert_eq!(acd.compute_decomposition(), 0);
        let ntk = acd.get_result_ntk().unwrap();
        assert_eq!(ntk.num_luts(), 3);
        assert!(ntk.max_fanin() <= LUT_SIZE as usize);
        assert_eq!(acd.num_edges(), Some(ntk.num_edges()));
    }

    #[test]
    fn test_two_lut_function_takes_direct_route() {
        let tt = Tt11::from_hex(8, SHARED_CASCADE_8_HEX).unwrap();
        let mut acd = Acd666::from_truth_table(&tt, Acd666Params::default());
        assert!(acd.run());
        assert!(matches!(acd.plan(), Some(Acd666Plan::Direct(_))));
        assert_eq!(acd.compute_decomposition(), 0);
        assert_eq!(acd.get_result_ntk().unwrap().num_luts(), 2);
    }

    #[test]
    fn test_cascade_with_late_arriving_variable() {
        let mut acd = Acd666::new(&THREE_LUT_8_WORDS, 8, Acd666Params::default()).unwrap();
        assert!(acd.run_late_arriving(&[0]));
        assert_eq!(acd.compute_decomposition(), 0);
        let ntk = acd.get_result_ntk().unwrap();
        let top = ntk.nodes().last().unwrap();
        assert!(top.fanins.contains(&LutSignal::Input(0)));

        // x2 only works inside the first bound set.
        assert!(!acd.run_late_arriving(&[2]));
    }

    #[test]
    fn test_first_stage_classes() {
        let mut tt = Tt11::new(8);
        tt.words_mut().copy_from_slice(&[0, 1, 2, 0]);
        assert!(first_stage_classes(&tt, 6, None).is_none());
        let stage = first_stage_classes(&tt, 6, Some(1)).unwrap();
        assert_eq!(stage.class_of, vec![false, true, false, true]);
        assert_eq!(stage.representatives, [[0, 1], [2, 3]]);
        let residual = residual_table(&tt, 6, &stage);
        assert_eq!(residual.num_vars(), 8);
        assert_eq!(residual.words(), &[0, 1, 2, 0]);

        tt.words_mut()[2] = 1;
        let stage = first_stage_classes(&tt, 6, None).unwrap();
        assert_eq!(stage.class_of, vec![false, true, true, false]);
        let residual = residual_table(&tt, 6, &stage);
        assert_eq!(residual.num_vars(), 7);
        assert_eq!(residual.words(), &[0, 1]);

        // Narrow columns: four 4-bit columns 0, 1, 1, 0.
        let narrow = Tt11::from_hex(4, "0110").unwrap();
        let stage = first_stage_classes(&narrow, 2, None).unwrap();
        assert_eq!(stage.class_of, vec![false, true, true, false]);
    }

    /// `top(x0, x1, g1(x1..x6), g2(x0, x7..))`: the LUT over `x0, x7..`
    /// shares `x0` with the output LUT.
    fn shared_input_three_luts(num_vars: u32, rng: &mut impl RngCore) -> Tt11 {
        let g1 = rng.next_u64();
        let g2 = rng.next_u64();
        let top = rng.next_u64() & 0xffff;
        let high_mask = (1usize << (num_vars - 7)) - 1;
        let mut tt = Tt11::new(num_vars);
        for a in 0..tt.num_bits() {
            let g1_bit = ((g1 >> ((a >> 1) & 0x3f)) & 1) as usize;
            let g2_bit = ((g2 >> ((a & 1) | ((a >> 7) & high_mask) << 1)) & 1) as usize;
            let index = (a & 3) | g1_bit << 2 | g2_bit << 3;
            tt.set_bit(a, (top >> index) & 1 == 1);
        }
        tt
    }

    #[test_case(9)]
    #[test_case(10)]
    #[test_case(11)]
    fn test_first_stage_may_share_an_output_input(num_vars: u32) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng = seeded_rng(7 + num_vars as u64);
        for i in 0..8 {
            let tt = shared_input_three_luts(num_vars, &mut rng);
            let mut acd = Acd666::from_truth_table(&tt, Acd666Params::default());
            assert!(acd.run(), "function {i}: 0x{}", tt.to_hex());
            assert!(acd.num_luts() <= Some(3));
            assert_eq!(acd.compute_decomposition(), 0);
            let ntk = acd.get_result_ntk().unwrap();
            assert!(ntk.max_fanin() <= LUT_SIZE as usize);
            assert!(ntk.matches_truth_table(&tt));
        }
    }

    #[test]
    #[should_panic(expected = "without a successful run")]
    fn test_compute_without_run_panics() {
        let mut acd = Acd666::new(&THREE_LUT_8_WORDS, 8, Acd666Params::default()).unwrap();
        acd.compute_decomposition();
    }
}
