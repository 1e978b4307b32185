// SPDX-License-Identifier: Apache-2.0

//! Free-set search over input-variable placements.
//!
//! The free set always occupies the lowest positions of the (permuted) truth
//! table. Searching means choosing which original variables are swapped into
//! those positions. Column multiplicity does not depend on the order within
//! the free set or within the bound set, so only the choice of set matters and
//! the search visits each `k`-subset once, in lexicographic order of the
//! positions it pulls from.
//!
//! Each candidate is produced by applying at most `k` swaps to a single
//! working table, evaluated, and then reverted by replaying the swaps in
//! reverse; the working table is only cloned when a new best is found.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::multiplicity::column_multiplicity;
use crate::truth_table::{MAX_NUM_VARS, StaticTruthTable};

/// Sentinel cost returned when a placement constraint cannot be met.
pub const INFEASIBLE: u32 = u32::MAX;

/// Tracks which original input occupies each position of a permuted table.
///
/// Semantics: `perm[p]` is the original variable index now sitting at
/// position `p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarPerm {
    len: u8,
    slots: [u8; MAX_NUM_VARS as usize],
}

impl VarPerm {
    pub fn identity(num_vars: u32) -> Self {
        assert!(num_vars <= MAX_NUM_VARS);
        let mut slots = [0u8; MAX_NUM_VARS as usize];
        for (i, s) in slots.iter_mut().enumerate() {
            *s = i as u8;
        }
        Self {
            len: num_vars as u8,
            slots,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn swap(&mut self, i: u32, j: u32) {
        self.slots.swap(i as usize, j as usize);
    }

    /// Original variable at `position`.
    #[inline]
    pub fn var_at(&self, position: u32) -> u32 {
        debug_assert!((position as usize) < self.len());
        self.slots[position as usize] as u32
    }

    /// Current position of original variable `var`.
    pub fn position_of(&self, var: u32) -> Option<u32> {
        self.as_slice()
            .iter()
            .position(|&v| v as u32 == var)
            .map(|p| p as u32)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots[..self.len()]
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.as_slice().iter().map(|&v| v as u32).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.as_slice().iter().enumerate().all(|(i, &v)| i == v as usize)
    }
}

/// Best arrangement found by a search.
#[derive(Debug, Clone)]
pub struct SearchResult<const W: usize> {
    pub tt: StaticTruthTable<W>,
    pub perm: VarPerm,
    pub multiplicity: u32,
}

impl<const W: usize> SearchResult<W> {
    /// Original variables placed in the free set, in position order.
    pub fn free_set(&self, k: u32) -> Vec<u32> {
        (0..k).map(|p| self.perm.var_at(p)).collect()
    }

    /// Original variables left in the bound set, in position order.
    pub fn bound_set(&self, k: u32) -> Vec<u32> {
        (k..self.tt.num_vars()).map(|p| self.perm.var_at(p)).collect()
    }
}

/// Visits every arrangement that keeps positions `0..offset` fixed and fills
/// positions `offset..k` with a `(k - offset)`-subset of the remaining
/// positions.
///
/// `tt` and `perm` are mutated while visiting and restored before returning,
/// including on early exit. The first arrangement visited is the current one.
pub fn for_each_free_set<const W: usize, F>(
    tt: &mut StaticTruthTable<W>,
    perm: &mut VarPerm,
    k: u32,
    offset: u32,
    mut visit: F,
) -> ControlFlow<()>
where
    F: FnMut(&StaticTruthTable<W>, &VarPerm) -> ControlFlow<()>,
{
    let num_vars = tt.num_vars();
    debug_assert_eq!(perm.len(), num_vars as usize);
    if k <= offset || k >= num_vars {
        return visit(tt, perm);
    }
    let choose = (k - offset) as usize;
    let pool = (num_vars - offset) as usize;

    // `picks[t]` is the pool index (relative to `offset`) swapped into
    // position `offset + t`; kept strictly increasing.
    let mut picks = [0usize; MAX_NUM_VARS as usize];
    for (t, p) in picks.iter_mut().enumerate().take(choose) {
        *p = t;
    }

    loop {
        for t in 0..choose {
            let from = (offset as usize + picks[t]) as u32;
            let to = offset + t as u32;
            tt.swap_inplace(to, from);
            perm.swap(to, from);
        }
        let flow = visit(tt, perm);
        for t in (0..choose).rev() {
            let from = (offset as usize + picks[t]) as u32;
            let to = offset + t as u32;
            tt.swap_inplace(to, from);
            perm.swap(to, from);
        }
        if flow.is_break() {
            return flow;
        }

        // Advance to the next combination in lexicographic order.
        let mut t = choose;
        loop {
            if t == 0 {
                return ControlFlow::Continue(());
            }
            t -= 1;
            if picks[t] < pool - choose + t {
                break;
            }
        }
        picks[t] += 1;
        for u in t + 1..choose {
            picks[u] = picks[u - 1] + 1;
        }
    }
}

/// Finds the arrangement minimizing `cost`, starting from `tt`/`perm` and
/// holding positions `0..offset` fixed. Ties keep the earliest arrangement.
pub fn search_by<const W: usize, C>(
    tt: &StaticTruthTable<W>,
    perm: VarPerm,
    k: u32,
    offset: u32,
    mut cost: C,
) -> SearchResult<W>
where
    C: FnMut(&StaticTruthTable<W>) -> u32,
{
    let mut work = tt.clone();
    let mut work_perm = perm;
    let mut best: Option<SearchResult<W>> = None;
    let _ = for_each_free_set(&mut work, &mut work_perm, k, offset, |cand, cand_perm| {
        let c = cost(cand);
        let improved = match &best {
            Some(b) => c < b.multiplicity,
            None => true,
        };
        if improved {
            log::trace!(
                "search_by: k={} offset={} new best cost {} perm {:?}",
                k,
                offset,
                c,
                cand_perm.as_slice()
            );
            best = Some(SearchResult {
                tt: cand.clone(),
                perm: *cand_perm,
                multiplicity: c,
            });
        }
        ControlFlow::Continue(())
    });
    // The enumeration always visits at least the starting arrangement.
    best.unwrap_or_else(|| SearchResult {
        tt: tt.clone(),
        perm,
        multiplicity: cost(tt),
    })
}

/// Exhaustively searches all `C(n, k)` free sets for minimal column
/// multiplicity.
pub fn search<const W: usize>(tt: &StaticTruthTable<W>, k: u32) -> SearchResult<W> {
    search_with_offset(tt, k, 0)
}

/// Searches with the first `offset` positions pinned to the free set; only
/// the remaining `k - offset` free-set slots are searched.
///
/// When `offset >= k` the pinned prefix already is the free set and the
/// current arrangement is returned.
pub fn search_with_offset<const W: usize>(
    tt: &StaticTruthTable<W>,
    k: u32,
    offset: u32,
) -> SearchResult<W> {
    let perm = VarPerm::identity(tt.num_vars());
    search_by(tt, perm, k, offset, |t| column_multiplicity(t, k))
}

/// Moves `late_vars` (original indices, in the given order) to positions
/// `0..late_vars.len()`, updating `tt` and `perm` in lock-step.
pub fn place_late_arriving<const W: usize>(
    tt: &mut StaticTruthTable<W>,
    perm: &mut VarPerm,
    late_vars: &[u32],
) {
    for (target, &var) in late_vars.iter().enumerate() {
        let position = perm
            .position_of(var)
            .unwrap_or_else(|| panic!("late-arriving variable {var} is not an input"));
        assert!(
            position as usize >= target,
            "late-arriving variable {var} listed twice"
        );
        tt.swap_inplace(target as u32, position);
        perm.swap(target as u32, position);
    }
}

/// Searches for the best free set of size `k` that contains every variable
/// in `late_vars`.
///
/// Returns `None` when more late-arriving variables are given than the free
/// set can hold.
pub fn search_late_arriving<const W: usize>(
    tt: &StaticTruthTable<W>,
    k: u32,
    late_vars: &[u32],
) -> Option<SearchResult<W>> {
    if late_vars.len() > k as usize {
        log::debug!(
            "search_late_arriving: {} late-arriving variables do not fit a free set of {}",
            late_vars.len(),
            k
        );
        return None;
    }
    let mut start = tt.clone();
    let mut perm = VarPerm::identity(tt.num_vars());
    place_late_arriving(&mut start, &mut perm, late_vars);
    Some(search_by(&start, perm, k, late_vars.len() as u32, |t| {
        column_multiplicity(t, k)
    }))
}
