// SPDX-License-Identifier: Apache-2.0

//! Building blocks shared by the decomposition engines.

use ahash::AHashMap;
use bitvec::prelude::*;

use crate::truth_table::StaticTruthTable;

/// Distinct columns of a table under a free set of size `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnClasses {
    /// Distinct `2^k`-bit patterns in order of first appearance; class 0 is
    /// the column at bound-set address 0.
    pub patterns: Vec<u64>,
    /// Class index of the column at each bound-set address.
    pub class_of: Vec<u32>,
}

impl ColumnClasses {
    pub fn multiplicity(&self) -> u32 {
        self.patterns.len() as u32
    }
}

pub fn column_classes<const W: usize>(tt: &StaticTruthTable<W>, k: u32) -> ColumnClasses {
    assert!(k <= 6 && k <= tt.num_vars());
    let total_columns = 1usize << (tt.num_vars() - k);
    let mut index_of: AHashMap<u64, u32> = AHashMap::new();
    let mut patterns = Vec::new();
    let mut class_of = Vec::with_capacity(total_columns);
    for b in 0..total_columns {
        let column = tt.column(b, k);
        let class = *index_of.entry(column).or_insert_with(|| {
            patterns.push(column);
            (patterns.len() - 1) as u32
        });
        class_of.push(class);
    }
    ColumnClasses { patterns, class_of }
}

/// Number of bits needed to encode `x` distinct values.
pub fn ceil_log2(x: u32) -> u32 {
    if x <= 1 { 0 } else { 32 - (x - 1).leading_zeros() }
}

/// A bound-set variable that splits the columns into two halves, each with
/// at most two distinct patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedSplit {
    /// Position (in the permuted table) of the shared variable; always in
    /// the bound set.
    pub position: u32,
    /// `patterns[v]` are the column patterns seen when the shared variable is
    /// `v`; when a half has only one pattern both entries are equal.
    pub patterns: [[u64; 2]; 2],
}

/// Looks for a bound-set position `s >= k` such that, for each value of
/// `x_s`, the columns take at most two distinct patterns. Positions are tried
/// in increasing order.
pub fn shared_variable_split<const W: usize>(
    tt: &StaticTruthTable<W>,
    k: u32,
) -> Option<SharedSplit> {
    let num_vars = tt.num_vars();
    let total_columns = 1usize << (num_vars - k);
    'position: for s in k..num_vars {
        let bit = s - k;
        let mut patterns = [[0u64; 2]; 2];
        let mut counts = [0usize; 2];
        for b in 0..total_columns {
            let half = (b >> bit) & 1;
            let column = tt.column(b, k);
            let seen = &mut patterns[half];
            if seen[..counts[half]].contains(&column) {
                continue;
            }
            if counts[half] == 2 {
                continue 'position;
            }
            seen[counts[half]] = column;
            counts[half] += 1;
        }
        for half in 0..2 {
            if counts[half] == 1 {
                patterns[half][1] = patterns[half][0];
            }
        }
        return Some(SharedSplit {
            position: s,
            patterns,
        });
    }
    None
}

/// Removes the variables `tt` does not depend on.
///
/// Returns the shrunk table and, for each of its variables, the position it
/// had in `tt`.
pub fn min_base<const W: usize>(tt: &StaticTruthTable<W>) -> (StaticTruthTable<W>, Vec<u32>) {
    let support: Vec<u32> = (0..tt.num_vars()).filter(|&v| tt.has_var(v)).collect();
    if support.len() as u32 == tt.num_vars() {
        return (tt.clone(), support);
    }
    let mut work = tt.clone();
    // Support is increasing, so each variable moves down into a slot that no
    // later support variable occupies.
    for (target, &var) in support.iter().enumerate() {
        work.swap_inplace(target as u32, var);
    }
    let mut out = StaticTruthTable::<W>::new(support.len() as u32);
    let live = out.num_blocks();
    out.words_mut().copy_from_slice(&work.words()[..live]);
    (out, support)
}

/// Copies the live bits of `tt` into a bit vector of length `2^num_vars`.
pub fn to_bitvec<const W: usize>(tt: &StaticTruthTable<W>) -> BitVec<u64, Lsb0> {
    let mut bits: BitVec<u64, Lsb0> = BitVec::with_capacity(tt.num_bits());
    for i in 0..tt.num_bits() {
        bits.push(tt.get_bit(i));
    }
    bits
}

/// Inverse of [`to_bitvec`].
pub fn from_bitvec<const W: usize>(
    num_vars: u32,
    bits: &BitSlice<u64, Lsb0>,
) -> StaticTruthTable<W> {
    assert_eq!(bits.len(), 1usize << num_vars);
    let mut tt = StaticTruthTable::<W>::new(num_vars);
    for i in bits.iter_ones() {
        tt.set_bit(i, true);
    }
    tt
}

/// Builds a bit vector of length `2^num_vars` from a per-assignment
/// predicate.
pub fn bitvec_from_fn(num_vars: u32, mut f: impl FnMut(usize) -> bool) -> BitVec<u64, Lsb0> {
    let mut bits: BitVec<u64, Lsb0> = BitVec::with_capacity(1usize << num_vars);
    for i in 0..(1usize << num_vars) {
        bits.push(f(i));
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplicity::column_multiplicity;
    use crate::truth_table::Tt11;
    use test_case::test_case;

    #[test_case(0, 0)]
    #[test_case(1, 0)]
    #[test_case(2, 1)]
    #[test_case(3, 2)]
    #[test_case(4, 2)]
    #[test_case(5, 3)]
    #[test_case(64, 6)]
    #[test_case(65, 7)]
    fn test_ceil_log2(x: u32, want: u32) {
        assert_eq!(ceil_log2(x), want);
    }

    #[test]
    fn test_column_classes_first_appearance_order() {
        let tt = Tt11::from_hex(6, "8804800184148111").unwrap();
        let classes = column_classes(&tt, 2);
        assert_eq!(classes.multiplicity(), column_multiplicity(&tt, 2));
        assert_eq!(classes.patterns[0], tt.column(0, 2));
        assert_eq!(classes.class_of.len(), 16);
        for (b, &c) in classes.class_of.iter().enumerate() {
            assert_eq!(classes.patterns[c as usize], tt.column(b, 2));
        }
    }

    #[test]
    fn test_min_base_drops_unused_variables() {
        // f = x1 & x4 over 6 variables.
        let mut tt = Tt11::new(6);
        for i in 0..64 {
            tt.set_bit(i, (i >> 1) & 1 == 1 && (i >> 4) & 1 == 1);
        }
        let (small, support) = min_base(&tt);
        assert_eq!(support, vec![1, 4]);
        assert_eq!(small.num_vars(), 2);
        assert_eq!(small.to_hex(), "8");
    }

    #[test]
    fn test_min_base_keeps_full_support() {
        let tt = Tt11::from_hex(3, "96").unwrap();
        let (same, support) = min_base(&tt);
        assert_eq!(support, vec![0, 1, 2]);
        assert_eq!(same, tt);
    }

    #[test]
    fn test_shared_split_on_mux() {
        // f = x2 ? x1 : x0 with free set {x0, x1}: columns x0 (x2=0) and x1
        // (x2=1); the only bound variable trivially splits them.
        let mut tt = Tt11::new(3);
        for i in 0..8 {
            let sel = (i >> 2) & 1 == 1;
            tt.set_bit(i, if sel { (i >> 1) & 1 == 1 } else { i & 1 == 1 });
        }
        let split = shared_variable_split(&tt, 2).expect("split exists");
        assert_eq!(split.position, 2);
        assert_eq!(split.patterns[0], [0b1010, 0b1010]);
        assert_eq!(split.patterns[1], [0b1100, 0b1100]);
    }

    #[test]
    fn test_bitvec_round_trip_preserves_function() {
        let tt = Tt11::from_hex(7, "0123456789abcdeffedcba9876543210").unwrap();
        let bits = to_bitvec(&tt);
        assert_eq!(bits.len(), 128);
        let back: Tt11 = from_bitvec(7, &bits);
        assert_eq!(back, tt);
    }
}
