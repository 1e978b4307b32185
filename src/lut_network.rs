// SPDX-License-Identifier: Apache-2.0

//! Minimal single-output lookup-table network.
//!
//! Primary inputs are addressed by index; LUT nodes are stored in topological
//! order (every fanin refers to an input, a constant, or an earlier node). A
//! node's `function` has `2^fanins.len()` bits, with fanin 0 as the
//! least-significant selector bit.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::truth_table::StaticTruthTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LutSignal {
    Const(bool),
    Input(u32),
    Node(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutNode {
    pub fanins: Vec<LutSignal>,
    pub function: BitVec<u64, Lsb0>,
}

impl LutNode {
    /// Hex rendering of the node function, most significant digit first.
    pub fn function_hex(&self) -> String {
        let digits = (self.function.len() + 3) / 4;
        let mut s = String::with_capacity(digits);
        for nibble in (0..digits).rev() {
            let mut value = 0u32;
            for b in 0..4 {
                let i = nibble * 4 + b;
                if i < self.function.len() && self.function[i] {
                    value |= 1 << b;
                }
            }
            s.push(char::from_digit(value, 16).unwrap_or('0'));
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutNetwork {
    num_inputs: u32,
    nodes: Vec<LutNode>,
    output: LutSignal,
}

impl LutNetwork {
    pub fn new(num_inputs: u32) -> Self {
        Self {
            num_inputs,
            nodes: Vec::new(),
            output: LutSignal::Const(false),
        }
    }

    pub fn num_inputs(&self) -> u32 {
        self.num_inputs
    }

    pub fn nodes(&self) -> &[LutNode] {
        &self.nodes
    }

    pub fn output(&self) -> LutSignal {
        self.output
    }

    fn check_signal(&self, signal: LutSignal) {
        match signal {
            LutSignal::Const(_) => {}
            LutSignal::Input(i) => assert!(
                i < self.num_inputs,
                "LutNetwork: input {i} out of range ({} inputs)",
                self.num_inputs
            ),
            LutSignal::Node(id) => assert!(
                id < self.nodes.len(),
                "LutNetwork: node {id} referenced before it was added"
            ),
        }
    }

    /// Appends a LUT and returns the signal driven by it.
    pub fn add_lut(&mut self, fanins: Vec<LutSignal>, function: BitVec<u64, Lsb0>) -> LutSignal {
        assert_eq!(
            function.len(),
            1usize << fanins.len(),
            "LutNetwork::add_lut: function width does not match {} fanins",
            fanins.len()
        );
        for &f in &fanins {
            self.check_signal(f);
        }
        self.nodes.push(LutNode { fanins, function });
        LutSignal::Node(self.nodes.len() - 1)
    }

    pub fn set_output(&mut self, signal: LutSignal) {
        self.check_signal(signal);
        self.output = signal;
    }

    /// Copies every node of `other` into `self`, substituting
    /// `input_map[i]` for `other`'s input `i`. Returns the signal that drives
    /// `other`'s output inside `self`.
    pub fn append_network(&mut self, other: &LutNetwork, input_map: &[LutSignal]) -> LutSignal {
        assert_eq!(input_map.len(), other.num_inputs as usize);
        let base = self.nodes.len();
        let remap = |s: LutSignal| -> LutSignal {
            match s {
                LutSignal::Const(v) => LutSignal::Const(v),
                LutSignal::Input(i) => input_map[i as usize],
                LutSignal::Node(id) => LutSignal::Node(base + id),
            }
        };
        for node in &other.nodes {
            let fanins = node.fanins.iter().map(|&f| remap(f)).collect();
            self.add_lut(fanins, node.function.clone());
        }
        remap(other.output)
    }

    pub fn num_luts(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of LUT input connections.
    pub fn num_edges(&self) -> usize {
        self.nodes.iter().map(|n| n.fanins.len()).sum()
    }

    pub fn max_fanin(&self) -> usize {
        self.nodes.iter().map(|n| n.fanins.len()).max().unwrap_or(0)
    }

    /// LUT levels on the longest input-to-output path.
    pub fn depth(&self) -> usize {
        let mut levels: Vec<usize> = Vec::with_capacity(self.nodes.len());
        let level_of = |levels: &Vec<usize>, s: LutSignal| match s {
            LutSignal::Node(id) => levels[id],
            _ => 0,
        };
        for node in &self.nodes {
            let l = node
                .fanins
                .iter()
                .map(|&f| level_of(&levels, f))
                .max()
                .unwrap_or(0);
            levels.push(l + 1);
        }
        level_of(&levels, self.output)
    }

    /// Evaluates the output for one input assignment (`x_i` is bit `i`).
    pub fn eval(&self, assignment: u64) -> bool {
        let mut values: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut index = 0usize;
            for (i, &f) in node.fanins.iter().enumerate() {
                if self.signal_value(&values, assignment, f) {
                    index |= 1 << i;
                }
            }
            values.push(node.function[index]);
        }
        self.signal_value(&values, assignment, self.output)
    }

    fn signal_value(&self, values: &[bool], assignment: u64, s: LutSignal) -> bool {
        match s {
            LutSignal::Const(v) => v,
            LutSignal::Input(i) => (assignment >> i) & 1 == 1,
            LutSignal::Node(id) => values[id],
        }
    }

    /// Exhaustively simulates the network; bit `a` of the result is the output
    /// under assignment `a`.
    pub fn simulate(&self) -> BitVec<u64, Lsb0> {
        assert!(
            self.num_inputs <= 20,
            "LutNetwork::simulate: {} inputs is too many for exhaustive simulation",
            self.num_inputs
        );
        let mut out: BitVec<u64, Lsb0> = BitVec::with_capacity(1usize << self.num_inputs);
        for a in 0..(1u64 << self.num_inputs) {
            out.push(self.eval(a));
        }
        out
    }

    /// Returns true if the network computes exactly `tt`.
    pub fn matches_truth_table<const W: usize>(&self, tt: &StaticTruthTable<W>) -> bool {
        if tt.num_vars() != self.num_inputs {
            return false;
        }
        let sim = self.simulate();
        (0..tt.num_bits()).all(|i| sim[i] == tt.get_bit(i))
    }
}
