// SPDX-License-Identifier: Apache-2.0

//! Ashenhurst-Curtis style decomposition of Boolean functions into LUT
//! networks, driven by column multiplicity over bit-packed truth tables.

pub mod ac_decomposition;
pub mod acd66;
pub mod acd666;
pub mod acd_error;
pub mod decomposition_utils;
pub mod lut_network;
pub mod multiplicity;
pub mod random;
pub mod search;
pub mod test_utils;
pub mod truth_table;

pub use ac_decomposition::{AcDecomposition, AcDecompositionParams};
pub use acd66::{Acd66, Acd66Params};
pub use acd666::{Acd666, Acd666Params};
pub use acd_error::AcdError;
pub use lut_network::{LutNetwork, LutSignal};
pub use search::{INFEASIBLE, VarPerm};
pub use truth_table::{StaticTruthTable, Tt11, Tt16};
