// SPDX-License-Identifier: Apache-2.0

//! Reference functions shared by tests, benches, and the driver's tests.

/// Six-input function with multiplicity 3/4/8 at free-set sizes 1/2/3 in
/// its natural variable order.
pub const REFERENCE_6_HEX: &str = "8804800184148111";

/// Eight-input function whose best two-variable free set has multiplicity 4.
pub const REFERENCE_8_HEX: &str =
    "000000001000200000000000000000020000100100001000C009800BC00D800F";

/// Eight-input function that fits two 6-input LUTs only when one bound-set
/// variable also feeds the top LUT.
pub const SHARED_CASCADE_8_HEX: &str =
    "FF30CE44FDB8FDB8FF30CE44FDB8FDB8FF30FF30CCCCCCCCFF30CE44CCCCCCCC";

/// Eight-input function that needs three 6-input LUTs (word 0 first).
pub const THREE_LUT_8_WORDS: [u64; 4] = [
    0xf1e3c78f1f3e7cf8,
    0xe1c3870f1e3c78f0,
    0xf0e0c3830f0e3c38,
    0xe0c083030e0c3830,
];
