// SPDX-License-Identifier: Apache-2.0

mod multithread;

use xlsynth_acd::test_utils::SHARED_CASCADE_8_HEX;
use xlsynth_acd::{Acd66, Acd66Params, Tt11};

/// Decomposes a known 8-input function into two 6-input LUTs and checks the
/// rebuilt network.
fn validate_shared_cascade() -> Result<(), Box<dyn std::error::Error>> {
    let tt = Tt11::from_hex(8, SHARED_CASCADE_8_HEX)?;
    let mut acd = Acd66::from_truth_table(&tt, Acd66Params::default());
    if !acd.run() {
        return Err("function should fit two LUTs".into());
    }
    if acd.compute_decomposition() != 0 {
        return Err("rebuilt network disagrees with the function".into());
    }
    let network = acd.get_result_ntk().ok_or("missing network")?;
    log::info!(
        "decomposed into {} LUTs with {} edges",
        network.num_luts(),
        network.num_edges()
    );
    assert!(network.matches_truth_table(&tt));
    Ok(())
}

fn main() {
    let _ = env_logger::try_init();
    let result = validate_shared_cascade();
    println!("two-LUT decomposition validation result: {:?}", result);
    let decomposable = multithread::count_decomposable_in_parallel(64, 8, 1);
    println!("random 8-input functions fitting three LUTs: {decomposable} of 64");
}

#[test]
fn test_validate_shared_cascade() {
    let _ = env_logger::try_init();
    validate_shared_cascade().expect("validation should succeed");
}
