// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::ArgMatches;
use serde::Serialize;
use xlsynth_acd::{AcDecomposition, INFEASIBLE, Tt16};

use crate::acd_config::{AcdConfig, ac_decomposition_params, get_bool_flag};
use crate::common::{late_vars_from_matches, maybe_write_json, truth_table_from_matches};

/// Only the top LUT is held to `lut_size`; `max_bound_set_inputs` reports
/// the widest encoding function over the bound set.
#[derive(Debug, Serialize)]
struct DecomposeReport {
    decomposable: bool,
    free_set: Vec<u32>,
    bound_set: Vec<u32>,
    multiplicity: Option<u32>,
    top_lut_inputs: Option<u32>,
    max_bound_set_inputs: Option<usize>,
    num_luts: Option<usize>,
    num_edges: Option<usize>,
    depth: Option<usize>,
}

pub fn handle_decompose(matches: &ArgMatches, config: &Option<AcdConfig>) -> anyhow::Result<()> {
    log::info!("handle_decompose");
    let tt: Tt16 = truth_table_from_matches(matches)?;
    let params = ac_decomposition_params(matches, config)?;
    let late = late_vars_from_matches(matches, tt.num_vars())?;
    let mut acd = AcDecomposition::from_truth_table(&tt, params);

    let decomposable = match matches.get_one::<String>("free_set_size") {
        Some(s) => {
            let k: u32 = s.parse().context("invalid --free_set_size")?;
            if !(1..=6).contains(&k) {
                anyhow::bail!("--free_set_size must be in 1..=6; got {k}");
            }
            let feasible = acd.run_late_arriving(k, &late) != INFEASIBLE;
            if feasible && !acd.fits_lut_size() {
                log::info!(
                    "decompose: free set {} needs a top LUT of {:?} inputs; limit is {}",
                    k,
                    acd.top_lut_inputs(),
                    acd.params().lut_size
                );
            }
            feasible && acd.fits_lut_size()
        }
        None => acd.run_auto(&late),
    };

    let mut report = DecomposeReport {
        decomposable,
        free_set: Vec::new(),
        bound_set: Vec::new(),
        multiplicity: None,
        top_lut_inputs: None,
        max_bound_set_inputs: None,
        num_luts: None,
        num_edges: None,
        depth: None,
    };
    if decomposable {
        if acd.compute_decomposition() != 0 {
            anyhow::bail!("rebuilt network does not compute 0x{}", tt.to_hex());
        }
        if let (Some(d), Some(network)) = (acd.decomposition(), acd.get_result_ntk()) {
            report.free_set = d.free_set.clone();
            report.bound_set = d.bound_set.clone();
            report.multiplicity = Some(d.multiplicity);
            report.top_lut_inputs = acd.top_lut_inputs();
            report.max_bound_set_inputs = d
                .bound_set_functions
                .iter()
                .map(|g| g.support.len())
                .max();
            report.num_luts = Some(network.num_luts());
            report.num_edges = Some(network.num_edges());
            report.depth = Some(network.depth());
            maybe_write_json(matches, &network)?;
        }
    }

    if get_bool_flag(matches, "json").unwrap_or(false) {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }
    println!("decomposable: {}", report.decomposable);
    if let Some(m) = report.multiplicity {
        println!("free set: {:?}", report.free_set);
        println!("bound set: {:?}", report.bound_set);
        println!("multiplicity: {m}");
        println!("top LUT inputs: {}", report.top_lut_inputs.unwrap_or(0));
        println!(
            "widest bound-set function: {}",
            report.max_bound_set_inputs.unwrap_or(0)
        );
        println!("luts: {}", report.num_luts.unwrap_or(0));
        println!("edges: {}", report.num_edges.unwrap_or(0));
        println!("depth: {}", report.depth.unwrap_or(0));
    }
    Ok(())
}
