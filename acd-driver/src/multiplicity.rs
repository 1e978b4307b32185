// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::ArgMatches;
use serde::Serialize;
use xlsynth_acd::{AcDecomposition, AcDecompositionParams, INFEASIBLE, Tt16};

use crate::acd_config::get_bool_flag;
use crate::common::{late_vars_from_matches, truth_table_from_matches};

#[derive(Debug, Serialize)]
struct MultiplicityReport {
    num_vars: u32,
    free_set_size: u32,
    /// Multiplicity with the inputs in their given order.
    natural: u32,
    /// Best multiplicity found; `None` when the late-arriving inputs do not
    /// fit the free set.
    searched: Option<u32>,
    free_set: Vec<u32>,
    perm: Vec<u32>,
}

pub fn handle_multiplicity(matches: &ArgMatches) -> anyhow::Result<()> {
    log::info!("handle_multiplicity");
    let tt: Tt16 = truth_table_from_matches(matches)?;
    let k: u32 = matches
        .get_one::<String>("free_set_size")
        .context("missing --free_set_size")?
        .parse()
        .context("invalid --free_set_size")?;
    if !(1..=6).contains(&k) {
        anyhow::bail!("--free_set_size must be in 1..=6; got {k}");
    }
    let offset: u32 = match matches.get_one::<String>("offset") {
        Some(s) => s.parse().context("invalid --offset")?,
        None => 0,
    };
    let late = late_vars_from_matches(matches, tt.num_vars())?;
    if offset > 0 && !late.is_empty() {
        anyhow::bail!("--offset and --late are mutually exclusive");
    }

    let mut acd = AcDecomposition::from_truth_table(&tt, AcDecompositionParams::default());
    let natural = acd.multiplicity(k);
    let searched = if late.is_empty() {
        acd.run_offset(k, offset)
    } else {
        acd.run_late_arriving(k, &late)
    };
    let (searched, perm) = if searched == INFEASIBLE {
        (None, Vec::new())
    } else {
        let perm = acd.perm().map(|p| p.to_vec()).unwrap_or_default();
        (Some(searched), perm)
    };
    let report = MultiplicityReport {
        num_vars: tt.num_vars(),
        free_set_size: k,
        natural,
        searched,
        free_set: perm.iter().take(k as usize).copied().collect(),
        perm,
    };

    if get_bool_flag(matches, "json").unwrap_or(false) {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }
    println!("natural multiplicity: {}", report.natural);
    match report.searched {
        Some(m) => {
            println!("searched multiplicity: {m}");
            println!("free set: {:?}", report.free_set);
            println!("permutation: {:?}", report.perm);
        }
        None => println!(
            "searched multiplicity: infeasible ({} late-arriving inputs, free set of {})",
            late.len(),
            k
        ),
    }
    Ok(())
}
