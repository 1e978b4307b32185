// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use serde::Serialize;
use xlsynth_acd::{Acd66, Acd66Params, Acd666, LutNetwork, Tt11};

use crate::acd_config::{AcdConfig, acd66_params, get_bool_flag};
use crate::common::{late_vars_from_matches, maybe_write_json, truth_table_from_matches};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeEngine {
    TwoLuts,
    ThreeLuts,
}

impl CascadeEngine {
    pub fn name(self) -> &'static str {
        match self {
            CascadeEngine::TwoLuts => "acd66",
            CascadeEngine::ThreeLuts => "acd666",
        }
    }
}

impl std::str::FromStr for CascadeEngine {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acd66" => Ok(Self::TwoLuts),
            "acd666" => Ok(Self::ThreeLuts),
            _ => Err(format!("invalid engine: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CascadeReport {
    pub engine: &'static str,
    pub decomposable: bool,
    /// Result of re-simulating the rebuilt network; 0 means it matches.
    pub status: Option<i32>,
    pub num_luts: Option<usize>,
    pub num_edges: Option<usize>,
    pub depth: Option<usize>,
    #[serde(skip)]
    pub network: Option<LutNetwork>,
}

/// Runs one engine on `tt` and rebuilds the network when it succeeds.
pub fn evaluate_cascade(
    engine: CascadeEngine,
    tt: &Tt11,
    late: &[u32],
    params: Acd66Params,
) -> CascadeReport {
    let (decomposable, status, network) = match engine {
        CascadeEngine::TwoLuts => {
            let mut acd = Acd66::from_truth_table(tt, params);
            if acd.run_late_arriving(late) {
                let status = acd.compute_decomposition();
                (true, Some(status), acd.get_result_ntk())
            } else {
                (false, None, None)
            }
        }
        CascadeEngine::ThreeLuts => {
            let mut acd = Acd666::from_truth_table(tt, params);
            if acd.run_late_arriving(late) {
                let status = acd.compute_decomposition();
                (true, Some(status), acd.get_result_ntk())
            } else {
                (false, None, None)
            }
        }
    };
    CascadeReport {
        engine: engine.name(),
        decomposable,
        status,
        num_luts: network.as_ref().map(|n| n.num_luts()),
        num_edges: network.as_ref().map(|n| n.num_edges()),
        depth: network.as_ref().map(|n| n.depth()),
        network,
    }
}

pub fn handle_lut_cascade(
    engine: CascadeEngine,
    matches: &ArgMatches,
    config: &Option<AcdConfig>,
) -> anyhow::Result<()> {
    log::info!("handle_lut_cascade: {}", engine.name());
    let tt: Tt11 = truth_table_from_matches(matches)?;
    let late = late_vars_from_matches(matches, tt.num_vars())?;
    let params = acd66_params(matches, config);
    let report = evaluate_cascade(engine, &tt, &late, params);

    if report.status.is_some_and(|s| s != 0) {
        anyhow::bail!("rebuilt network does not compute 0x{}", tt.to_hex());
    }
    if get_bool_flag(matches, "json").unwrap_or(false) {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("decomposable: {}", report.decomposable);
        if let (Some(luts), Some(edges), Some(depth)) =
            (report.num_luts, report.num_edges, report.depth)
        {
            println!("luts: {luts}");
            println!("edges: {edges}");
            println!("depth: {depth}");
        }
    }
    if let Some(network) = &report.network {
        maybe_write_json(matches, network)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlsynth_acd::test_utils::THREE_LUT_8_WORDS;

    #[test]
    fn test_engines_disagree_on_three_lut_function() {
        let tt = Tt11::from_words(8, &THREE_LUT_8_WORDS).unwrap();
        let two = evaluate_cascade(CascadeEngine::TwoLuts, &tt, &[], Acd66Params::default());
        assert!(!two.decomposable);
        assert_eq!(two.num_luts, None);
        let three = evaluate_cascade(CascadeEngine::ThreeLuts, &tt, &[], Acd66Params::default());
        assert!(three.decomposable);
        assert_eq!(three.status, Some(0));
        assert_eq!(three.num_luts, Some(3));
    }

    #[test]
    fn test_engine_names_round_trip() {
        for engine in [CascadeEngine::TwoLuts, CascadeEngine::ThreeLuts] {
            assert_eq!(engine.name().parse::<CascadeEngine>(), Ok(engine));
        }
        assert!("acd6".parse::<CascadeEngine>().is_err());
    }
}
