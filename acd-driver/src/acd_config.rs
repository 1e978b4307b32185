// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use serde::Deserialize;
use xlsynth_acd::{AcDecompositionParams, Acd66Params};

/// Engine defaults read from the `[acd]` table of a TOML file. Command line
/// flags take precedence over every field.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AcdConfig {
    /// Input limit of the top LUT for `decompose`.
    pub lut_size: Option<u32>,

    /// Largest free set `decompose` tries when no size is given.
    pub max_free_set_size: Option<u32>,

    /// Drop unused inputs from bound-set LUTs.
    pub support_minimization: Option<bool>,

    /// Let one bound-set input also feed the top LUT (`acd66`, `acd666`).
    pub allow_shared_set: Option<bool>,

    /// Re-simulate every rebuilt network.
    pub verify: Option<bool>,
}

#[derive(Deserialize)]
pub struct AcdDriverConfig {
    pub acd: AcdConfig,
}

pub fn parse_config(text: &str) -> anyhow::Result<AcdConfig> {
    let parsed: AcdDriverConfig = toml::from_str(text)?;
    Ok(parsed.acd)
}

/// Reads a `"true"`/`"false"` flag.
pub fn get_bool_flag(matches: &ArgMatches, name: &str) -> Option<bool> {
    matches
        .try_get_one::<String>(name)
        .ok()
        .flatten()
        .map(|s| s == "true")
}

fn get_u32_flag(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<u32>> {
    match matches.try_get_one::<String>(name).ok().flatten() {
        Some(s) => Ok(Some(
            s.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("invalid value for --{name}: {s:?} ({e})"))?,
        )),
        None => Ok(None),
    }
}

/// Parameters for the general engine: flag, then config, then default.
pub fn ac_decomposition_params(
    matches: &ArgMatches,
    config: &Option<AcdConfig>,
) -> anyhow::Result<AcDecompositionParams> {
    let defaults = AcDecompositionParams::default();
    let config = config.as_ref();
    let lut_size = get_u32_flag(matches, "lut_size")?
        .or(config.and_then(|c| c.lut_size))
        .unwrap_or(defaults.lut_size);
    let max_free_set_size = config
        .and_then(|c| c.max_free_set_size)
        .unwrap_or(defaults.max_free_set_size);
    if !(2..=6).contains(&lut_size) {
        anyhow::bail!("lut_size must be in 2..=6; got {lut_size}");
    }
    if !(1..=3).contains(&max_free_set_size) {
        anyhow::bail!("max_free_set_size must be in 1..=3; got {max_free_set_size}");
    }
    Ok(AcDecompositionParams {
        lut_size,
        max_free_set_size,
        support_minimization: config
            .and_then(|c| c.support_minimization)
            .unwrap_or(defaults.support_minimization),
        verify: get_bool_flag(matches, "verify")
            .or(config.and_then(|c| c.verify))
            .unwrap_or(defaults.verify),
    })
}

/// Parameters for the LUT-cascade engines: flag, then config, then default.
pub fn acd66_params(matches: &ArgMatches, config: &Option<AcdConfig>) -> Acd66Params {
    let defaults = Acd66Params::default();
    let config = config.as_ref();
    Acd66Params {
        allow_shared_set: get_bool_flag(matches, "allow_shared_set")
            .or(config.and_then(|c| c.allow_shared_set))
            .unwrap_or(defaults.allow_shared_set),
        verify: get_bool_flag(matches, "verify")
            .or(config.and_then(|c| c.verify))
            .unwrap_or(defaults.verify),
    }
}
