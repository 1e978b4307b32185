// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, bail};
use clap::ArgMatches;
use serde::Serialize;
use xlsynth_acd::StaticTruthTable;

/// Variable count implied by a hex string of `digits` digits, if it is a
/// whole power-of-two table of at least two inputs.
pub fn infer_num_vars(digits: usize) -> Option<u32> {
    if digits == 0 || !digits.is_power_of_two() {
        return None;
    }
    Some(digits.trailing_zeros() + 2)
}

fn count_hex_digits(text: &str) -> usize {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    text.chars().filter(|c| !c.is_whitespace() && *c != '_').count()
}

/// Parses a hex truth table, taking the variable count from `num_vars` when
/// given and otherwise from the digit count.
pub fn parse_truth_table<const W: usize>(
    text: &str,
    num_vars: Option<u32>,
) -> anyhow::Result<StaticTruthTable<W>> {
    let num_vars = match num_vars {
        Some(n) => n,
        None => {
            let digits = count_hex_digits(text);
            match infer_num_vars(digits) {
                Some(n) => n,
                None => bail!(
                    "cannot infer the input count from {digits} hex digits; pass --num_vars"
                ),
            }
        }
    };
    StaticTruthTable::<W>::from_hex(num_vars, text)
        .with_context(|| format!("parsing truth table {text:?} with {num_vars} inputs"))
}

/// Truth table named by the `truth_table` and `num_vars` arguments.
pub fn truth_table_from_matches<const W: usize>(
    matches: &ArgMatches,
) -> anyhow::Result<StaticTruthTable<W>> {
    let text = matches
        .get_one::<String>("truth_table")
        .context("missing truth table")?;
    let num_vars = match matches.get_one::<String>("num_vars") {
        Some(s) => Some(
            s.parse::<u32>()
                .with_context(|| format!("invalid --num_vars {s:?}"))?,
        ),
        None => None,
    };
    parse_truth_table(text, num_vars)
}

/// Parses a comma-separated list of variable indices such as `"0,3"`.
pub fn parse_var_list(text: &str, num_vars: u32) -> anyhow::Result<Vec<u32>> {
    let mut vars = Vec::new();
    for piece in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let v: u32 = piece
            .parse()
            .with_context(|| format!("invalid variable index {piece:?}"))?;
        if v >= num_vars {
            bail!("variable {v} out of range for a function of {num_vars} inputs");
        }
        if vars.contains(&v) {
            bail!("variable {v} listed twice");
        }
        vars.push(v);
    }
    Ok(vars)
}

pub fn late_vars_from_matches(matches: &ArgMatches, num_vars: u32) -> anyhow::Result<Vec<u32>> {
    match matches.get_one::<String>("late") {
        Some(text) => parse_var_list(text, num_vars),
        None => Ok(Vec::new()),
    }
}

/// Writes `value` as pretty JSON to the `output_json` path, if one was given.
pub fn maybe_write_json<T: Serialize>(matches: &ArgMatches, value: &T) -> anyhow::Result<()> {
    if let Some(path) = matches.get_one::<String>("output_json") {
        let text = serde_json::to_string_pretty(value)?;
        std::fs::write(path, text).with_context(|| format!("writing {path}"))?;
        log::info!("wrote network JSON to {}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use xlsynth_acd::Tt11;

    #[test_case(1, Some(2))]
    #[test_case(2, Some(3))]
    #[test_case(16, Some(6))]
    #[test_case(64, Some(8))]
    #[test_case(3, None)]
    #[test_case(0, None)]
    fn test_infer_num_vars(digits: usize, want: Option<u32>) {
        assert_eq!(infer_num_vars(digits), want);
    }

    #[test]
    fn test_parse_truth_table_infers_inputs() {
        let tt: Tt11 = parse_truth_table("0x8804_8001_8414_8111", None).unwrap();
        assert_eq!(tt.num_vars(), 6);
        let small: Tt11 = parse_truth_table("e8", Some(3)).unwrap();
        assert_eq!(small.num_vars(), 3);
        assert!(parse_truth_table::<32>("abc", None).is_err());
    }

    #[test]
    fn test_parse_var_list() {
        assert_eq!(parse_var_list("3, 0", 8).unwrap(), vec![3, 0]);
        assert!(parse_var_list("8", 8).is_err());
        assert!(parse_var_list("1,1", 8).is_err());
        assert!(parse_var_list("x", 8).is_err());
    }
}
