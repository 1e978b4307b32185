// SPDX-License-Identifier: Apache-2.0

//! Evaluates many truth tables with one engine each, in parallel.

use std::io::Write;

use anyhow::Context;
use clap::ArgMatches;
use rayon::prelude::*;
use serde::Serialize;
use xlsynth_acd::Tt11;
use xlsynth_acd::random::{random_truth_table, seeded_rng};

use crate::acd_config::{AcdConfig, acd66_params};
use crate::common::{parse_truth_table, parse_var_list};
use crate::lut_cascade::{CascadeEngine, CascadeReport, evaluate_cascade};

#[derive(Debug, Serialize)]
pub struct BatchRecord {
    pub index: usize,
    pub truth_table: String,
    pub num_vars: u32,
    #[serde(flatten)]
    pub report: CascadeReport,
}

/// Reads one hex truth table per line. Blank lines and lines starting with
/// `#` are skipped; a line may carry an explicit input count as `n:hex`.
pub fn parse_batch_input(text: &str) -> anyhow::Result<Vec<Tt11>> {
    let mut tables = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (num_vars, hex) = match line.split_once(':') {
            Some((n, hex)) => {
                let n: u32 = n
                    .trim()
                    .parse()
                    .with_context(|| format!("line {}: invalid input count", lineno + 1))?;
                (Some(n), hex)
            }
            None => (None, line),
        };
        let tt = parse_truth_table(hex, num_vars).with_context(|| format!("line {}", lineno + 1))?;
        tables.push(tt);
    }
    Ok(tables)
}

pub fn run_batch(
    tables: &[Tt11],
    engine: CascadeEngine,
    late: &[u32],
    params: xlsynth_acd::Acd66Params,
) -> Vec<BatchRecord> {
    tables
        .par_iter()
        .enumerate()
        .map(|(index, tt)| {
            let late: Vec<u32> = late.iter().copied().filter(|&v| v < tt.num_vars()).collect();
            let report = evaluate_cascade(engine, tt, &late, params);
            if report.status.is_some_and(|s| s != 0) {
                log::error!("batch: entry {} rebuilt incorrectly", index);
            }
            BatchRecord {
                index,
                truth_table: tt.to_hex(),
                num_vars: tt.num_vars(),
                report,
            }
        })
        .collect()
}

pub fn handle_batch(matches: &ArgMatches, config: &Option<AcdConfig>) -> anyhow::Result<()> {
    log::info!("handle_batch");
    let engine: CascadeEngine = matches
        .get_one::<String>("engine")
        .map(|s| s.as_str())
        .unwrap_or("acd666")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let params = acd66_params(matches, config);

    let tables: Vec<Tt11> = match matches.get_one::<String>("input_file") {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            parse_batch_input(&text)?
        }
        None => {
            let count: usize = matches
                .get_one::<String>("random")
                .context("either an input file or --random is required")?
                .parse()
                .context("invalid --random")?;
            let num_vars: u32 = matches
                .get_one::<String>("num_vars")
                .context("--random requires --num_vars")?
                .parse()
                .context("invalid --num_vars")?;
            if num_vars > Tt11::MAX_VARS {
                anyhow::bail!("--num_vars must be at most {}; got {num_vars}", Tt11::MAX_VARS);
            }
            let seed: u64 = match matches.get_one::<String>("seed") {
                Some(s) => s.parse().context("invalid --seed")?,
                None => 0,
            };
            let mut rng = seeded_rng(seed);
            (0..count).map(|_| random_truth_table(num_vars, &mut rng)).collect()
        }
    };
    let late = match matches.get_one::<String>("late") {
        Some(text) => parse_var_list(text, Tt11::MAX_VARS)?,
        None => Vec::new(),
    };

    let run = || run_batch(&tables, engine, &late, params);
    let records = match matches.get_one::<String>("threads") {
        Some(s) => {
            let threads: usize = s.parse().context("invalid --threads")?;
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("building thread pool")?
                .install(run)
        }
        None => run(),
    };

    let decomposable = records.iter().filter(|r| r.report.decomposable).count();
    log::info!(
        "batch: {} of {} functions decomposable with {}",
        decomposable,
        records.len(),
        engine.name()
    );
    let mut out: Box<dyn Write> = match matches.get_one::<String>("output") {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("creating {path}"))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    for record in &records {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    out.flush()?;
    if records.iter().any(|r| r.report.status.is_some_and(|s| s != 0)) {
        anyhow::bail!("at least one rebuilt network disagreed with its function");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlsynth_acd::Acd66Params;
    use xlsynth_acd::test_utils::{SHARED_CASCADE_8_HEX, THREE_LUT_8_WORDS};

    #[test]
    fn test_parse_batch_input_skips_comments() {
        let text = format!("# header\n\n{SHARED_CASCADE_8_HEX}\n3:e8\n");
        let tables = parse_batch_input(&text).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].num_vars(), 8);
        assert_eq!(tables[1].num_vars(), 3);
        assert!(parse_batch_input("x:ff\n").is_err());
    }

    #[test]
    fn test_run_batch_keeps_input_order() {
        let tables = vec![
            Tt11::from_words(8, &THREE_LUT_8_WORDS).unwrap(),
            Tt11::from_hex(8, SHARED_CASCADE_8_HEX).unwrap(),
        ];
        let records = run_batch(&tables, CascadeEngine::TwoLuts, &[], Acd66Params::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 0);
        assert!(!records[0].report.decomposable);
        assert!(records[1].report.decomposable);
        assert_eq!(records[1].report.num_luts, Some(2));
        let line = serde_json::to_string(&records[1]).unwrap();
        assert!(line.contains("\"engine\":\"acd66\""), "{line}");
    }
}
