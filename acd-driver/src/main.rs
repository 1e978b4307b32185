// SPDX-License-Identifier: Apache-2.0

//! Command line driver for the decomposition engines.
//!
//! Commands are given like:
//!
//! ```text
//! acd-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - multiplicity: Column multiplicity of a function for a free-set size, in
//!   the given input order and after searching.
//! - decompose: Ashenhurst-Curtis decomposition with the general engine.
//! - acd66 / acd666: Fit a function of up to 11 inputs into two or three
//!   6-input LUTs.
//! - batch: Run acd66 or acd666 over many functions in parallel, one JSON
//!   line per function.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- multiplicity 8804800184148111 --free_set_size=3
//! $ cargo run -- acd66 \
//!     FF30CE44FDB8FDB8FF30CE44FDB8FDB8FF30FF30CCCCCCCCFF30CE44CCCCCCCC \
//!     --output_json=/tmp/ntk.json
//! $ cargo run -- --config=$HOME/acd.toml batch functions.txt --engine=acd666
//! ```

mod acd_config;
mod batch;
mod common;
mod decompose;
mod lut_cascade;
mod multiplicity;
mod report_cli_error;

use clap::{Arg, ArgAction};
use report_cli_error::report_cli_error_and_exit;

use crate::acd_config::AcdConfig;
use crate::lut_cascade::CascadeEngine;

const DEFAULT_CONFIG_FILE: &str = "acd-config.toml";

trait AppExt {
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self;
    fn add_truth_table_args(self) -> Self;
    fn add_late_arg(self) -> Self;
    fn add_output_args(self) -> Self;
}

impl AppExt for clap::Command {
    /// Adds a boolean argument that takes an explicit `true`/`false` value.
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(long)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }

    fn add_truth_table_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("truth_table")
                    .help("Truth table as hex, most significant digit first")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("num_vars")
                    .long("num_vars")
                    .value_name("N")
                    .help("Number of inputs (inferred from the digit count if omitted)")
                    .action(ArgAction::Set),
            )
    }

    fn add_late_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("late")
                .long("late")
                .value_name("VARS")
                .help("Comma-separated late-arriving inputs to keep in the free set")
                .action(ArgAction::Set),
        )
    }

    fn add_output_args(self) -> Self {
        (self as clap::Command)
            .add_bool_arg("json", "Print the report as a single JSON object")
            .arg(
                Arg::new("output_json")
                    .long("output_json")
                    .value_name("PATH")
                    .help("Write the LUT network as JSON to this path")
                    .action(ArgAction::Set),
            )
    }
}

fn load_config(path: Option<String>) -> Option<AcdConfig> {
    let path = path.or_else(|| {
        let cwd_path = std::env::current_dir().ok()?.join(DEFAULT_CONFIG_FILE);
        if cwd_path.exists() {
            log::info!("Using {} in current directory", DEFAULT_CONFIG_FILE);
            Some(cwd_path.display().to_string())
        } else {
            None
        }
    })?;
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => report_cli_error_and_exit(
            "cannot read config file",
            None,
            vec![("path", &path), ("error", &e.to_string())],
        ),
    };
    match acd_config::parse_config(&text) {
        Ok(config) => Some(config),
        Err(e) => report_cli_error_and_exit(
            "cannot parse config file",
            None,
            vec![("path", &path), ("error", &format!("{e:#}"))],
        ),
    }
}

fn main() {
    let _ = env_logger::try_init();

    let matches = clap::Command::new("acd-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ashenhurst-Curtis decomposition of Boolean functions into LUTs")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("TOML_PATH")
                .help(
                    "Path to a TOML file with an [acd] table of engine defaults; \
                     acd-config.toml in the working directory is used if present",
                )
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Outputs the version of the driver"))
        .subcommand(
            clap::Command::new("multiplicity")
                .about("Reports the column multiplicity for a free-set size")
                .add_truth_table_args()
                .arg(
                    Arg::new("free_set_size")
                        .long("free_set_size")
                        .value_name("K")
                        .help("Number of inputs in the free set")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .value_name("N")
                        .help("Keep the first N inputs in the free set")
                        .action(ArgAction::Set),
                )
                .add_late_arg()
                .add_bool_arg("json", "Print the report as a single JSON object"),
        )
        .subcommand(
            clap::Command::new("decompose")
                .about("Decomposes a function of up to 16 inputs with the general engine")
                .add_truth_table_args()
                .arg(
                    Arg::new("free_set_size")
                        .long("free_set_size")
                        .value_name("K")
                        .help("Use exactly this free-set size instead of choosing one")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("lut_size")
                        .long("lut_size")
                        .value_name("N")
                        .help(
                            "Input limit of the top LUT (free set plus encoding bits); \
                             bound-set functions are not limited",
                        )
                        .action(ArgAction::Set),
                )
                .add_late_arg()
                .add_bool_arg("verify", "Re-simulate the rebuilt network")
                .add_output_args(),
        )
        .subcommand(
            clap::Command::new("acd66")
                .about("Fits a function of up to 11 inputs into two 6-input LUTs")
                .add_truth_table_args()
                .add_late_arg()
                .add_bool_arg(
                    "allow_shared_set",
                    "Let one bound-set input also feed the top LUT",
                )
                .add_bool_arg("verify", "Re-simulate the rebuilt network")
                .add_output_args(),
        )
        .subcommand(
            clap::Command::new("acd666")
                .about("Fits a function of up to 11 inputs into three 6-input LUTs")
                .add_truth_table_args()
                .add_late_arg()
                .add_bool_arg(
                    "allow_shared_set",
                    "Let one bound-set input also feed the top LUT",
                )
                .add_bool_arg("verify", "Re-simulate the rebuilt network")
                .add_output_args(),
        )
        .subcommand(
            clap::Command::new("batch")
                .about("Runs acd66 or acd666 over many functions, one JSON line each")
                .arg(
                    Arg::new("input_file")
                        .help("File with one hex truth table per line (optionally `n:hex`)")
                        .index(1),
                )
                .arg(
                    Arg::new("engine")
                        .long("engine")
                        .value_name("ENGINE")
                        .value_parser(["acd66", "acd666"])
                        .default_value("acd666")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("random")
                        .long("random")
                        .value_name("COUNT")
                        .help("Generate COUNT random functions instead of reading a file")
                        .conflicts_with("input_file")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("num_vars")
                        .long("num_vars")
                        .value_name("N")
                        .help("Input count of generated functions")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("SEED")
                        .help("Seed for generated functions")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_name("N")
                        .help("Worker threads (defaults to one per core)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("PATH")
                        .help("Write JSON lines here instead of stdout")
                        .action(ArgAction::Set),
                )
                .add_late_arg()
                .add_bool_arg(
                    "allow_shared_set",
                    "Let one bound-set input also feed the top LUT",
                )
                .add_bool_arg("verify", "Re-simulate the rebuilt network"),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config").cloned());

    let (name, result) = match matches.subcommand() {
        Some(("version", _)) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Some(("multiplicity", m)) => ("multiplicity", multiplicity::handle_multiplicity(m)),
        Some(("decompose", m)) => ("decompose", decompose::handle_decompose(m, &config)),
        Some(("acd66", m)) => (
            "acd66",
            lut_cascade::handle_lut_cascade(CascadeEngine::TwoLuts, m, &config),
        ),
        Some(("acd666", m)) => (
            "acd666",
            lut_cascade::handle_lut_cascade(CascadeEngine::ThreeLuts, m, &config),
        ),
        Some(("batch", m)) => ("batch", batch::handle_batch(m, &config)),
        _ => report_cli_error_and_exit("No valid subcommand provided.", None, vec![]),
    };
    if let Err(e) = result {
        report_cli_error_and_exit(&format!("{e:#}"), Some(name), vec![]);
    }
}
