// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let prefix = subcommand.map(|s| format!("{s}: ")).unwrap_or_default();
    eprintln!("acd-driver: {}{}", prefix, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key.dimmed(), value);
    }
    std::process::exit(1);
}
