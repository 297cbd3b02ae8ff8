use anyhow::Result;

use super::input::load_report;
use super::output;
use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::exit_codes;

/// Warnings never fail the command; only a malformed report does (exit 3).
pub fn run(args: &ValidateArgs) -> Result<i32> {
    let report = load_report(&args.report.report)?;
    let warnings = queryshield_core::validate(&report);

    match args.output.format {
        OutputFormat::Json => output::print_json(&warnings)?,
        OutputFormat::Text if warnings.is_empty() => {
            println!("Report OK ({} tests).", report.tests.len())
        }
        OutputFormat::Text => {
            println!("{} warning(s):", warnings.len());
            print!("{}", output::warnings_text(&warnings));
        }
    }
    Ok(exit_codes::SUCCESS)
}
