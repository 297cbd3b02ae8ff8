use anyhow::Result;

use super::input::load_report;
use super::output;
use crate::cli::args::{DiffArgs, OutputFormat};
use crate::exit_codes;

pub fn run(args: &DiffArgs) -> Result<i32> {
    let current = load_report(&args.report.report)?;
    let baseline = load_report(&args.baseline)?;
    let delta = queryshield_core::diff(&current, &baseline);

    match args.output.format {
        OutputFormat::Json => output::print_json(&delta)?,
        OutputFormat::Text => print!("{}", output::delta_text(&delta)),
    }

    if args.fail_on_regression && delta.is_regression() {
        return Ok(exit_codes::VIOLATIONS);
    }
    Ok(exit_codes::SUCCESS)
}
