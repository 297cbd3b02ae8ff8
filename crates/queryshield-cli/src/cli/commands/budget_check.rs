use anyhow::Result;
use serde::Serialize;

use super::input::{load_budgets, load_report};
use super::output;
use crate::cli::args::{BudgetCheckArgs, OutputFormat};
use crate::exit_codes;
use queryshield_core::Violation;

#[derive(Serialize)]
struct BudgetCheckOutput<'a> {
    ok: bool,
    violations: &'a [Violation],
}

pub fn run(args: &BudgetCheckArgs) -> Result<i32> {
    let budgets = load_budgets(&args.budgets)?;
    let report = load_report(&args.report.report)?;
    let violations = queryshield_core::evaluate_budgets(&report, &budgets);

    match args.output.format {
        OutputFormat::Json => output::print_json(&BudgetCheckOutput {
            ok: violations.is_empty(),
            violations: &violations,
        })?,
        OutputFormat::Text if violations.is_empty() => println!("All budgets met."),
        OutputFormat::Text => {
            println!("{} budget violation(s):", violations.len());
            print!("{}", output::violations_text(&violations));
        }
    }

    Ok(if violations.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::VIOLATIONS
    })
}
