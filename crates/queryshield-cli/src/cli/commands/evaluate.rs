use anyhow::Result;
use queryshield_core::{Evaluation, Evaluator};

use super::input::{load_optional_budgets, load_optional_report, load_report};
use super::output;
use crate::cli::args::{EvaluateArgs, OutputFormat};
use crate::exit_codes;

pub fn run(args: &EvaluateArgs) -> Result<i32> {
    let eval = evaluate_files(args)?;

    match args.output.format {
        OutputFormat::Json => output::print_json(&eval)?,
        OutputFormat::Text => print!("{}", output::evaluation_text(&eval)),
    }

    if args.fail_on_violations && eval.has_violations() {
        return Ok(exit_codes::VIOLATIONS);
    }
    Ok(exit_codes::SUCCESS)
}

/// Load every input named by `args` and run the facade once.
pub(crate) fn evaluate_files(args: &EvaluateArgs) -> Result<Evaluation> {
    let report = load_report(&args.report.report)?;
    let budgets = load_optional_budgets(args.budgets.as_deref())?;
    let baseline = load_optional_report(args.baseline.as_deref())?;

    let eval = Evaluator::new(&report)
        .budgets(budgets.as_ref())
        .baseline(baseline.as_ref())
        .symbols(args.symbols.symbols.iter().cloned())
        .evaluate();

    for w in &eval.warnings {
        tracing::warn!(code = w.code.as_str(), "{}", w.message);
    }
    Ok(eval)
}
