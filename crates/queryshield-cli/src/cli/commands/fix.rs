use anyhow::Result;

use super::input::load_report;
use crate::cli::args::FixArgs;
use crate::exit_codes;

pub fn run(args: &FixArgs) -> Result<i32> {
    let report = load_report(&args.report.report)?;
    let Some((test, problem)) = report.problems().find(|(_, p)| p.id == args.id) else {
        anyhow::bail!("no problem with id {:?} in {}", args.id, args.report.report.display());
    };

    let fix = queryshield_core::render(problem.suggestion.as_ref());
    if fix.is_empty() {
        eprintln!("No automated fix for {} ({}).", problem.id, test.name);
    } else {
        println!("{fix}");
    }
    Ok(exit_codes::SUCCESS)
}
