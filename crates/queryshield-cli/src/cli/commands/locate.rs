use anyhow::Result;
use queryshield_core::locate::{match_report, SymbolMatch};
use queryshield_core::{primary_frame, SourceLocation};
use serde::Serialize;
use std::fmt::Write as _;

use super::input::load_report;
use super::output;
use crate::cli::args::{LocateArgs, OutputFormat};
use crate::exit_codes;

#[derive(Serialize)]
struct ProblemLocation<'a> {
    test: &'a str,
    id: &'a str,
    location: SourceLocation,
}

#[derive(Serialize)]
struct LocateOutput<'a> {
    matches: Vec<SymbolMatch>,
    locations: Vec<ProblemLocation<'a>>,
}

pub fn run(args: &LocateArgs) -> Result<i32> {
    let report = load_report(&args.report.report)?;
    let matches = match_report(&report, &args.symbols.symbols);
    let locations: Vec<ProblemLocation<'_>> = report
        .problems()
        .filter_map(|(test, problem)| {
            primary_frame(problem).map(|location| ProblemLocation {
                test: &test.name,
                id: &problem.id,
                location,
            })
        })
        .collect();

    match args.output.format {
        OutputFormat::Json => output::print_json(&LocateOutput { matches, locations })?,
        OutputFormat::Text => {
            let mut out = String::new();
            if !args.symbols.symbols.is_empty() {
                out.push_str("Symbols:\n");
                out.push_str(&output::matches_text(&matches));
            }
            out.push_str("Problem locations:\n");
            for l in &locations {
                let _ = writeln!(out, "  {}  {}  {}", l.location, l.id, l.test);
            }
            print!("{out}");
        }
    }
    Ok(exit_codes::SUCCESS)
}
