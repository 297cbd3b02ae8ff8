//! Text and JSON rendering of core results.

use anyhow::{Context, Result};
use queryshield_core::baseline::TestDelta;
use queryshield_core::evaluate::{ProblemGroup, TestOverview, TestStatus};
use queryshield_core::locate::SymbolMatch;
use queryshield_core::{Delta, Evaluation, Violation, Warning};
use serde::Serialize;
use std::fmt::Write as _;

const SQL_PREVIEW_CHARS: usize = 80;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

pub fn evaluation_text(eval: &Evaluation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "QueryShield: {} tests, {} problems, {} violations ({})",
        eval.tests.len(),
        eval.total_problems(),
        eval.violations.len(),
        match eval.violation_source {
            queryshield_core::evaluate::ViolationSource::Evaluated => "evaluated",
            queryshield_core::evaluate::ViolationSource::Reported => "as reported",
        }
    );
    if !eval.tests.is_empty() {
        out.push_str("\nTests:\n");
        for t in &eval.tests {
            out.push_str(&test_line(t));
        }
    }
    if !eval.violations.is_empty() {
        out.push_str("\nViolations:\n");
        out.push_str(&violations_text(&eval.violations));
    }
    if !eval.problems_by_type.is_empty() {
        out.push_str("\nProblems:\n");
        for group in &eval.problems_by_type {
            out.push_str(&group_text(group));
        }
    }
    if let Some(delta) = &eval.delta {
        out.push_str("\nBaseline:\n");
        out.push_str(&delta_text(delta));
    }
    if !eval.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        out.push_str(&warnings_text(&eval.warnings));
    }
    out
}

fn test_line(t: &TestOverview) -> String {
    let marker = match t.status {
        TestStatus::Pass => "ok  ",
        TestStatus::Warn => "warn",
        TestStatus::NPlusOne => "N+1 ",
    };
    let queries = t
        .queries_total
        .map(|q| format!("{q} queries"))
        .unwrap_or_else(|| "- queries".to_string());
    let p95 = t
        .queries_p95_ms
        .map(|p| format!(", p95 {p}ms"))
        .unwrap_or_default();
    let symbol = t
        .symbol
        .as_deref()
        .map(|s| format!(" -> {s}"))
        .unwrap_or_default();
    format!(
        "  [{marker}] {}  {queries}{p95}, {} problems{symbol}\n",
        t.name, t.problem_count
    )
}

pub fn violations_text(violations: &[Violation]) -> String {
    let mut out = String::new();
    for v in violations {
        let over = v
            .overage_percent()
            .map(|p| format!(" ({p:+.1}%)"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {}  {}: {} > {}{over}",
            v.test, v.violation_type, v.actual, v.max
        );
    }
    out
}

fn group_text(group: &ProblemGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {} ({})", group.problem_type, group.occurrences.len());
    for occ in &group.occurrences {
        let at = occ
            .location
            .as_ref()
            .map(|l| format!("  at {l}"))
            .unwrap_or_default();
        let _ = writeln!(out, "    {}  {}{at}", occ.test, occ.problem.id);
        if !occ.problem.sql.is_empty() {
            let _ = writeln!(out, "      sql: {}", preview(&occ.problem.sql));
        }
        if !occ.fix.is_empty() {
            let _ = writeln!(out, "      fix: {}", occ.fix);
        }
    }
    out
}

pub fn delta_text(delta: &Delta) -> String {
    let mut out = String::new();
    for m in &delta.totals {
        let _ = writeln!(
            out,
            "  {}: {} -> {} ({:+}, {})",
            m.metric,
            m.baseline,
            m.current,
            m.absolute_delta,
            m.percent_label()
        );
    }
    for t in &delta.tests {
        match t {
            TestDelta::Matched { .. } => {}
            TestDelta::Added { name } => {
                let _ = writeln!(out, "  + {name}");
            }
            TestDelta::Removed { name } => {
                let _ = writeln!(out, "  - {name}");
            }
        }
    }
    for p in &delta.problems.introduced {
        let _ = writeln!(out, "  new problem: {} {} ({})", p.problem_type, p.id, p.test);
    }
    for p in &delta.problems.resolved {
        let _ = writeln!(out, "  resolved: {} {} ({})", p.problem_type, p.id, p.test);
    }
    out
}

pub fn warnings_text(warnings: &[Warning]) -> String {
    warnings.iter().map(|w| format!("  {w}\n")).collect()
}

pub fn matches_text(matches: &[SymbolMatch]) -> String {
    let mut out = String::new();
    for m in matches {
        let _ = writeln!(
            out,
            "  {} -> {}",
            m.test,
            m.symbol.as_deref().unwrap_or("(no match)")
        );
    }
    out
}

fn preview(sql: &str) -> String {
    let single_line = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= SQL_PREVIEW_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(SQL_PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}
