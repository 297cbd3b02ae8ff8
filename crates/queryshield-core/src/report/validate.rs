//! Non-fatal structural checks on a parsed report.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    #[serde(rename = "W_DUPLICATE_TEST")]
    DuplicateTest,
    #[serde(rename = "W_EMPTY_TEST_NAME")]
    EmptyTestName,
    #[serde(rename = "W_NEGATIVE_VALUE")]
    NegativeValue,
    #[serde(rename = "W_VIOLATION_NOT_EXCEEDED")]
    ViolationNotExceeded,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateTest => "W_DUPLICATE_TEST",
            Self::EmptyTestName => "W_EMPTY_TEST_NAME",
            Self::NegativeValue => "W_NEGATIVE_VALUE",
            Self::ViolationNotExceeded => "W_VIOLATION_NOT_EXCEEDED",
        }
    }
}

/// A structural oddity. Surfaced to the caller, never blocks evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub message: String,
}

impl Warning {
    fn new(code: WarningCode, test: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code,
            test: test.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.test {
            Some(test) => write!(f, "[{}] {}: {}", self.code.as_str(), test, self.message),
            None => write!(f, "[{}] {}", self.code.as_str(), self.message),
        }
    }
}

/// Check a report for duplicate or empty test names, negative measurements
/// and recorded violations that do not actually exceed their budget.
///
/// Warnings come out in report order: tests first, then recorded violations,
/// then cost figures.
pub fn validate(report: &Report) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (idx, test) in report.tests.iter().enumerate() {
        let name = test.name.as_str();
        if name.is_empty() {
            warnings.push(Warning::new(
                WarningCode::EmptyTestName,
                None,
                format!("test at index {idx} has an empty name"),
            ));
        } else if !seen.insert(name) {
            warnings.push(Warning::new(
                WarningCode::DuplicateTest,
                Some(name),
                format!("duplicate test name (index {idx})"),
            ));
        }

        let label = (!name.is_empty()).then_some(name);
        if let Some(q) = test.queries_total.filter(|q| *q < 0) {
            warnings.push(negative(label, "queries_total", q as f64));
        }
        if let Some(d) = test.duration_ms.filter(|d| *d < 0.0) {
            warnings.push(negative(label, "duration_ms", d));
        }
        if let Some(p95) = test.queries_p95_ms.filter(|p| *p < 0.0) {
            warnings.push(negative(label, "queries_p95_ms", p95));
        }
        for problem in &test.problems {
            if let Some(c) = problem.count.filter(|c| *c < 0) {
                warnings.push(negative(
                    label,
                    &format!("problem {} count", problem.id),
                    c as f64,
                ));
            }
        }
    }

    for v in &report.budget_violations {
        if v.actual <= v.max {
            warnings.push(Warning::new(
                WarningCode::ViolationNotExceeded,
                Some(v.test.as_str()),
                format!(
                    "recorded {} violation does not exceed its budget ({} <= {})",
                    v.violation_type, v.actual, v.max
                ),
            ));
        }
    }

    if let Some(cost) = &report.cost_analysis {
        if let Some(c) = cost.estimated_monthly_cost.filter(|c| *c < 0.0) {
            warnings.push(negative(None, "cost_analysis.estimated_monthly_cost", c));
        }
        if let Some(q) = cost.total_queries.filter(|q| *q < 0) {
            warnings.push(negative(None, "cost_analysis.total_queries", q as f64));
        }
    }

    warnings
}

fn negative(test: Option<&str>, field: &str, value: f64) -> Warning {
    Warning::new(
        WarningCode::NegativeValue,
        test,
        format!("{field} is negative ({value})"),
    )
}
