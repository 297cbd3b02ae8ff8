//! Single entry point for consumers (CI commenter, editor panel, inlay hints).
//!
//! Composes budget evaluation, baseline diffing, problem grouping, symbol
//! matching and fix rendering into one [`Evaluation`]. No I/O, no mutation of
//! the inputs: calling it again with the same inputs yields the same output in
//! the same order.

use serde::{Deserialize, Serialize};

use crate::baseline::{self, Delta};
use crate::budget::{self, Budgets};
use crate::fix;
use crate::locate::{self, SourceLocation, SymbolMatch};
use crate::report::{validate, Problem, ProblemType, Report, TestResult, Violation, Warning};

/// Where the violations of an [`Evaluation`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSource {
    /// Re-derived from the budgets supplied by the caller.
    Evaluated,
    /// Copied from the report's own `budget_violations`; no budgets supplied.
    Reported,
}

/// One problem in the context of its test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemOccurrence {
    pub test: String,
    pub problem: Problem,
    /// Jump-to-source target from the evidence trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Rendered fix; empty when no automated fix exists.
    pub fix: String,
}

/// Problems of one type, in original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemGroup {
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    pub occurrences: Vec<ProblemOccurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Warn,
    /// At least one N+1 problem; ranked above plain warnings.
    NPlusOne,
}

/// Row-level summary of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOverview {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries_p95_ms: Option<f64>,
    pub problem_count: usize,
    /// Distinct problem types in first-seen order.
    pub problem_types: Vec<ProblemType>,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    pub violation_source: ViolationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    pub problems_by_type: Vec<ProblemGroup>,
    pub matches: Vec<SymbolMatch>,
    pub tests: Vec<TestOverview>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl Evaluation {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn total_problems(&self) -> usize {
        self.problems_by_type.iter().map(|g| g.occurrences.len()).sum()
    }

    pub fn problems_of_type(&self, problem_type: &ProblemType) -> &[ProblemOccurrence] {
        self.problems_by_type
            .iter()
            .find(|g| &g.problem_type == problem_type)
            .map(|g| g.occurrences.as_slice())
            .unwrap_or(&[])
    }

    /// Symbol resolved for `test`, if the test was matched.
    pub fn symbol_for(&self, test: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.test == test)
            .and_then(|m| m.symbol.as_deref())
    }

    /// First test (in report order) that resolved to `symbol`.
    pub fn test_for_symbol(&self, symbol: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.symbol.as_deref() == Some(symbol))
            .map(|m| m.test.as_str())
    }
}

/// Builder over the optional inputs of an evaluation.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    report: &'a Report,
    budgets: Option<&'a Budgets>,
    baseline: Option<&'a Report>,
    symbols: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            budgets: None,
            baseline: None,
            symbols: Vec::new(),
        }
    }

    pub fn budgets(mut self, budgets: Option<&'a Budgets>) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn baseline(mut self, baseline: Option<&'a Report>) -> Self {
        self.baseline = baseline;
        self
    }

    /// Source symbols visible to the caller (e.g. test functions in the open file).
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn evaluate(&self) -> Evaluation {
        let report = self.report;

        let (violations, violation_source) = match self.budgets {
            Some(budgets) => (budget::evaluate(report, budgets), ViolationSource::Evaluated),
            None => (report.budget_violations.clone(), ViolationSource::Reported),
        };
        let delta = self.baseline.map(|base| baseline::diff(report, base));
        let matches = locate::match_report(report, &self.symbols);
        let tests = report
            .tests
            .iter()
            .zip(&matches)
            .map(|(t, m)| overview(t, m.symbol.clone()))
            .collect();

        let evaluation = Evaluation {
            violations,
            violation_source,
            delta,
            problems_by_type: group_by_type(report),
            matches,
            tests,
            warnings: validate(report),
        };
        tracing::debug!(
            violations = evaluation.violations.len(),
            problems = evaluation.total_problems(),
            groups = evaluation.problems_by_type.len(),
            "evaluated report"
        );
        evaluation
    }
}

/// Evaluate without symbol matching. See [`Evaluator`] for the full builder.
pub fn evaluate(report: &Report, budgets: Option<&Budgets>, baseline: Option<&Report>) -> Evaluation {
    Evaluator::new(report)
        .budgets(budgets)
        .baseline(baseline)
        .evaluate()
}

/// Group problems by type: types in first-seen order, problems in report order.
pub fn group_by_type(report: &Report) -> Vec<ProblemGroup> {
    let mut groups: Vec<ProblemGroup> = Vec::new();
    for (test, problem) in report.problems() {
        let occurrence = ProblemOccurrence {
            test: test.name.clone(),
            problem: problem.clone(),
            location: locate::primary_frame(problem),
            fix: fix::render(problem.suggestion.as_ref()),
        };
        match groups
            .iter_mut()
            .find(|g| g.problem_type == problem.problem_type)
        {
            Some(group) => group.occurrences.push(occurrence),
            None => groups.push(ProblemGroup {
                problem_type: problem.problem_type.clone(),
                occurrences: vec![occurrence],
            }),
        }
    }
    groups
}

fn overview(test: &TestResult, symbol: Option<String>) -> TestOverview {
    let mut problem_types: Vec<ProblemType> = Vec::new();
    for p in &test.problems {
        if !problem_types.contains(&p.problem_type) {
            problem_types.push(p.problem_type.clone());
        }
    }
    let status = if problem_types.contains(&ProblemType::NPlusOne) {
        TestStatus::NPlusOne
    } else if test.problems.is_empty() {
        TestStatus::Pass
    } else {
        TestStatus::Warn
    };

    TestOverview {
        name: test.name.clone(),
        queries_total: test.queries_total,
        duration_ms: test.duration_ms,
        queries_p95_ms: test.queries_p95_ms,
        problem_count: test.problems.len(),
        problem_types,
        status,
        symbol,
    }
}
