use super::{Budget, Budgets};
use crate::report::{Report, TestResult, Violation};

/// Re-derive budget violations for every test in `report`.
///
/// Violations follow report order, then axis declaration order, then forbid
/// rule order. Tests without a resolvable budget are skipped. The report's own
/// `budget_violations` field is never consulted.
pub fn evaluate(report: &Report, budgets: &Budgets) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut evaluated = 0usize;

    for test in &report.tests {
        let Some(budget) = budgets.resolve(&test.name) else {
            continue;
        };
        evaluated += 1;
        violations.extend(check_test(test, &budget));
    }

    tracing::debug!(
        tests = report.tests.len(),
        evaluated,
        violations = violations.len(),
        "evaluated budgets"
    );
    violations
}

/// Violations of a single test against an already resolved budget.
pub fn check_test(test: &TestResult, budget: &Budget) -> Vec<Violation> {
    let mut out = Vec::new();

    for axis in &budget.axes {
        // Missing measurement means "not applicable", not zero.
        let Some(measured) = test.measured(&axis.metric) else {
            continue;
        };
        if measured > axis.max {
            out.push(Violation::new(&test.name, &axis.key, measured, axis.max));
        }
    }

    for rule in &budget.forbid {
        let hits = test
            .problems
            .iter()
            .filter(|p| rule.matches(p) && !budget.is_ignored(p))
            .count();
        if hits > 0 {
            out.push(Violation::new(
                &test.name,
                format!("forbidden:{}", rule.label()),
                hits as f64,
                0.0,
            ));
        }
    }

    out
}
