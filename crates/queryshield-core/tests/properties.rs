//! Property checks over generated reports and budgets.

use proptest::prelude::*;
use queryshield_core::baseline::TestDelta;
use queryshield_core::budget::{check_test, Budget, Budgets};
use queryshield_core::{diff, evaluate, evaluate_budgets, parse, Report};
use serde_json::json;

const TYPES: [&str; 4] = ["N+1", "MISSING_INDEX", "SORT_WITHOUT_INDEX", "LOCK_CONTENTION"];

fn arb_test() -> impl Strategy<Value = serde_json::Value> {
    (
        0i64..200,
        proptest::option::of(0.0f64..2000.0),
        proptest::option::of(0.0f64..50.0),
        proptest::collection::vec(0usize..TYPES.len(), 0..5),
    )
        .prop_map(|(queries, duration, p95, problem_types)| {
            let problems: Vec<_> = problem_types
                .iter()
                .enumerate()
                .map(|(i, t)| json!({"type": TYPES[*t], "id": format!("p{i}"), "sql": "SELECT 1"}))
                .collect();
            let mut test = json!({"queries_total": queries, "problems": problems});
            if let Some(d) = duration {
                test["duration_ms"] = json!(d);
            }
            if let Some(p) = p95 {
                test["queries_p95_ms"] = json!(p);
            }
            test
        })
}

fn arb_report() -> impl Strategy<Value = Report> {
    proptest::collection::vec(arb_test(), 0..8).prop_map(|tests| {
        let tests: Vec<_> = tests
            .into_iter()
            .enumerate()
            .map(|(i, mut t)| {
                t["name"] = json!(format!("pkg.tests.Case.test_{i}"));
                t
            })
            .collect();
        parse(&json!({ "tests": tests }).to_string()).expect("generated report parses")
    })
}

fn arb_budget() -> impl Strategy<Value = Budget> {
    (
        proptest::option::of(0.0f64..100.0),
        proptest::option::of(0.0f64..1000.0),
        proptest::option::of(0.0f64..20.0),
        proptest::option::of(0.0f64..3.0),
        any::<bool>(),
    )
        .prop_map(|(queries, duration, p95, problems, forbid_n1)| {
            let mut budget = Budget::new();
            if let Some(q) = queries {
                budget = budget.with_max("max_queries", q);
            }
            if let Some(d) = duration {
                budget = budget.with_max("max_duration_ms", d);
            }
            if let Some(p) = p95 {
                budget = budget.with_max("max_p95_ms", p);
            }
            if let Some(p) = problems {
                budget = budget.with_max("max_problems", p);
            }
            if forbid_n1 {
                budget = budget.with_forbid(queryshield_core::budget::ForbidRule::problem_type("N+1"));
            }
            budget
        })
}

proptest! {
    #[test]
    fn axis_violations_always_exceed_their_limit(report in arb_report(), budget in arb_budget()) {
        let budgets = Budgets::new().with_default(budget);
        for v in evaluate_budgets(&report, &budgets) {
            prop_assert!(v.actual > v.max, "{v:?}");
        }
    }

    #[test]
    fn per_test_violations_never_exceed_declared_checks(report in arb_report(), budget in arb_budget()) {
        for test in &report.tests {
            prop_assert!(check_test(test, &budget).len() <= budget.declared_checks());
        }
    }

    #[test]
    fn evaluation_is_stable_across_calls(report in arb_report(), budget in arb_budget()) {
        let budgets = Budgets::new().with_default(budget);
        let first = evaluate(&report, Some(&budgets), Some(&report));
        let second = evaluate(&report, Some(&budgets), Some(&report));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn self_diff_is_zero_everywhere(report in arb_report()) {
        let delta = diff(&report, &report);
        for m in &delta.totals {
            prop_assert_eq!(m.absolute_delta, 0.0);
            prop_assert_eq!(m.percent_delta, Some(0.0));
        }
        for t in &delta.tests {
            match t {
                TestDelta::Matched { metrics, .. } => {
                    for m in metrics {
                        prop_assert_eq!(m.absolute_delta, 0.0);
                        prop_assert_eq!(m.percent_delta, Some(0.0));
                    }
                }
                other => prop_assert!(false, "unexpected {other:?}"),
            }
        }
        prop_assert!(delta.problems.introduced.is_empty());
        prop_assert!(delta.problems.resolved.is_empty());
    }

    #[test]
    fn growth_from_zero_has_undefined_percent(queries in 1i64..10_000) {
        let base = parse(r#"{"tests": [{"name": "t", "queries_total": 0}]}"#).unwrap();
        let cur = parse(&json!({"tests": [{"name": "t", "queries_total": queries}]}).to_string()).unwrap();
        let total = diff(&cur, &base);
        let total = total.total(queryshield_core::baseline::TOTAL_QUERIES).unwrap();
        prop_assert_eq!(total.percent_delta, None);
        prop_assert_eq!(total.absolute_delta, queries as f64);
    }
}
