//! Budget declarations from arbitrary text. Parsing must never panic, and every
//! violation produced from a parsed declaration must exceed its limit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use queryshield_core::{evaluate_budgets, parse, Budgets};

const REPORT: &str = r#"{"tests": [
    {"name": "a.test_one", "queries_total": 7, "duration_ms": 12.5, "queries_p95_ms": 1.5,
     "problems": [{"type": "N+1", "id": "n+1:a.py:1"}, {"type": "MISSING_INDEX", "id": "idx:t.c"}]},
    {"name": "a.test_two", "queries_total": 0, "problems": []}
]}"#;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(budgets) = Budgets::from_yaml_str(raw) else {
        return;
    };
    let Ok(report) = parse(REPORT) else {
        return;
    };

    for v in evaluate_budgets(&report, &budgets) {
        if v.violation_type.starts_with("forbidden:") {
            assert!(v.actual >= 1.0);
        } else {
            assert!(v.actual > v.max);
        }
    }
});
