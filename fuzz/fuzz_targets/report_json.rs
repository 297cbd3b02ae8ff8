//! Arbitrary bytes through the report parser and, when they parse, through
//! the whole evaluation facade (self-diff included).

#![no_main]

use libfuzzer_sys::fuzz_target;
use queryshield_core::{diff, evaluate, parse};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(report) = parse(raw) else {
        return;
    };

    let eval = evaluate(&report, None, Some(&report));
    assert_eq!(eval.matches.len(), report.tests.len());

    let delta = diff(&report, &report);
    for m in &delta.totals {
        assert_eq!(m.absolute_delta, 0.0);
        assert_eq!(m.percent_delta, Some(0.0));
    }
});
