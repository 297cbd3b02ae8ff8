//! Before/after comparison of two reports.
//!
//! Totals are summed over each report independently, so a test that exists on
//! only one side still counts toward that side's aggregate. Per-test deltas pair
//! tests by name and list unmatched tests as added or removed.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::report::{Metric, Report, TestResult};

pub const TOTAL_QUERIES: &str = "total_queries";
pub const TOTAL_DURATION_MS: &str = "total_duration_ms";
pub const TOTAL_PROBLEMS: &str = "total_problems";
pub const ESTIMATED_MONTHLY_COST: &str = "estimated_monthly_cost";

const PER_TEST_METRICS: [Metric; 4] = [
    Metric::QueriesTotal,
    Metric::DurationMs,
    Metric::QueriesP95Ms,
    Metric::Problems,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increased,
    Decreased,
    Unchanged,
}

/// Change of one metric between baseline and current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub metric: String,
    pub current: f64,
    pub baseline: f64,
    pub absolute_delta: f64,
    /// `None` when the baseline is zero and the current value is not: the
    /// relative change is undefined and should be shown as "N/A".
    pub percent_delta: Option<f64>,
}

impl MetricDelta {
    pub fn new(metric: impl Into<String>, current: f64, baseline: f64) -> Self {
        if current == baseline {
            return Self {
                metric: metric.into(),
                current,
                baseline,
                absolute_delta: 0.0,
                percent_delta: Some(0.0),
            };
        }
        let percent_delta = if baseline == 0.0 {
            None
        } else {
            Some((current - baseline) / baseline.abs() * 100.0).filter(|p| p.is_finite())
        };
        Self {
            metric: metric.into(),
            current,
            baseline,
            absolute_delta: saturate(current - baseline),
            percent_delta,
        }
    }

    pub fn direction(&self) -> Direction {
        if self.absolute_delta > 0.0 {
            Direction::Increased
        } else if self.absolute_delta < 0.0 {
            Direction::Decreased
        } else {
            Direction::Unchanged
        }
    }

    /// Signed percentage with one decimal, or `N/A` when undefined.
    pub fn percent_label(&self) -> String {
        match self.percent_delta {
            Some(p) => format!("{p:+.1}%"),
            None => "N/A".to_string(),
        }
    }
}

/// Per-test comparison outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestDelta {
    /// Present in both reports; metrics measured on both sides.
    Matched { name: String, metrics: Vec<MetricDelta> },
    /// Only in the current report.
    Added { name: String },
    /// Only in the baseline report.
    Removed { name: String },
}

impl TestDelta {
    pub fn name(&self) -> &str {
        match self {
            Self::Matched { name, .. } | Self::Added { name } | Self::Removed { name } => name,
        }
    }
}

/// A problem identified by its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRef {
    pub test: String,
    pub id: String,
    #[serde(rename = "type")]
    pub problem_type: String,
}

/// Problems that appeared or disappeared between the two runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemChurn {
    pub introduced: Vec<ProblemRef>,
    pub resolved: Vec<ProblemRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub totals: Vec<MetricDelta>,
    pub tests: Vec<TestDelta>,
    pub problems: ProblemChurn,
}

impl Delta {
    pub fn total(&self, metric: &str) -> Option<&MetricDelta> {
        self.totals.iter().find(|m| m.metric == metric)
    }

    /// True when total queries or total problems went up.
    pub fn is_regression(&self) -> bool {
        [TOTAL_QUERIES, TOTAL_PROBLEMS].iter().any(|m| {
            self.total(m)
                .map_or(false, |d| d.direction() == Direction::Increased)
        })
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().filter_map(|t| match t {
            TestDelta::Added { name } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().filter_map(|t| match t {
            TestDelta::Removed { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Compare `current` against `baseline`.
pub fn diff(current: &Report, baseline: &Report) -> Delta {
    let mut totals = vec![
        MetricDelta::new(
            TOTAL_QUERIES,
            sum(current, &Metric::QueriesTotal),
            sum(baseline, &Metric::QueriesTotal),
        ),
        MetricDelta::new(
            TOTAL_DURATION_MS,
            sum(current, &Metric::DurationMs),
            sum(baseline, &Metric::DurationMs),
        ),
        MetricDelta::new(
            TOTAL_PROBLEMS,
            sum(current, &Metric::Problems),
            sum(baseline, &Metric::Problems),
        ),
    ];
    let cost = |r: &Report| r.cost_analysis.as_ref().and_then(|c| c.estimated_monthly_cost);
    if let (Some(cur), Some(base)) = (cost(current), cost(baseline)) {
        totals.push(MetricDelta::new(ESTIMATED_MONTHLY_COST, cur, base));
    }

    let baseline_by_name: HashMap<&str, &TestResult> = baseline
        .tests
        .iter()
        .rev()
        .map(|t| (t.name.as_str(), t))
        .collect();
    let current_names: HashSet<&str> = current.tests.iter().map(|t| t.name.as_str()).collect();

    let mut tests = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for test in &current.tests {
        if !reported.insert(test.name.as_str()) {
            continue;
        }
        match baseline_by_name.get(test.name.as_str()) {
            Some(base) => tests.push(TestDelta::Matched {
                name: test.name.clone(),
                metrics: per_test_metrics(test, base),
            }),
            None => tests.push(TestDelta::Added {
                name: test.name.clone(),
            }),
        }
    }
    let mut removed_seen: HashSet<&str> = HashSet::new();
    for test in &baseline.tests {
        if !current_names.contains(test.name.as_str()) && removed_seen.insert(test.name.as_str()) {
            tests.push(TestDelta::Removed {
                name: test.name.clone(),
            });
        }
    }

    let delta = Delta {
        totals,
        tests,
        problems: problem_churn(current, baseline),
    };
    tracing::debug!(
        tests = delta.tests.len(),
        regression = delta.is_regression(),
        "computed baseline delta"
    );
    delta
}

/// Totals saturate at the largest finite `f64` instead of overflowing to infinity.
fn sum(report: &Report, metric: &Metric) -> f64 {
    report
        .tests
        .iter()
        .filter_map(|t| t.measured(metric))
        .fold(0.0, |acc, v| saturate(acc + v))
}

fn saturate(v: f64) -> f64 {
    v.clamp(-f64::MAX, f64::MAX)
}

fn per_test_metrics(current: &TestResult, baseline: &TestResult) -> Vec<MetricDelta> {
    PER_TEST_METRICS
        .iter()
        .filter_map(|metric| {
            let cur = current.measured(metric)?;
            let base = baseline.measured(metric)?;
            Some(MetricDelta::new(metric.name(), cur, base))
        })
        .collect()
}

fn problem_churn(current: &Report, baseline: &Report) -> ProblemChurn {
    let ids = |r: &Report| -> HashSet<String> {
        r.problems()
            .filter(|(_, p)| !p.id.is_empty())
            .map(|(_, p)| p.id.clone())
            .collect()
    };
    let current_ids = ids(current);
    let baseline_ids = ids(baseline);

    let only_in = |r: &Report, other: &HashSet<String>| -> Vec<ProblemRef> {
        let mut seen = HashSet::new();
        r.problems()
            .filter(|(_, p)| !p.id.is_empty() && !other.contains(&p.id) && seen.insert(p.id.clone()))
            .map(|(t, p)| ProblemRef {
                test: t.name.clone(),
                id: p.id.clone(),
                problem_type: p.problem_type.as_str().to_string(),
            })
            .collect()
    };

    ProblemChurn {
        introduced: only_in(current, &baseline_ids),
        resolved: only_in(baseline, &current_ids),
    }
}
