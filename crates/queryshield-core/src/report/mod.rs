//! Typed model of the analyzer's JSON report artifact.
//!
//! Only `tests` is required. Every other field defaults to empty or absent so
//! the artifact format can grow additively without breaking older consumers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::errors::{CoreError, Result};

pub mod problem;
pub mod validate;

pub use problem::{Evidence, Frame, Problem, ProblemType, Suggestion};
pub use validate::{validate, Warning, WarningCode};

/// Root artifact produced once per analysis run. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Measured tests in analyzer emission order.
    pub tests: Vec<TestResult>,

    /// Violations recorded by the analyzer against whichever budget file it used.
    #[serde(default, deserialize_with = "null_default")]
    pub budget_violations: Vec<Violation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_analysis: Option<CostAnalysis>,
}

/// One measured test or operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Fully qualified, dot separated identifier (`module.Class.test_foo`).
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub queries_total: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries_p95_ms: Option<f64>,

    /// Detected problems in detection order.
    #[serde(default, deserialize_with = "null_default")]
    pub problems: Vec<Problem>,

    /// Fields this model does not name (e.g. the captured query list or
    /// analyzer-specific counters). Numeric entries are addressable by custom
    /// budget axes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Aggregate cost estimate attached by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_monthly_cost: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_queries: Option<i64>,
}

/// One budget breach. References its test by name only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(default, deserialize_with = "null_default")]
    pub test: String,

    /// Budget axis that was exceeded (`max_queries`, `forbidden:N+1`, ...).
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub violation_type: String,

    #[serde(default)]
    pub actual: f64,

    #[serde(default)]
    pub max: f64,
}

impl Violation {
    pub fn new(
        test: impl Into<String>,
        violation_type: impl Into<String>,
        actual: f64,
        max: f64,
    ) -> Self {
        Self {
            test: test.into(),
            violation_type: violation_type.into(),
            actual,
            max,
        }
    }

    /// How far `actual` exceeds `max`, in percent. `None` for a zero budget.
    pub fn overage_percent(&self) -> Option<f64> {
        if self.max == 0.0 {
            None
        } else {
            Some((self.actual / self.max) * 100.0 - 100.0)
        }
    }
}

/// Measured quantity of a [`TestResult`], shared by budget axes and baseline deltas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Metric {
    QueriesTotal,
    DurationMs,
    QueriesP95Ms,
    Problems,
    /// Any other numeric field of the test entry, looked up in [`TestResult::extra`].
    Custom(String),
}

impl Metric {
    pub fn name(&self) -> &str {
        match self {
            Self::QueriesTotal => "queries_total",
            Self::DurationMs => "duration_ms",
            Self::QueriesP95Ms => "queries_p95_ms",
            Self::Problems => "problems",
            Self::Custom(field) => field,
        }
    }
}

impl TestResult {
    /// Measured value for `metric`, or `None` when the report does not carry it.
    pub fn measured(&self, metric: &Metric) -> Option<f64> {
        match metric {
            Metric::QueriesTotal => self.queries_total.map(|q| q as f64),
            Metric::DurationMs => self.duration_ms,
            Metric::QueriesP95Ms => self.queries_p95_ms,
            Metric::Problems => Some(self.problems.len() as f64),
            Metric::Custom(field) => self.extra.get(field).and_then(serde_json::Value::as_f64),
        }
    }
}

impl Report {
    pub fn test(&self, name: &str) -> Option<&TestResult> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// Iterate `(test, problem)` pairs in report order.
    pub fn problems(&self) -> impl Iterator<Item = (&TestResult, &Problem)> {
        self.tests
            .iter()
            .flat_map(|t| t.problems.iter().map(move |p| (t, p)))
    }
}

/// Parse raw report text.
///
/// Fails with [`CoreError::MalformedReport`] when the text is not JSON, the
/// root is not an object, or `tests` is missing or not an array.
pub fn parse(raw: &str) -> Result<Report> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::malformed_report(format!("invalid JSON: {e}")))?;

    let root = value
        .as_object()
        .ok_or_else(|| CoreError::malformed_report("report root must be a JSON object"))?;

    match root.get("tests") {
        None => {
            return Err(CoreError::malformed_report(
                "missing required field `tests`",
            ))
        }
        Some(tests) if !tests.is_array() => {
            return Err(CoreError::malformed_report("`tests` must be an array"))
        }
        Some(_) => {}
    }

    let report: Report =
        serde_json::from_value(value).map_err(|e| CoreError::malformed_report(e.to_string()))?;
    tracing::debug!(tests = report.tests.len(), "parsed report");
    Ok(report)
}

/// Treat an explicit `null` like an absent field.
pub(crate) fn null_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Counts are integers, but some emitters write them as `12.0`.
pub(crate) fn lenient_count<'de, D>(d: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<serde_json::Value> = Option::deserialize(d)?;
    match opt {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Some(f as i64)),
                    _ => Err(serde::de::Error::custom(format!(
                        "count must be an integer, got {n}"
                    ))),
                }
            }
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "count must be a number, got: {other}"
        ))),
    }
}
