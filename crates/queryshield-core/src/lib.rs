//! Evaluation core for QueryShield query-performance reports.
//!
//! The crate parses the JSON report an analyzer run produces, evaluates it
//! against declared budgets and an optional baseline report, correlates report
//! entries with source symbols, and renders structured fix suggestions. Every
//! operation is a pure function over immutable inputs.

pub mod baseline;
pub mod budget;
pub mod errors;
pub mod evaluate;
pub mod fix;
pub mod locate;
pub mod report;

pub use baseline::{diff, Delta, MetricDelta, TestDelta};
pub use budget::{evaluate as evaluate_budgets, Budget, Budgets};
pub use errors::{CoreError, Result};
pub use evaluate::{evaluate, Evaluation, Evaluator};
pub use fix::render;
pub use locate::{match_symbol, primary_frame, SourceLocation};
pub use report::{parse, validate, Problem, ProblemType, Report, TestResult, Violation, Warning};
