use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub mod common;
pub use common::*;

#[derive(Parser)]
#[command(
    name = "queryshield-eval",
    version,
    about = "Evaluate QueryShield reports against query budgets and a baseline run"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Full evaluation: violations, baseline delta, grouped problems, fixes
    Evaluate(EvaluateArgs),
    /// Re-derive budget violations and exit 2 when any exist
    BudgetCheck(BudgetCheckArgs),
    /// Compare the report against a baseline report
    Diff(DiffArgs),
    /// Report structural warnings (duplicate names, negative values)
    Validate(ValidateArgs),
    /// Correlate report tests with source symbols and show problem locations
    Locate(LocateArgs),
    /// Render the fix for one problem
    Fix(FixArgs),
    /// Watch report/budgets/baseline and re-evaluate on changes
    Watch(WatchArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Budget declarations (YAML or JSON); omitted = use violations recorded in the report
    #[arg(long, env = "QUERYSHIELD_BUDGETS")]
    pub budgets: Option<PathBuf>,

    /// Baseline report to diff against
    #[arg(long, env = "QUERYSHIELD_BASELINE")]
    pub baseline: Option<PathBuf>,

    #[command(flatten)]
    pub symbols: SymbolArgs,

    /// Exit 2 when violations are present
    #[arg(long)]
    pub fail_on_violations: bool,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BudgetCheckArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(long, env = "QUERYSHIELD_BUDGETS", default_value = DEFAULT_BUDGETS)]
    pub budgets: PathBuf,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DiffArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(long, env = "QUERYSHIELD_BASELINE")]
    pub baseline: PathBuf,

    /// Exit 2 when total queries or total problems increased
    #[arg(long)]
    pub fail_on_regression: bool,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LocateArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(flatten)]
    pub symbols: SymbolArgs,

    #[command(flatten)]
    pub output: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FixArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Problem id, e.g. n+1:app/views.py:42
    #[arg(long)]
    pub id: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(long, env = "QUERYSHIELD_BUDGETS")]
    pub budgets: Option<PathBuf>,

    #[arg(long, env = "QUERYSHIELD_BASELINE")]
    pub baseline: Option<PathBuf>,

    #[command(flatten)]
    pub symbols: SymbolArgs,

    /// Quiet period after the last change before re-evaluating
    #[arg(long, default_value_t = 300)]
    pub debounce_ms: u64,

    /// Clear the terminal before each run
    #[arg(long)]
    pub clear: bool,
}

impl WatchArgs {
    pub(crate) fn as_evaluate(&self) -> EvaluateArgs {
        EvaluateArgs {
            report: self.report.clone(),
            budgets: self.budgets.clone(),
            baseline: self.baseline.clone(),
            symbols: self.symbols.clone(),
            fail_on_violations: false,
            output: FormatArgs::default(),
        }
    }
}
