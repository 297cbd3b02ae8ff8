//! Shared argument types used across multiple commands.

use std::path::PathBuf;

pub const DEFAULT_REPORT: &str = ".queryshield/queryshield_report.json";
pub const DEFAULT_BUDGETS: &str = "queryshield.yml";

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Report produced by the analyzer run
    #[arg(long, env = "QUERYSHIELD_REPORT", default_value = DEFAULT_REPORT)]
    pub report: PathBuf,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SymbolArgs {
    /// Source symbol to correlate with report tests (repeatable)
    /// Example: --symbol test_order_list --symbol OrderTests.test_detail
    #[arg(long = "symbol", value_name = "NAME")]
    pub symbols: Vec<String>,
}

#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct FormatArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
