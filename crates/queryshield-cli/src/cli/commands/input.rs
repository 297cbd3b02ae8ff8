//! File loading for commands. Core parse failures keep their `CoreError` so the
//! exit code can tell invalid input apart from I/O trouble.

use anyhow::{Context, Result};
use queryshield_core::{Budgets, CoreError, Report};
use std::path::Path;

pub fn load_report(path: &Path) -> Result<Report> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report: {}", path.display()))?;
    queryshield_core::parse(&raw)
        .with_context(|| format!("failed to parse report: {}", path.display()))
}

/// Unreadable budget files count as invalid budgets (exit 3), like unparsable ones.
pub fn load_budgets(path: &Path) -> Result<Budgets> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CoreError::invalid_budgets(format!("cannot read {}: {e}", path.display()))
    })?;
    let budgets = Budgets::from_yaml_str(&raw)
        .with_context(|| format!("failed to load budgets: {}", path.display()))?;
    if budgets.is_empty() {
        tracing::warn!(path = %path.display(), "budget file declares no budgets");
    }
    Ok(budgets)
}

pub fn load_optional_budgets(path: Option<&Path>) -> Result<Option<Budgets>> {
    path.map(load_budgets).transpose()
}

pub fn load_optional_report(path: Option<&Path>) -> Result<Option<Report>> {
    path.map(load_report).transpose()
}
