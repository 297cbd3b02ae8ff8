//! Error types for report and budget ingestion.

/// Errors raised while ingesting a report artifact or a budget declaration.
///
/// Everything downstream of a successful parse is total: evaluation, diffing,
/// matching and rendering never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The report is not well-formed JSON or lacks the required `tests` array.
    #[error("malformed report: {reason}")]
    MalformedReport { reason: String },

    /// The budget declaration could not be parsed or carries invalid limits.
    #[error("invalid budgets: {reason}")]
    InvalidBudgets { reason: String },
}

impl CoreError {
    pub fn malformed_report(reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            reason: reason.into(),
        }
    }

    pub fn invalid_budgets(reason: impl Into<String>) -> Self {
        Self::InvalidBudgets {
            reason: reason.into(),
        }
    }
}

/// Result type for report and budget ingestion.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn display_carries_reason() {
        let err = CoreError::malformed_report("missing field `tests`");
        assert_eq!(err.to_string(), "malformed report: missing field `tests`");

        let err = CoreError::invalid_budgets("max_queries must be >= 0");
        assert_eq!(err.to_string(), "invalid budgets: max_queries must be >= 0");
    }
}
