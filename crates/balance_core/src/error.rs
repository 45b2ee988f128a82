use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Sampling error in table {table_id}: {reason}")]
    Sampling { table_id: String, reason: String },

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Unsupported config format: {path}")]
    UnsupportedConfigFormat { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BalanceError {
    /// Whether a batch run can continue past this error.
    ///
    /// Per-table failures only drop the affected table; configuration and
    /// IO problems stop the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BalanceError::InvalidTable(_) => true,
            BalanceError::Sampling { .. } => true,
            BalanceError::InvalidConfig(_) => false,
            BalanceError::UnsupportedConfigFormat { .. } => false,
            BalanceError::Io(_) => false,
            BalanceError::Json(_) => false,
            BalanceError::Yaml(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BalanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_errors_are_recoverable() {
        assert!(BalanceError::InvalidTable("empty id".into()).is_recoverable());
        assert!(BalanceError::Sampling {
            table_id: "spread/X".into(),
            reason: "NaN".into()
        }
        .is_recoverable());
        assert!(!BalanceError::InvalidConfig(vec!["bad".into()]).is_recoverable());
    }

    #[test]
    fn test_invalid_config_message_joins_errors() {
        let err = BalanceError::InvalidConfig(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
    }
}
