use std::path::PathBuf;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// An expected input file is missing or unreadable
    #[error("{}: {source}", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A label class has too few members to be stratified
    #[error("Insufficient stratum size: label {label} has {count} member(s), at least 2 are required")]
    InsufficientStratumSize { label: usize, count: usize },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// CSV decoding errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Model fitting errors
    #[error("Training error: {0}")]
    Training(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::DataUnavailable { .. } => "DATA_UNAVAILABLE",
            AppError::InsufficientStratumSize { .. } => "INSUFFICIENT_STRATUM_SIZE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The only failure the binary recovers from: a missing input file at startup.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, AppError::DataUnavailable { .. })
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Validation("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::InsufficientStratumSize { label: 1, count: 1 }.error_code(),
            "INSUFFICIENT_STRATUM_SIZE"
        );
        assert_eq!(
            AppError::Training("test".to_string()).error_code(),
            "TRAINING_ERROR"
        );
    }

    #[test]
    fn test_data_unavailable_display() {
        let err = AppError::DataUnavailable {
            path: PathBuf::from("data/synthetic_soh.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("synthetic_soh.csv"));
        assert!(err.to_string().contains("not found"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_only_missing_data_is_recoverable() {
        assert!(!AppError::Internal("boom".to_string()).is_data_unavailable());
        assert!(!AppError::InsufficientStratumSize { label: 0, count: 1 }.is_data_unavailable());
    }
}
