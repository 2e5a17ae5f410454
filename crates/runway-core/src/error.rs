//! Error types for Runway

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject NaN/infinite intermediate values so a rule can be skipped
/// instead of emitting a nonsensical number.
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidData(format!("{} is not finite", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "x").unwrap(), 1.5);
        let err = ensure_finite(f64::NAN, "burn ratio").unwrap_err();
        assert!(err.to_string().contains("burn ratio"));
        assert!(ensure_finite(f64::INFINITY, "y").is_err());
    }
}
