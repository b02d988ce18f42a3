//! Error types for the telemetry stream-processing unit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unknown operation kind '{0}'")]
    UnknownKind(String),

    #[error("Operation kind '{0}' is reserved and not implemented")]
    ReservedKind(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker is closed")]
    WorkerClosed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::ReservedKind("process".into()).to_string(),
            "Operation kind 'process' is reserved and not implemented"
        );
        assert_eq!(
            Error::UnknownKind("resample".into()).to_string(),
            "Unknown operation kind 'resample'"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<f64>("not a number").unwrap_err();
        assert!(matches!(Error::from(err), Error::Serialization(_)));
    }
}
