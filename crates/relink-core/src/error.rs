use thiserror::Error;

/// Top-level error type for Relink.
#[derive(Debug, Error)]
pub enum RelinkError {
    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Rule table error (bad domain entry, bad redirector base).
    #[error("rules error: {0}")]
    Rules(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelinkError::Channel("telegram send failed".into());
        assert_eq!(err.to_string(), "channel error: telegram send failed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RelinkError = io_err.into();
        assert!(matches!(err, RelinkError::Io(_)));
    }
}
