//! Error types for the Keywarden core crate.

use thiserror::Error;

/// Top-level error type for all Keywarden operations.
#[derive(Debug, Error)]
pub enum KeywardenError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("admin API error: {0}")]
    Admin(String),
}

/// A convenience Result alias that defaults to [`KeywardenError`].
pub type Result<T> = std::result::Result<T, KeywardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = KeywardenError::Config("missing field".into());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = KeywardenError::from(io_err);
        assert!(matches!(err, KeywardenError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn auth_error_display() {
        let err = KeywardenError::Auth("token request rejected".into());
        assert_eq!(
            err.to_string(),
            "authentication error: token request rejected"
        );
    }

    #[test]
    fn admin_error_display() {
        let err = KeywardenError::Admin("list users failed (500)".into());
        assert_eq!(err.to_string(), "admin API error: list users failed (500)");
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(KeywardenError::Admin("bad plan".into()));
        assert!(err.is_err());
    }
}
