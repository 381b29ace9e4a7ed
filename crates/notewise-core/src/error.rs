//! Error types for notewise.

use thiserror::Error;

/// Result type alias using notewise's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error category.
///
/// The save queue and the UI branch on the kind, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or degenerate input. Usually answered with a low-confidence default.
    Input,
    /// Persistence, network, or timeout failure. Retried with backoff.
    TransientIo,
    /// Unknown model, bad URL, invalid settings. Never retried.
    Configuration,
    /// Malformed payload (stream chunk, preferences blob).
    Decoding,
    /// Work was cancelled through a cancellation token.
    Cancelled,
    /// Bug or broken invariant.
    Internal,
}

/// Core error type for notewise operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Persisting a draft failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An operation exceeded its time budget
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Remote server answered with a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Requested model is not installed on the inference server
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The operation was cancelled before it finished
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) | Error::NoteNotFound(_) => ErrorKind::Input,
            Error::Persistence(_)
            | Error::Timeout(_)
            | Error::Request(_)
            | Error::Server { .. }
            | Error::Io(_) => ErrorKind::TransientIo,
            Error::ModelNotFound(_) | Error::Config(_) => ErrorKind::Configuration,
            Error::Serialization(_) => ErrorKind::Decoding,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientIo
    }

    /// Short human-readable message for display next to a failed draft.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Input => "The text could not be analyzed.".to_string(),
            ErrorKind::TransientIo => {
                format!("Saving failed and will be retried ({}).", self)
            }
            ErrorKind::Configuration => format!("Please check your settings: {}", self),
            ErrorKind::Decoding => "Received data could not be read.".to_string(),
            ErrorKind::Cancelled => "The operation was cancelled.".to_string(),
            ErrorKind::Internal => format!("Unexpected error: {}", self),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Error::Server {
                status: status.as_u16(),
                message: e.to_string(),
            };
        }
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty text".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty text");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_server() {
        let err = Error::Server {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 503: unavailable");
    }

    #[test]
    fn test_error_display_timeout() {
        assert_eq!(Error::Timeout(1500).to_string(), "Timed out after 1500ms");
    }

    #[test]
    fn test_error_display_model_not_found() {
        let err = Error::ModelNotFound("llama9".to_string());
        assert_eq!(err.to_string(), "Model not found: llama9");
    }

    #[test]
    fn test_kind_transient() {
        assert_eq!(
            Error::Persistence("disk".into()).kind(),
            ErrorKind::TransientIo
        );
        assert_eq!(Error::Timeout(10).kind(), ErrorKind::TransientIo);
        assert_eq!(Error::Request("reset".into()).kind(), ErrorKind::TransientIo);
    }

    #[test]
    fn test_kind_configuration_not_retryable() {
        let err = Error::ModelNotFound("x".into());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.is_retryable());
        assert!(!Error::Config("bad url".into()).is_retryable());
    }

    #[test]
    fn test_transient_is_retryable() {
        assert!(Error::Persistence("locked".into()).is_retryable());
        assert!(Error::Server {
            status: 500,
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_cancelled_not_retryable() {
        let err = Error::Cancelled("queue cleared".into());
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_message_mentions_settings_for_config() {
        let msg = Error::Config("invalid URL".into()).user_message();
        assert!(msg.contains("settings"));
        assert!(msg.contains("invalid URL"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Decoding);
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
