use thiserror::Error;

#[derive(Error, Debug)]
pub enum VmqError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout error after {0}ms")]
    Timeout(u64),

    #[error("Connection is unusable; close the session and reconnect")]
    ConnectionUnusable,

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VmqError {
    /// Returns `true` when the session that produced this error can no longer
    /// be used and must be closed and reconnected.
    ///
    /// Server, validation and codec errors leave the connection in sync: the
    /// full response was drained before the error surfaced.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            VmqError::Authentication(_)
                | VmqError::Connection(_)
                | VmqError::Timeout(_)
                | VmqError::ConnectionUnusable
                | VmqError::Protocol(_)
                | VmqError::Io(_)
        )
    }
}

impl From<rmp_serde::encode::Error> for VmqError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        VmqError::Encode(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for VmqError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        VmqError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VmqError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_authentication_error_is_fatal() {
        let error = VmqError::Authentication("malformed session id".to_string());
        assert!(error.is_connection_fatal());
        assert_eq!(
            format!("{}", error),
            "Authentication failed: malformed session id"
        );
    }

    #[test]
    fn test_timeout_error_display() {
        let error = VmqError::Timeout(5000);
        assert!(error.is_connection_fatal());
        assert_eq!(format!("{}", error), "Timeout error after 5000ms");
    }

    #[test]
    fn test_io_error_is_fatal() {
        let error: VmqError = IoError::new(ErrorKind::UnexpectedEof, "early eof").into();
        assert!(error.is_connection_fatal());
        assert!(matches!(error, VmqError::Io(_)));
        assert!(format!("{}", error).contains("early eof"));
    }

    #[test]
    fn test_server_error_keeps_connection() {
        let error = VmqError::Server {
            message: "queue not found".to_string(),
        };
        assert!(!error.is_connection_fatal());
        assert_eq!(format!("{}", error), "Server error: queue not found");
    }

    #[test]
    fn test_codec_errors_keep_connection() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let error: VmqError = json_error.into();
        assert!(matches!(error, VmqError::Json(_)));
        assert!(!error.is_connection_fatal());

        assert!(!VmqError::Decode("shape mismatch".to_string()).is_connection_fatal());
        assert!(!VmqError::Encode("unsupported".to_string()).is_connection_fatal());
        assert!(!VmqError::Validation("too long".to_string()).is_connection_fatal());
    }

    #[test]
    fn test_msgpack_decode_error_conversion() {
        let err = rmp_serde::from_slice::<String>(&[0xc1]).unwrap_err();
        let error: VmqError = err.into();
        assert!(matches!(error, VmqError::Decode(_)));
    }

    #[test]
    fn test_unusable_connection_display() {
        let error = VmqError::ConnectionUnusable;
        assert!(error.is_connection_fatal());
        assert!(format!("{}", error).contains("reconnect"));
    }

    #[test]
    fn test_empty_error_messages() {
        assert_eq!(
            format!("{}", VmqError::Connection("".to_string())),
            "Connection error: "
        );
        assert_eq!(
            format!("{}", VmqError::Server { message: "".to_string() }),
            "Server error: "
        );
    }
}
