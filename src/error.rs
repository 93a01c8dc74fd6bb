//! Crate-wide error type
//!
//! Every fallible call returns [`Result`]. Callers that only need to know
//! which layer failed use [`Error::category`].

use thiserror::Error;

/// Every failure the crate can report
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration
    // ============================================================================
    #[error("Missing required setting: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid setting '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Credentials
    // ============================================================================
    #[error("Not authorized: {message}")]
    Auth { message: String },

    #[error("Token request failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // Transport
    // ============================================================================
    #[error("Transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("No response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ============================================================================
    // Pages and feeds
    // ============================================================================
    #[error("Malformed page: {message}")]
    Decode { message: String },

    #[error("Server repeated continuation cursor '{cursor}' at offset {offset}")]
    RepeatedCursor { cursor: String, offset: u64 },

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not write output: {message}")]
    Output { message: String },

    // ============================================================================
    // Run control
    // ============================================================================
    #[error("Pagination run cancelled")]
    Cancelled,

    #[error("Dispatch unit did not complete: {message}")]
    Worker { message: String },

    // ============================================================================
    // Local files
    // ============================================================================
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("No such file: {path}")]
    FileNotFound { path: String },
}

/// Which layer an [`Error`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials missing, refused or unusable
    Auth,
    /// Network failure, timeout or non-2xx status
    Transport,
    /// Page payload that cannot be trusted
    Decode,
    /// Missing or invalid settings
    Config,
    /// The caller cancelled the run
    Cancelled,
    /// Local file system failure
    Io,
    /// Anything else
    Other,
}

impl Error {
    /// Create a missing setting error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid setting error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a dispatch unit error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// 401 and 403 count as credential failures; every other status is
    /// transport.
    pub fn category(&self) -> ErrorCategory {
        use ErrorCategory as C;
        match self {
            Self::Auth { .. } | Self::TokenRefresh { .. } => C::Auth,
            Self::HttpStatus { status: 401 | 403, .. } => C::Auth,
            Self::Http(_) | Self::HttpStatus { .. } | Self::Timeout { .. } => C::Transport,
            Self::Decode { .. } | Self::RepeatedCursor { .. } | Self::JsonParse(_) => C::Decode,
            Self::MissingConfigField { .. }
            | Self::InvalidConfigValue { .. }
            | Self::YamlParse(_) => C::Config,
            Self::Cancelled => C::Cancelled,
            Self::Io(_) | Self::FileNotFound { .. } => C::Io,
            Self::Csv(_) | Self::Output { .. } | Self::Worker { .. } => C::Other,
        }
    }

    /// Check if this error came from the network or HTTP layer
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Check if this error came from a malformed page
    pub fn is_decode(&self) -> bool {
        self.category() == ErrorCategory::Decode
    }
}

/// Result type alias for Catalog Harvest
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::missing_field("catalog.label").to_string(),
            "Missing required setting: catalog.label"
        );
        assert_eq!(Error::http_status(404, "gone").to_string(), "HTTP 404: gone");
        assert_eq!(
            Error::RepeatedCursor {
                cursor: "next".to_string(),
                offset: 200,
            }
            .to_string(),
            "Server repeated continuation cursor 'next' at offset 200"
        );
    }

    #[test_case(Error::http_status(500, ""), ErrorCategory::Transport ; "server error")]
    #[test_case(Error::http_status(404, ""), ErrorCategory::Transport ; "not found")]
    #[test_case(Error::http_status(401, ""), ErrorCategory::Auth ; "unauthorized")]
    #[test_case(Error::http_status(403, ""), ErrorCategory::Auth ; "forbidden")]
    #[test_case(Error::Timeout { timeout_ms: 10 }, ErrorCategory::Transport ; "timeout")]
    #[test_case(Error::decode("bad"), ErrorCategory::Decode ; "decode")]
    #[test_case(Error::auth("nope"), ErrorCategory::Auth ; "auth")]
    #[test_case(Error::missing_field("x"), ErrorCategory::Config ; "missing field")]
    #[test_case(Error::Cancelled, ErrorCategory::Cancelled ; "cancelled")]
    #[test_case(Error::worker("panicked"), ErrorCategory::Other ; "worker")]
    fn test_category(err: Error, expected: ErrorCategory) {
        assert_eq!(err.category(), expected);
    }

    #[test]
    fn test_repeated_cursor_is_decode() {
        let err = Error::RepeatedCursor {
            cursor: String::new(),
            offset: 0,
        };
        assert!(err.is_decode());
        assert!(!err.is_transport());
    }
}
