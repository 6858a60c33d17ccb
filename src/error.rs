//! Error types for regchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for regchat operations
///
/// This enum encompasses all possible errors that can occur while driving
/// a chat session: configuration loading, the completion API, SSE stream
/// decoding, and conversation storage.
#[derive(Error, Debug)]
pub enum RegchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion API errors (non-2xx responses, invalid payloads)
    #[error("API error: {0}")]
    Api(String),

    /// SSE stream decoding errors
    #[error("Stream error: {0}")]
    Stream(String),

    /// A send is already in flight for this session
    #[error("A message is already being sent; wait for the current stream to finish")]
    SendInFlight,

    /// Missing API credential for the completion endpoint
    #[error("Missing API credential: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Conversation storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for regchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = RegchatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_api_error_display() {
        let error = RegchatError::Api("rate limit exceeded".to_string());
        assert_eq!(error.to_string(), "API error: rate limit exceeded");
    }

    #[test]
    fn test_stream_error_display() {
        let error = RegchatError::Stream("pending line too long".to_string());
        assert_eq!(error.to_string(), "Stream error: pending line too long");
    }

    #[test]
    fn test_send_in_flight_display() {
        let error = RegchatError::SendInFlight;
        assert!(error.to_string().contains("already being sent"));
    }

    #[test]
    fn test_missing_credentials_display() {
        let error = RegchatError::MissingCredentials("REGCHAT_API_KEY".to_string());
        assert_eq!(error.to_string(), "Missing API credential: REGCHAT_API_KEY");
    }

    #[test]
    fn test_storage_error_display() {
        let error = RegchatError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: RegchatError = io_error.into();
        assert!(matches!(error, RegchatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: RegchatError = json_error.into();
        assert!(matches!(error, RegchatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: RegchatError = yaml_error.into();
        assert!(matches!(error, RegchatError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegchatError>();
    }
}
