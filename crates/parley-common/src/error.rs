//! Parley error types
//!
//! Centralized error handling for all Parley components

use std::fmt;

/// Main error type for Parley operations
#[derive(Debug)]
pub enum ParleyError {
    /// Generic error with message
    Generic(String),
    /// IO-related errors
    Io(std::io::Error),
    /// JSON serialization/deserialization errors
    Serde(serde_json::Error),
    /// Configuration errors
    Config(String),
    /// Transport-level failure talking to a remote endpoint
    Transport(String),
    /// Remote endpoint answered with a non-success status
    HttpStatus { endpoint: String, status: u16 },
    /// Failure while reading a streamed response body
    Stream(String),
    /// Translation endpoint reported or caused a failure
    Translation(String),
    /// A speech session could not be started
    SpeechStart(String),
    /// A speech session failed after it started
    Speech(String),
    /// Requested capability is not available on this platform
    Unsupported(String),
    /// Language tag was malformed or not offered by the selector
    Language(String),
}

impl fmt::Display for ParleyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParleyError::Generic(msg) => write!(f, "Parley error: {}", msg),
            ParleyError::Io(err) => write!(f, "IO error: {}", err),
            ParleyError::Serde(err) => write!(f, "Serialization error: {}", err),
            ParleyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ParleyError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ParleyError::HttpStatus { endpoint, status } => {
                write!(f, "HTTP error from {}: status {}", endpoint, status)
            }
            ParleyError::Stream(msg) => write!(f, "Stream error: {}", msg),
            ParleyError::Translation(msg) => write!(f, "Translation error: {}", msg),
            ParleyError::SpeechStart(msg) => write!(f, "Speech start error: {}", msg),
            ParleyError::Speech(msg) => write!(f, "Speech error: {}", msg),
            ParleyError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            ParleyError::Language(msg) => write!(f, "Language error: {}", msg),
        }
    }
}

impl std::error::Error for ParleyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParleyError::Io(err) => Some(err),
            ParleyError::Serde(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience result type for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        ParleyError::Io(err)
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        ParleyError::Serde(err)
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        ParleyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ParleyError {
    fn from(err: toml::ser::Error) -> Self {
        ParleyError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ParleyError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ParleyError::HttpStatus {
                endpoint: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                status: status.as_u16(),
            }
        } else if err.is_body() || err.is_decode() {
            ParleyError::Stream(err.to_string())
        } else {
            ParleyError::Transport(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ParleyError {
    fn from(err: anyhow::Error) -> Self {
        ParleyError::Generic(err.to_string())
    }
}

impl ParleyError {
    /// True for failures that belong to a speech capability rather than the chat pipeline
    pub fn is_speech(&self) -> bool {
        matches!(
            self,
            ParleyError::SpeechStart(_) | ParleyError::Speech(_) | ParleyError::Unsupported(_)
        )
    }
}
