//! Error types and handling for the travel assistant
//!
//! Only [`OrchestrationError`] ever crosses the orchestrator boundary. The
//! other families are absorbed where they occur and degrade the response.

use thiserror::Error;

/// Application-level error used while wiring the assistant together
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AssistantError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            AssistantError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            AssistantError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            AssistantError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

/// Failures talking to the language model
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("LLM endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),
}

/// The structured extraction step could not produce a query
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("language model unreachable: {0}")]
    Unreachable(#[from] LlmError),

    #[error("model output does not match the query schema: {0}")]
    Unparsable(String),

    #[error("language model returned an empty reply")]
    EmptyReply,

    #[error("tool calling did not finish within {0} rounds")]
    ToolRoundsExceeded(usize),
}

/// A geocoding lookup produced no usable coordinate or name
#[derive(Error, Debug, Clone)]
pub enum GeocodeFailure {
    #[error("no match for '{0}'")]
    NoMatch(String),

    #[error("geocoding provider error: {0}")]
    Provider(String),

    #[error("lookup cancelled by a newer request on the same session")]
    Cancelled,
}

/// A single weather tier failed; never escapes the weather resolver
#[derive(Error, Debug, Clone)]
pub enum WeatherFailure {
    #[error("weather provider request failed: {0}")]
    Network(String),

    #[error("weather provider returned status {0}")]
    Status(u16),

    #[error("weather payload could not be decoded: {0}")]
    Decode(String),

    #[error("weather provider timed out after {0} seconds")]
    Timeout(u64),

    #[error("weather provider not configured: {0}")]
    NotConfigured(String),
}

/// The device location could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("no location fix within {0} seconds")]
    Timeout(u64),

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request superseded by a newer request")]
    Superseded,
}

/// A declared tool could not be invoked
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },
}

/// The only error surfaced by the orchestrator
#[derive(Error, Debug, Clone)]
pub enum OrchestrationError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),
}

impl OrchestrationError {
    /// Message shown to the user when a query fails
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("Query failed: {self}")
    }
}
