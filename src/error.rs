use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the SNOTEL tools.
///
/// Every variant is reported back to the caller as a structured failure;
/// none of them terminate the server.
#[derive(Debug, Error)]
pub enum SnotelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network request to '{path}' failed")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("AWDB API returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse AWDB response from '{path}'")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SnotelError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable machine-readable name of the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Network { .. } => "network",
            Self::Http { .. } => "http",
            Self::Parse { .. } => "parse",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Message including the underlying cause, if any
    pub fn detailed_message(&self) -> String {
        match std::error::Error::source(self) {
            Some(source) => format!("{}: {}", self, source),
            None => self.to_string(),
        }
    }

    pub fn to_failure(&self) -> ToolFailure {
        ToolFailure {
            kind: self.kind(),
            message: self.detailed_message(),
        }
    }
}

/// Structured body attached to failed tool calls
#[derive(Debug, Clone, Serialize)]
pub struct ToolFailure {
    pub kind: &'static str,
    pub message: String,
}
