//! Error types for the Chorus Router
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Collaborator (LLM provider) errors (3xx)
    LlmNotConfigured = 300,
    LlmQuotaExceeded = 301,
    LlmNetwork = 302,
    LlmMalformed = 303,
    LlmApi = 304,

    // Orchestration errors (4xx)
    InvalidInput = 400,
    AllPersonasFailed = 401,
    InvalidDecision = 402,

    // Server errors (5xx)
    ServerBind = 500,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Collaborator errors
            400..=499 => 40, // Orchestration errors
            500..=599 => 50, // Server errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the router
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON (de)serialization error outside the defensive parsing paths
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────

    /// No usable credential for the provider
    #[error("{provider} API key not configured: {message}")]
    NotConfigured { provider: String, message: String },

    /// Provider rejected the call for quota or rate reasons
    #[error("{provider} API quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },

    /// Transport failure (connect, timeout, TLS)
    #[error("Network error connecting to {provider}: {message}")]
    Network { provider: String, message: String },

    /// Empty or unparseable provider payload
    #[error("Malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },

    /// Any other non-success status from the provider
    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Orchestration Errors
    // ─────────────────────────────────────────────────────────────

    /// Conversation missing or empty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every persona failed during aggregation
    #[error("No persona could provide a reply ({attempted} attempted)")]
    AllPersonasFailed { attempted: usize },

    /// The routing decision call returned nothing usable
    #[error("Invalid routing decision: {0}")]
    InvalidDecision(String),

    // ─────────────────────────────────────────────────────────────
    // Server Errors
    // ─────────────────────────────────────────────────────────────

    /// Could not bind the HTTP listener
    #[error("Failed to bind {addr}: {source}")]
    ServerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::IoRead,

            Error::NotConfigured { .. } => ErrorCode::LlmNotConfigured,
            Error::QuotaExceeded { .. } => ErrorCode::LlmQuotaExceeded,
            Error::Network { .. } => ErrorCode::LlmNetwork,
            Error::Malformed { .. } => ErrorCode::LlmMalformed,
            Error::Api { .. } => ErrorCode::LlmApi,

            Error::InvalidInput(_) => ErrorCode::InvalidInput,
            Error::AllPersonasFailed { .. } => ErrorCode::AllPersonasFailed,
            Error::InvalidDecision(_) => ErrorCode::InvalidDecision,

            Error::ServerBind { .. } => ErrorCode::ServerBind,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is worth retrying against the provider
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::QuotaExceeded { .. } | Error::Network { .. } => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this error originates from the LLM collaborator
    pub fn is_collaborator(&self) -> bool {
        matches!(self.code() as u16, 300..=399)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'chorus-router config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'chorus-router config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::NotConfigured { .. } => Some(
                "Set 'api_key' under [llm] or export GEMINI_API_KEY / OPENAI_API_KEY."
            ),
            Error::QuotaExceeded { .. } => Some(
                "The provider is rate limiting this key. Wait a moment or raise the quota."
            ),
            Error::Network { .. } => Some(
                "Check your network connection and the [llm] base_url setting."
            ),

            Error::InvalidInput(_) => Some(
                "Provide a non-empty conversation history."
            ),

            Error::ServerBind { .. } => Some(
                "Another process may be using the port. Change [server] bind or pass --bind."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Error::ConfigValidation { field: Some(field), .. } = self {
            output.push_str(&format!("  Field: {}\n", field));
        }

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a malformed provider response error
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Malformed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a missing-credential error
    pub fn not_configured(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::NotConfigured {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status from a provider
    pub fn from_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = body.into();
        let quota_wording = message.to_lowercase().contains("quota");
        match status {
            429 => Error::QuotaExceeded { provider, message },
            401 => Error::NotConfigured { provider, message },
            403 if !quota_wording => Error::NotConfigured { provider, message },
            _ if quota_wording => Error::QuotaExceeded { provider, message },
            _ => Error::Api {
                provider,
                status,
                message,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
