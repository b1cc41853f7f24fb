//! Error types for the PrepMaster orchestrator.
//!
//! This module defines the error hierarchy for all orchestrator operations,
//! including configuration loading, question generation, answer evaluation,
//! and state machine preconditions.

use std::path::PathBuf;

/// A specialized `Result` type for PrepMaster orchestrator operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Errors that can occur while running an interview session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your prepmaster.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Remote Service Errors
    // ========================================================================
    /// The question set could not be produced.
    ///
    /// Fatal to the attempt to start a session: no partial session is created.
    #[error("Failed to generate questions ({kind}): {message}\n\nSuggestion: {suggestion}")]
    GenerationFailure {
        /// What went wrong with the content service.
        kind: ServiceErrorKind,
        /// Detailed error message.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// A submitted answer could not be scored.
    ///
    /// Recoverable: the session stays on the same question.
    #[error("Failed to evaluate answer ({kind}): {message}\n\nSuggestion: {suggestion}")]
    EvaluationFailure {
        /// What went wrong with the evaluation service.
        kind: ServiceErrorKind,
        /// Detailed error message.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// The caller violated a precondition (for example, an empty answer).
    #[error("Invalid input: {message}")]
    ValidationFailure {
        /// Description of the violated precondition.
        message: String,
    },

    /// A transition was requested from a state that does not allow it.
    #[error("Invalid state transition: cannot {action} while {from}")]
    InvalidStateTransition {
        /// The current status.
        from: String,
        /// The attempted action.
        action: String,
    },

    /// The session was restarted while a remote call was in flight.
    #[error("Session was restarted while a request was in flight; the result was discarded")]
    SessionDiscarded,

    /// Results were requested before the session completed.
    #[error("Results are not available while {status}\n\nSuggestion: Finish every question before requesting results")]
    ResultsNotReady {
        /// The current status.
        status: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of remote service failures for structured error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Authentication failure (missing or invalid API key).
    Authentication,
    /// Rate limit exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Network connectivity issues.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The service answered without any content.
    EmptyResponse,
    /// The content could not be parsed into the expected shape.
    InvalidResponse,
    /// Other unclassified errors.
    Other,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::EmptyResponse => write!(f, "empty_response"),
            Self::InvalidResponse => write!(f, "invalid_response"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl ServiceErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check the API key environment variable named in prepmaster.json",
            Self::RateLimit => "Wait a moment and try again",
            Self::Server => "Try again later; the content service may be experiencing issues",
            Self::Network => "Check your network connection",
            Self::Timeout => "Try again, or raise generator.requestTimeoutSecs",
            Self::EmptyResponse | Self::InvalidResponse => {
                "Try again; the service returned unusable content"
            }
            Self::Other => "Check the content service's status page",
        }
    }
}

impl PrepError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `GenerationFailure` with automatic suggestion based on error kind.
    #[must_use]
    pub fn generation(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            kind,
            message: message.into(),
            suggestion: kind.suggestion().to_string(),
        }
    }

    /// Creates a new `EvaluationFailure` with automatic suggestion based on error kind.
    #[must_use]
    pub fn evaluation(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self::EvaluationFailure {
            kind,
            message: message.into(),
            suggestion: kind.suggestion().to_string(),
        }
    }

    /// Creates a new `ValidationFailure`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, action: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            action: action.into(),
        }
    }

    /// Creates a new `ResultsNotReady` error.
    #[must_use]
    pub fn results_not_ready(status: impl std::fmt::Display) -> Self {
        Self::ResultsNotReady {
            status: status.to_string(),
        }
    }

    /// Returns the service error kind for remote failures.
    #[must_use]
    pub const fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            Self::GenerationFailure { kind, .. } | Self::EvaluationFailure { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    /// Returns `true` if the question set could not be produced.
    #[must_use]
    pub const fn is_generation_failure(&self) -> bool {
        matches!(self, Self::GenerationFailure { .. })
    }

    /// Returns `true` if an answer could not be scored.
    #[must_use]
    pub const fn is_evaluation_failure(&self) -> bool {
        matches!(self, Self::EvaluationFailure { .. })
    }

    /// Returns `true` if the caller violated a precondition.
    ///
    /// Validation errors are raised before any remote call and never change
    /// the session status.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailure { .. }
                | Self::InvalidStateTransition { .. }
                | Self::ResultsNotReady { .. }
        )
    }

    /// Returns `true` if this error is transient and a user-initiated retry may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailure {
                kind: ServiceErrorKind::RateLimit
                    | ServiceErrorKind::Server
                    | ServiceErrorKind::Network
                    | ServiceErrorKind::Timeout
                    | ServiceErrorKind::EmptyResponse
                    | ServiceErrorKind::InvalidResponse,
                ..
            } | Self::EvaluationFailure {
                kind: ServiceErrorKind::RateLimit
                    | ServiceErrorKind::Server
                    | ServiceErrorKind::Network
                    | ServiceErrorKind::Timeout
                    | ServiceErrorKind::EmptyResponse
                    | ServiceErrorKind::InvalidResponse,
                ..
            }
        )
    }
}
