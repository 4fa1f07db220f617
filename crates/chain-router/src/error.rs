//! Error types for routing and dispatch
//!
//! Two families of errors exist:
//!
//! - [`PatternError`] is raised while routes are being registered. It always
//!   signals a programming mistake in a route specification.
//! - [`RouteError`] is produced by handlers (or by the dispatch engine on
//!   their behalf) while a request is being processed. It becomes the
//!   request's pending error and steers dispatch towards error routes.
//!
//! # Example
//! ```rust,ignore
//! use chain_router::{ErrorCode, RouteError};
//!
//! let error = RouteError::new(ErrorCode::NotFound, "User not found");
//! let error = RouteError::not_found("User not found"); // Convenience method
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Categorized error codes for failures raised during dispatch.
///
/// When serialized to JSON, codes are converted to SCREAMING_SNAKE_CASE
/// (e.g., `NotFound` becomes `"NOT_FOUND"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Client errors (4xx equivalent)
    /// The request was malformed or invalid
    BadRequest,
    /// Authentication is required
    Unauthorized,
    /// The authenticated caller lacks permission
    Forbidden,
    /// The requested resource was not found
    NotFound,
    /// The resource exists but not for this method
    MethodNotAllowed,
    /// The request conflicts with current state
    Conflict,

    // Server errors (5xx equivalent)
    /// An unexpected internal error occurred
    InternalError,
    /// A handler panicked and the panic was recovered
    HandlerPanic,
    /// Handler output could not be written to the response sink
    ResponseWrite,
    /// JSON serialization/deserialization failed
    SerializationError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::HandlerPanic => "HANDLER_PANIC",
            Self::ResponseWrite => "RESPONSE_WRITE",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }

    /// Returns the HTTP status code conventionally associated with this code.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest | Self::SerializationError => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Conflict => 409,
            Self::InternalError | Self::HandlerPanic | Self::ResponseWrite => 500,
        }
    }

    /// Returns true if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if this is a server error (5xx equivalent).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure raised by a handler while a request is dispatched.
///
/// Returning a `RouteError` from a handler (or panicking, when panic recovery
/// is enabled) stores it as the request's pending error. From then on only
/// error routes run.
///
/// # Example
/// ```rust,ignore
/// let error = RouteError::forbidden("admin only")
///     .with_details(serde_json::json!({ "role": "guest" }))
///     .with_cause("session lookup returned a guest session");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RouteError {
    /// Categorized error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (JSON value)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional cause for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl RouteError {
    /// Create a new error with code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Strip internal information from server errors before they reach a client.
    pub fn sanitize(mut self) -> Self {
        if self.code.is_server_error() {
            debug!(
                original_code = %self.code,
                original_message = %self.message,
                "Sanitizing server error for client response"
            );
            self.message = "An internal error occurred".to_string();
            self.details = None;
            self.cause = None;
        }
        self
    }

    // Convenience constructors

    /// Create a BAD_REQUEST error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an UNAUTHORIZED error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a FORBIDDEN error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a METHOD_NOT_ALLOWED error.
    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotAllowed, format!("Method '{method}' not allowed"))
    }

    /// Create a CONFLICT error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create an INTERNAL_ERROR error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a SERIALIZATION_ERROR error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Create a HANDLER_PANIC error from a recovered panic payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(ErrorCode::HandlerPanic, "Handler panicked").with_cause(detail)
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for RouteError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::ResponseWrite, "Failed to write response").with_cause(err.to_string())
    }
}

/// Result type for handlers and response sinks.
pub type RouteResult<T> = Result<T, RouteError>;

/// Registration-time failure of a route specification.
///
/// These errors are raised by the `try_*` registration methods. The plain
/// registration methods panic with the same message.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The leading method list is malformed (e.g. `"GET, /x"`).
    #[error("invalid method list `{methods}` in route specification `{spec}`")]
    InvalidMethods {
        /// Full route specification
        spec: String,
        /// The offending method list
        methods: String,
    },

    /// A `<` opens a parameter token that is never closed.
    #[error("unterminated parameter token at byte {position} in pattern `{pattern}`")]
    UnterminatedToken {
        /// Path pattern
        pattern: String,
        /// Byte offset of the opening `<`
        position: usize,
    },

    /// A parameter name is empty or is not an identifier.
    #[error("invalid parameter name `{name}` in pattern `{pattern}`")]
    InvalidParamName {
        /// Path pattern
        pattern: String,
        /// The offending name
        name: String,
    },

    /// A parameter token has a `:` followed by nothing.
    #[error("empty regular expression for parameter `{name}` in pattern `{pattern}`")]
    EmptyParamRegex {
        /// Path pattern
        pattern: String,
        /// Parameter name
        name: String,
    },

    /// The same parameter name appears twice in one pattern.
    #[error("duplicate parameter `{name}` in pattern `{pattern}`")]
    DuplicateParam {
        /// Path pattern
        pattern: String,
        /// Parameter name
        name: String,
    },

    /// The generated expression failed to compile.
    #[error("invalid regular expression in pattern `{pattern}`: {source}")]
    InvalidRegex {
        /// Path pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}
