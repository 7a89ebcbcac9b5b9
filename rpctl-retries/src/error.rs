//! Error taxonomy.
//!
//! Every failure that leaves the API layer is one [`RpctlError`]. The
//! variant decides both the process exit code and whether the retry
//! engine may re-attempt the call.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// HTTP status codes worth retrying unchanged.
pub const TRANSIENT_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Generic failure exit code.
pub const EXIT_GENERIC: i32 = 1;
/// Missing or rejected API key.
pub const EXIT_AUTHENTICATION: i32 = 2;
/// Config file missing or malformed.
pub const EXIT_CONFIG: i32 = 3;
/// Remote API error.
pub const EXIT_API: i32 = 4;
/// Requested resource does not exist.
pub const EXIT_NOT_FOUND: i32 = 5;
/// Preset missing or malformed.
pub const EXIT_PRESET: i32 = 6;
/// Input rejected before any call was made.
pub const EXIT_VALIDATION: i32 = 7;

/// Kind of transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Could not establish a connection.
    Connect,
    /// The request timed out.
    Timeout,
    /// Any other I/O failure while sending or receiving.
    Io,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "Connection"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Errors produced by rpctl.
#[derive(Debug, Clone, Error)]
pub enum RpctlError {
    /// API key missing or invalid. Never retried.
    #[error("{message}")]
    Authentication {
        /// Human-readable description.
        message: String,
    },

    /// Pod, endpoint, volume or other resource not found. Never retried.
    #[error("{message}")]
    ResourceNotFound {
        /// Human-readable description.
        message: String,
    },

    /// Input validation failed before an API call was made.
    #[error("{message}")]
    Validation {
        /// Human-readable description.
        message: String,
    },

    /// The remote API returned an error.
    #[error("{message}")]
    Api {
        /// Human-readable description.
        message: String,
        /// HTTP status, when one was observed.
        status_code: Option<u16>,
        /// Raw response body, when one was read.
        body: Option<String>,
        /// Server-supplied wait hint from `Retry-After`.
        retry_after: Option<Duration>,
    },

    /// Configuration file missing or malformed.
    #[error("{message}")]
    Config {
        /// Human-readable description.
        message: String,
    },

    /// Preset not found or malformed.
    #[error("{message}")]
    Preset {
        /// Human-readable description.
        message: String,
    },

    /// Connect, timeout or I/O failure below HTTP. Always transient.
    #[error("{kind} error: {message}")]
    Transport {
        /// What went wrong.
        kind: TransportKind,
        /// Underlying error text.
        message: String,
    },

    /// A poll loop reached its deadline.
    #[error(
        "Timed out after {}s waiting for {label}. Last status: {last_status}",
        timeout.as_secs_f64()
    )]
    PollTimeout {
        /// What was being waited on.
        label: String,
        /// The configured timeout.
        timeout: Duration,
        /// Last status string observed.
        last_status: String,
    },

    /// A batch was aborted on its first failure.
    #[error("Stopped on error processing {item}: {source}")]
    BatchStopped {
        /// The item whose operation failed.
        item: String,
        /// The failure that stopped the batch.
        source: Box<RpctlError>,
    },

    /// Some items of a batch failed and the caller did not tolerate it.
    #[error("{failed} of {total} operations failed")]
    PartialFailure {
        /// Number of failed items.
        failed: usize,
        /// Number of items processed.
        total: usize,
        /// Exit code to report.
        exit_code: i32,
    },
}

impl RpctlError {
    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a preset error.
    pub fn preset(message: impl Into<String>) -> Self {
        Self::Preset {
            message: message.into(),
        }
    }

    /// Create an API error without a status code.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
            body: None,
            retry_after: None,
        }
    }

    /// Create an API error carrying an HTTP status.
    pub fn api_status(message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status),
            body: None,
            retry_after: None,
        }
    }

    /// Create a transport error.
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Attach a `Retry-After` hint. No-op for non-API errors.
    #[must_use]
    pub fn with_retry_after(mut self, hint: Option<Duration>) -> Self {
        if let Self::Api { retry_after, .. } = &mut self {
            *retry_after = hint;
        }
        self
    }

    /// Attach a response body. No-op for non-API errors.
    #[must_use]
    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        if let Self::Api { body, .. } = &mut self {
            *body = Some(text.into());
        }
        self
    }

    /// Replace the message of a not-found error, leaving others untouched.
    ///
    /// Used to name the resource the caller asked for.
    #[must_use]
    pub fn or_not_found(self, message: impl Into<String>) -> Self {
        match self {
            Self::ResourceNotFound { .. } => Self::not_found(message),
            other => other,
        }
    }

    /// Classify an HTTP error status.
    ///
    /// 401 is an authentication failure, 404 a missing resource, and
    /// everything else an API error that is transient only for
    /// [`TRANSIENT_STATUS_CODES`].
    pub fn from_status(status: u16, body: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let body = body.into();
        match status {
            401 => Self::authentication("Invalid API key."),
            404 => {
                let detail = body.trim();
                if detail.is_empty() {
                    Self::not_found("Resource not found.")
                } else {
                    Self::not_found(format!("Resource not found: {detail}"))
                }
            }
            429 => Self::api_status("Rate limited by RunPod API", 429)
                .with_body(body)
                .with_retry_after(retry_after),
            _ => Self::api_status(format!("RunPod API request failed with status {status}"), status)
                .with_body(body),
        }
    }

    /// Classify a free-text failure from an opaque dependency.
    ///
    /// Best-effort fallback for errors that carry no structured status:
    /// an embedded `4xx`/`5xx` code becomes the status, and "401" /
    /// "unauthorized" or "404" / "not found" select the terminal kinds.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if message.contains("401") || lower.contains("unauthorized") {
            return Self::authentication("Invalid API key.");
        }
        if message.contains("404") || lower.contains("not found") {
            return Self::not_found(message);
        }

        Self::Api {
            status_code: extract_status_code(&message),
            message: format!("RunPod API error: {message}"),
            body: None,
            retry_after: None,
        }
    }

    /// Build a non-transient API error from GraphQL `errors` messages.
    pub fn from_graphql_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = messages
            .into_iter()
            .map(|m| m.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::api(format!("GraphQL error: {joined}"))
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Authentication { .. } => EXIT_AUTHENTICATION,
            Self::Config { .. } => EXIT_CONFIG,
            Self::Api { .. } => EXIT_API,
            Self::ResourceNotFound { .. } => EXIT_NOT_FOUND,
            Self::Preset { .. } => EXIT_PRESET,
            Self::Validation { .. } => EXIT_VALIDATION,
            Self::PartialFailure { exit_code, .. } => *exit_code,
            Self::Transport { .. } | Self::PollTimeout { .. } | Self::BatchStopped { .. } => {
                EXIT_GENERIC
            }
        }
    }

    /// Whether retrying the same call unchanged may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status_code, .. } => {
                status_code.is_some_and(|s| TRANSIENT_STATUS_CODES.contains(&s))
            }
            Self::Transport { .. } => true,
            _ => false,
        }
    }

    /// Whether this error must never be retried, regardless of attempts left.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::ResourceNotFound { .. }
        )
    }

    /// Server-supplied wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status, if this is an API error that carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RpctlError {
    fn from(err: serde_json::Error) -> Self {
        Self::api(format!("Invalid response from RunPod API: {err}"))
    }
}

/// Result type for rpctl operations.
pub type RpctlResult<T> = Result<T, RpctlError>;

fn extract_status_code(message: &str) -> Option<u16> {
    static STATUS_RE: OnceLock<Regex> = OnceLock::new();
    let re = STATUS_RE.get_or_init(|| {
        Regex::new(r"\b(4\d{2}|5\d{2})\b").expect("status code pattern is valid")
    });
    re.find(message).and_then(|m| m.as_str().parse().ok())
}
