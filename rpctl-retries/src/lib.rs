//! # rpctl-retries
//!
//! Resilient access to the RunPod API: the error taxonomy that decides
//! what is worth retrying, exponential backoff with jitter, and the
//! retry executor every API call goes through.
//!
//! ## Core Concepts
//!
//! - **[`RpctlError`]**: The closed set of failures, each with an exit code
//!   and a transience verdict
//! - **[`RetryPolicy`]**: Attempt count, base delay and delay cap
//! - **[`backoff_delay`]**: Pure delay calculation, honoring `Retry-After`
//! - **[`with_retry`]**: Execute an operation with automatic retries
//! - **[`check_response`]**: Classify HTTP responses into the taxonomy
//!
//! ## Retry Rules
//!
//! - Authentication and not-found errors are returned at once
//! - API errors with status 408, 429, 500, 502, 503 or 504 are retried
//! - Connect, timeout and I/O failures are retried, then reported as an
//!   API error naming the attempt count
//! - Everything else is returned on first occurrence
//!
//! ## Example
//!
//! ```ignore
//! use rpctl_retries::{check_response, with_retry, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let response = with_retry(&policy, || async {
//!     let response = client.get(url).send().await?;
//!     check_response(response).await
//! })
//! .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backoff;
pub mod config;
pub mod error;
pub mod executor;
pub mod transport;

// Re-exports
pub use backoff::{backoff_delay, calculate_delay, JITTER_RATIO};
pub use config::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
pub use error::{RpctlError, RpctlResult, TransportKind, TRANSIENT_STATUS_CODES};
pub use executor::{with_retry, with_retry_state, AttemptInfo, RetryState};
pub use transport::{check_response, classify_status, parse_retry_after, retry_after_header};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{with_retry, RetryPolicy, RpctlError, RpctlResult};
}
