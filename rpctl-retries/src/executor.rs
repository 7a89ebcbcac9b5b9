//! Retry executor for running operations with retries.

use crate::config::RetryPolicy;
use crate::error::{RpctlError, RpctlResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// State of a retry run.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Current attempt number (1-indexed).
    pub attempt: u32,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
    /// History of attempts.
    pub history: Vec<AttemptInfo>,
}

/// Information about a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Attempt number.
    pub attempt: u32,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Time waited after this attempt before the next one.
    pub wait_time: Duration,
}

enum Decision {
    Propagate,
    Exhausted,
    Wait(Duration),
}

fn decide(policy: &RetryPolicy, error: &RpctlError, attempt: u32) -> Decision {
    let last = attempt >= policy.attempts();
    match error {
        _ if error.is_terminal() => Decision::Propagate,
        RpctlError::Api { .. } if !error.is_transient() || last => Decision::Propagate,
        RpctlError::Api { .. } => Decision::Wait(policy.delay_for(attempt, error.retry_after())),
        RpctlError::Transport { .. } if last => Decision::Exhausted,
        RpctlError::Transport { .. } => Decision::Wait(policy.delay_for(attempt, None)),
        _ => Decision::Propagate,
    }
}

/// Execute an operation with retries.
///
/// `operation` performs one attempt. Authentication and not-found errors
/// are returned at once; transient API errors and transport failures are
/// retried with backoff until `policy.max_attempts` is reached. A
/// transport failure on the last attempt comes back as an API error
/// naming the attempt count.
///
/// # Example
///
/// ```ignore
/// use rpctl_retries::{with_retry, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// let pods = with_retry(&policy, || client.list_pods_once()).await?;
/// ```
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> RpctlResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpctlResult<T>>,
{
    with_retry_state(policy, operation).await.0
}

/// Execute with retries and get state information.
pub async fn with_retry_state<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> (RpctlResult<T>, RetryState)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpctlResult<T>>,
{
    let mut state = RetryState::default();
    let max_attempts = policy.attempts();

    loop {
        state.attempt += 1;
        let attempt = state.attempt;

        debug!(attempt, max_attempts, "Executing attempt");

        let error = match operation().await {
            Ok(result) => {
                state.history.push(AttemptInfo {
                    attempt,
                    success: true,
                    error: None,
                    wait_time: Duration::ZERO,
                });
                return (Ok(result), state);
            }
            Err(error) => error,
        };

        let wait = match decide(policy, &error, attempt) {
            Decision::Wait(wait) => wait,
            Decision::Propagate => {
                state.history.push(AttemptInfo {
                    attempt,
                    success: false,
                    error: Some(error.to_string()),
                    wait_time: Duration::ZERO,
                });
                return (Err(error), state);
            }
            Decision::Exhausted => {
                state.history.push(AttemptInfo {
                    attempt,
                    success: false,
                    error: Some(error.to_string()),
                    wait_time: Duration::ZERO,
                });
                warn!(attempt, error = %error, "Connection retries exhausted");
                let wrapped =
                    RpctlError::api(format!("Connection failed after {max_attempts} attempts: {error}"));
                return (Err(wrapped), state);
            }
        };

        warn!(
            attempt,
            max_attempts,
            delay_ms = wait.as_millis() as u64,
            error = %error,
            "Transient error, retrying"
        );

        state.total_wait_time += wait;
        state.history.push(AttemptInfo {
            attempt,
            success: false,
            error: Some(error.to_string()),
            wait_time: wait,
        });

        sleep(wait).await;
    }
}
