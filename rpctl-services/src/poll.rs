//! Poll a check until it reports done or a deadline passes.

use rpctl_retries::{RpctlError, RpctlResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;

/// Default time to wait before giving up.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Default time between checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Callback receiving `(label, status)` whenever the status changes.
pub type ProgressFn = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// What a single check observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState<T> {
    /// The condition holds.
    Ready {
        /// Status text shown to the user.
        status: String,
        /// Value handed back to the caller.
        value: T,
    },
    /// Not there yet.
    Pending {
        /// Status text shown to the user.
        status: String,
    },
}

impl<T> PollState<T> {
    /// The condition holds.
    pub fn ready(status: impl Into<String>, value: T) -> Self {
        Self::Ready {
            status: status.into(),
            value,
        }
    }

    /// Not there yet.
    pub fn pending(status: impl Into<String>) -> Self {
        Self::Pending {
            status: status.into(),
        }
    }

    /// Status text of this observation.
    pub fn status(&self) -> &str {
        match self {
            Self::Ready { status, .. } | Self::Pending { status } => status,
        }
    }
}

/// Timing and reporting for [`poll_until`].
#[derive(Clone)]
pub struct PollOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// Wait this long between checks.
    pub interval: Duration,
    /// Name of the thing being waited on, used in messages.
    pub label: String,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("label", &self.label)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
            label: "resource".to_string(),
            progress: None,
        }
    }
}

impl PollOptions {
    /// Options with a label and default timing.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the interval between checks.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Report status changes through `progress` instead of the log.
    #[must_use]
    pub fn on_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    fn report(&self, status: &str) {
        match &self.progress {
            Some(progress) => progress(&self.label, status),
            None => info!(label = %self.label, status, "Status changed"),
        }
    }
}

/// Call `check` until it returns [`PollState::Ready`].
///
/// The first check runs immediately. After a pending check the helper
/// sleeps for `interval`, or for whatever is left before the deadline
/// if that is shorter, so the last check always lands at or after the
/// deadline. A pending check at or past the deadline fails with
/// [`RpctlError::PollTimeout`] carrying the last status. Errors from
/// `check` end the poll at once.
pub async fn poll_until<T, F, Fut>(options: &PollOptions, mut check: F) -> RpctlResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpctlResult<PollState<T>>>,
{
    // A timeout past the clock's range never expires.
    let deadline = Instant::now().checked_add(options.timeout);
    let mut last_status = String::new();

    loop {
        let state = check().await?;

        if state.status() != last_status {
            options.report(state.status());
            last_status = state.status().to_string();
        }

        if let PollState::Ready { value, .. } = state {
            return Ok(value);
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(RpctlError::PollTimeout {
                        label: options.label.clone(),
                        timeout: options.timeout,
                        last_status,
                    });
                }
                options.interval.min(deadline - now)
            }
            None => options.interval,
        };

        sleep(wait).await;
    }
}
