//! Backoff calculation.
//!
//! Exponential backoff with additive jitter, capped at a maximum. A
//! positive server-supplied `Retry-After` always wins and is never
//! jittered.

use rand::Rng;
use std::time::Duration;

/// Upper bound of the jitter, as a fraction of the raw exponential delay.
pub const JITTER_RATIO: f64 = 0.5;

/// Compute the delay before the next attempt.
///
/// `attempt` is 1-indexed (the attempt that just failed). `jitter_unit`
/// is a sample in `[0, 1)` scaled into `[0, raw * JITTER_RATIO)`; pass
/// `0.0` for a deterministic delay.
///
/// # Example
///
/// ```
/// use rpctl_retries::backoff::backoff_delay;
/// use std::time::Duration;
///
/// let base = Duration::from_secs(1);
/// let max = Duration::from_secs(30);
/// assert_eq!(backoff_delay(3, base, max, None, 0.0), Duration::from_secs(4));
/// ```
pub fn backoff_delay(
    attempt: u32,
    base: Duration,
    max_delay: Duration,
    retry_after: Option<Duration>,
    jitter_unit: f64,
) -> Duration {
    if let Some(hint) = retry_after.filter(|d| !d.is_zero()) {
        return hint.min(max_delay);
    }

    let exponent = attempt.saturating_sub(1).min(1023) as i32;
    let raw = base.as_secs_f64() * 2f64.powi(exponent);
    let unit = if jitter_unit.is_finite() {
        jitter_unit.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let jitter = raw * JITTER_RATIO * unit;
    let delay = (raw + jitter).min(max_delay.as_secs_f64());
    Duration::from_secs_f64(delay.max(0.0))
}

/// Compute the delay, drawing jitter from `rng`.
pub fn calculate_delay<R: Rng + ?Sized>(
    attempt: u32,
    base: Duration,
    max_delay: Duration,
    retry_after: Option<Duration>,
    rng: &mut R,
) -> Duration {
    backoff_delay(attempt, base, max_delay, retry_after, rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BASE: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(30);

    #[test]
    fn test_exponential_growth_without_jitter() {
        assert_eq!(backoff_delay(1, BASE, MAX, None, 0.0), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, BASE, MAX, None, 0.0), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, BASE, MAX, None, 0.0), Duration::from_secs(4));
    }

    #[test]
    fn test_max_delay_caps_growth() {
        assert_eq!(backoff_delay(10, BASE, MAX, None, 0.0), MAX);
        assert_eq!(backoff_delay(u32::MAX, BASE, MAX, None, 0.99), MAX);
    }

    #[test]
    fn test_retry_after_wins() {
        let hint = Some(Duration::from_secs(5));
        assert_eq!(backoff_delay(1, BASE, MAX, hint, 0.9), Duration::from_secs(5));
        assert_eq!(
            backoff_delay(1, BASE, Duration::from_secs(3), hint, 0.9),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_zero_retry_after_falls_back_to_backoff() {
        let delay = backoff_delay(2, BASE, MAX, Some(Duration::ZERO), 0.0);
        assert_eq!(delay, Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_half_of_raw() {
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=4 {
            let raw = BASE.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
            for _ in 0..100 {
                let delay = calculate_delay(attempt, BASE, MAX, None, &mut rng).as_secs_f64();
                assert!(delay >= raw);
                assert!(delay < raw * 1.5 + 1e-9);
            }
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = calculate_delay(2, BASE, MAX, None, &mut StdRng::seed_from_u64(42));
        let b = calculate_delay(2, BASE, MAX, None, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
