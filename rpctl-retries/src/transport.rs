//! HTTP transport classification.
//!
//! Turns reqwest failures and non-2xx responses into [`RpctlError`]s so
//! the retry executor can decide what to do with them.

use crate::error::{RpctlError, RpctlResult, TransportKind};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::Response;
use std::time::Duration;
use tracing::debug;

impl From<reqwest::Error> for RpctlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpctlError::transport(TransportKind::Timeout, err.to_string())
        } else if err.is_connect() {
            RpctlError::transport(TransportKind::Connect, err.to_string())
        } else if err.is_decode() {
            RpctlError::api(format!("Invalid response from RunPod API: {err}"))
        } else if err.is_builder() {
            RpctlError::config(format!("Invalid request: {err}"))
        } else {
            RpctlError::transport(TransportKind::Io, err.to_string())
        }
    }
}

/// Parse a `Retry-After` value given in seconds.
///
/// Only positive, finite numbers count; HTTP-date values are ignored.
/// Values too large for a [`Duration`] saturate to [`Duration::MAX`] and
/// are capped later by the backoff calculator.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

/// Read the `Retry-After` header.
pub fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

/// Classify a non-2xx status with its raw `Retry-After` value and body.
pub fn classify_status(status: u16, retry_after: Option<&str>, body: impl Into<String>) -> RpctlError {
    let hint = if status == 429 {
        retry_after.and_then(parse_retry_after)
    } else {
        None
    };
    RpctlError::from_status(status, body, hint)
}

/// Check an HTTP response and convert it to an error if needed.
pub async fn check_response(response: Response) -> RpctlResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after_header(response.headers());
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "Request failed");

    let hint = if status.as_u16() == 429 { retry_after } else { None };
    Err(RpctlError::from_status(status.as_u16(), body, hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("0"), None);
        assert_eq!(parse_retry_after("-2"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_huge_retry_after_saturates_and_is_capped() {
        assert_eq!(parse_retry_after("1e20"), Some(Duration::MAX));
        assert_eq!(parse_retry_after("inf"), None);

        let err = classify_status(429, Some("1e20"), "");
        let delay = crate::backoff::backoff_delay(
            1,
            Duration::from_secs(1),
            Duration::from_secs(30),
            err.retry_after(),
            0.5,
        );
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn test_classify_status() {
        let err = classify_status(429, Some("7"), "");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert!(err.is_transient());

        let err = classify_status(503, Some("7"), "down");
        assert_eq!(err.retry_after(), None);
        assert!(err.is_transient());

        assert!(matches!(
            classify_status(401, None, ""),
            RpctlError::Authentication { .. }
        ));
        assert!(!classify_status(422, None, "invalid").is_transient());
    }

    #[tokio::test]
    async fn test_check_response_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = check_response(response).await.unwrap_err();

        assert_eq!(err.status_code(), Some(429));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_check_response_success_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let response = check_response(response).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_connect_failure_is_transient() {
        let err: RpctlError = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, RpctlError::Transport { .. }));
        assert!(err.is_transient());
    }
}
