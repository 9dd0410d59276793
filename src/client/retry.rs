//! Retry policy for Slack Web API calls.
//!
//! # Retryable conditions
//!
//! - HTTP 429, or `ok: false` with `error: "ratelimited"`: wait for the
//!   server's `Retry-After` interval, then resend the identical request.
//! - HTTP 408 and 5xx: exponential backoff with down-jitter.
//! - Connection errors and timeouts: exponential backoff with down-jitter.
//!
//! Every other failure is returned to the caller on the first attempt.
//! All retries share one budget (`max_retries`) per request.

use std::time::Duration;

use reqwest::{header::HeaderMap, StatusCode};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Wait used when a rate-limit response carries no `Retry-After`.
    pub default_retry_after: Duration,
    /// Initial backoff delay before the first transient-error retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_retry_after: Duration::from_secs(1),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// A policy that never waits; for tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            default_retry_after: Duration::ZERO,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_factor: 0.0,
        }
    }
}

/// Parse the `Retry-After` header (whole seconds).
///
/// Slack always sends delta-seconds here; HTTP-date values are ignored.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Whether a non-429 status is worth retrying with backoff.
#[must_use]
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT || status.is_server_error()
}

/// Whether a transport error is worth retrying with backoff.
#[must_use]
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

/// Calculate the backoff delay before retry number `backoff_step + 1`.
#[must_use]
pub fn calculate_backoff(backoff_step: u32, config: &RetryConfig) -> Duration {
    // Exponential backoff: initial_delay * 2^backoff_step
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step.min(16) as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Down-jitter: multiply by random factor in [1 - jitter_factor, 1.0]
    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use rstest::rstest;

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_retry_after_missing_or_invalid() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[rstest]
    #[case(StatusCode::REQUEST_TIMEOUT, true)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case(StatusCode::BAD_GATEWAY, true)]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::TOO_MANY_REQUESTS, false)]
    #[case(StatusCode::BAD_REQUEST, false)]
    #[case(StatusCode::NOT_FOUND, false)]
    fn test_transient_statuses(#[case] status: StatusCode, #[case] expected: bool) {
        assert_eq!(is_transient_status(status), expected);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };

        assert_eq!(calculate_backoff(0, &config), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, &config), Duration::from_millis(200));
        assert_eq!(calculate_backoff(2, &config), Duration::from_millis(350));
        assert_eq!(calculate_backoff(40, &config), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_jitter_stays_in_range() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.25,
            ..RetryConfig::default()
        };

        for _ in 0..50 {
            let delay = calculate_backoff(0, &config);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let config = RetryConfig::immediate(3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(calculate_backoff(2, &config), Duration::ZERO);
    }
}
