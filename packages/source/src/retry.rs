//! Fixed-attempt retry for document fetches.
//!
//! Every attempt is followed by the same pause; there is no backoff growth.
//! When all attempts fail the caller gets [`SourceError::Exhausted`] and
//! decides whether to skip the document.
//!
//! ```ignore
//! let html = retry::with_retries(RetryPolicy::default(), &url, || {
//!     retry::send_text(client.get(&url))
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::SourceError;

/// Attempts per document fetch.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least one is always made.
    pub attempts: u32,
    /// Pause after each failed attempt except the last.
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            pause: DEFAULT_PAUSE,
        }
    }
}

/// Runs `op` until it succeeds or `policy.attempts` attempts have failed.
///
/// # Errors
///
/// Returns [`SourceError::Exhausted`] carrying the last attempt's error.
pub async fn with_retries<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("{label}: attempt {attempt}/{attempts} failed: {e}");
                last_error = e.to_string();
                if attempt < attempts && !policy.pause.is_zero() {
                    tokio::time::sleep(policy.pause).await;
                }
            }
        }
    }

    Err(SourceError::Exhausted {
        attempts,
        last_error,
    })
}

/// Sends a request and returns the body as text.
///
/// # Errors
///
/// Returns [`SourceError`] on transport errors or a non-success status.
pub async fn send_text(request: reqwest::RequestBuilder) -> Result<String, SourceError> {
    Ok(send_checked(request).await?.text().await?)
}

/// Sends a request and parses the body as JSON.
///
/// # Errors
///
/// Returns [`SourceError`] on transport errors, a non-success status, or
/// a body that is not JSON.
pub async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, SourceError> {
    let text = send_checked(request).await?.text().await?;
    Ok(serde_json::from_str(&text)?)
}

async fn send_checked(request: reqwest::RequestBuilder) -> Result<reqwest::Response, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Normalization {
            message: format!("HTTP {status} from {}", response.url()),
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const NO_PAUSE: RetryPolicy = RetryPolicy {
        attempts: 3,
        pause: Duration::ZERO,
    };

    fn failure() -> SourceError {
        SourceError::Normalization {
            message: "HTTP 503".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0);
        let result = with_retries(NO_PAUSE, "test", || {
            calls.set(calls.get() + 1);
            async { Ok::<_, SourceError>(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Cell::new(0);
        let result = with_retries(NO_PAUSE, "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(failure()) } else { Ok(n) } }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn exhausts_after_fixed_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retries(NO_PAUSE, "test", || {
            calls.set(calls.get() + 1);
            async { Err(failure()) }
        })
        .await;

        assert_eq!(calls.get(), 3);
        match result {
            Err(SourceError::Exhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("HTTP 503"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            attempts: 0,
            pause: Duration::ZERO,
        };
        let _ = with_retries(policy, "test", || {
            calls.set(calls.get() + 1);
            async { Err::<(), _>(failure()) }
        })
        .await;
        assert_eq!(calls.get(), 1);
    }
}
