//! Retry with exponential backoff and jitter.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use agent_types::ResilienceError;

/// A coded, retryable reason for failure. Errors protected by [`retry`]
/// implement [`Retryable`] to opt into the default taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryableCode {
    /// The call timed out.
    Timeout,
    /// The upstream rate-limited the call.
    RateLimited,
    /// The upstream reported itself unavailable.
    ServiceUnavailable,
    /// A transient network-level failure.
    NetworkError,
}

/// Errors classify themselves into a [`RetryableCode`], or `None` if they
/// represent a failure retrying cannot fix.
pub trait Retryable {
    /// This error's retry code, if any.
    fn retry_code(&self) -> Option<RetryableCode>;
}

fn default_retryable_codes() -> HashSet<RetryableCode> {
    [
        RetryableCode::Timeout,
        RetryableCode::RateLimited,
        RetryableCode::ServiceUnavailable,
        RetryableCode::NetworkError,
    ]
    .into_iter()
    .collect()
}

/// Configuration for [`retry`].
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Backoff ceiling; backoff never exceeds this.
    pub max_backoff: Duration,
    /// Multiplier applied to backoff after each failed attempt.
    pub backoff_factor: f64,
    /// Whether to jitter backoff by a factor drawn from `[0.75, 1.25)`.
    pub jitter: bool,
    /// Additional app-specific predicate. Built-in retryable codes are
    /// always retried regardless of what this returns; this can only add
    /// more conditions that count as retryable, never remove the defaults.
    pub additional_retryable: Option<std::sync::Arc<dyn Fn(&dyn std::error::Error) -> bool + Send + Sync>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_factor: 2.0,
            jitter: true,
            additional_retryable: None,
        }
    }
}

impl RetryPolicy {
    fn is_retryable<E: Retryable + std::error::Error>(&self, err: &E) -> bool {
        if let Some(code) = err.retry_code() {
            if default_retryable_codes().contains(&code) {
                return true;
            }
        }
        self.additional_retryable
            .as_ref()
            .map(|pred| pred(err))
            .unwrap_or(false)
    }

    fn backoff_after(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());
        let factor = if self.jitter {
            rand::thread_rng().gen_range(0.75..1.25)
        } else {
            1.0
        };
        Duration::from_secs_f64((capped * factor).max(0.0))
    }
}

/// Run `f` up to `policy.max_attempts` times, backing off between retryable
/// failures. Cancellation beats everything: if `cancellation` fires
/// mid-backoff, this returns immediately with [`ResilienceError::Cancelled`].
pub async fn retry<F, Fut, T, E>(
    cancellation: &CancellationToken,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<T, ResilienceError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::error::Error,
{
    let mut attempt = 0;
    loop {
        if cancellation.is_cancelled() {
            return Err(ResilienceError::Cancelled("cancelled before attempt".into()));
        }

        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                let exhausted = attempt >= policy.max_attempts;
                if exhausted || !policy.is_retryable(&err) {
                    return Err(ResilienceError::Inner(err));
                }
                let backoff = policy.backoff_after(attempt - 1);
                tokio::select! {
                    () = cancellation.cancelled() => {
                        return Err(ResilienceError::Cancelled("cancelled mid-backoff".into()));
                    }
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }
}
