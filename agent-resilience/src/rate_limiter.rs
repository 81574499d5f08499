//! Token-bucket rate limiting plus a concurrency cap.

use std::convert::Infallible;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use agent_types::ResilienceError;

const POLL_GRANULARITY: Duration = Duration::from_millis(10);

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn try_consume(&self, n: f64) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = Instant::now();
        if state.tokens >= n {
            state.tokens -= n;
            true
        } else {
            false
        }
    }

    fn level(&self) -> f64 {
        let state = self.state.lock().expect("lock poisoned");
        state.tokens
    }
}

/// Configuration for [`RateLimiter`]. A zero value on any field means "no
/// limit" on that dimension.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Requests per minute.
    pub rpm: u32,
    /// Tokens per minute.
    pub tpm: u32,
    /// Maximum concurrent in-flight calls.
    pub max_concurrent: u32,
    /// Sleep duration `wait` applies after a retry.
    pub cooldown_on_retry: Duration,
}

/// Independent RPM and TPM token buckets plus a concurrency cap, refilled
/// by wall-clock elapsed time on each access.
pub struct RateLimiter {
    config: RateLimiterConfig,
    rpm_bucket: Option<TokenBucket>,
    tpm_bucket: Option<TokenBucket>,
    in_flight: Mutex<u32>,
}

impl RateLimiter {
    /// Construct a limiter from its configuration.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            rpm_bucket: (config.rpm > 0).then(|| TokenBucket::new(f64::from(config.rpm), f64::from(config.rpm) / 60.0)),
            tpm_bucket: (config.tpm > 0).then(|| TokenBucket::new(f64::from(config.tpm), f64::from(config.tpm) / 60.0)),
            in_flight: Mutex::new(0),
            config,
        }
    }

    /// Reserve one RPM token and one concurrency slot, polling at
    /// [`POLL_GRANULARITY`] until both are available or `cancellation` fires.
    pub async fn allow(&self, cancellation: &CancellationToken) -> Result<(), ResilienceError<Infallible>> {
        loop {
            if cancellation.is_cancelled() {
                return Err(ResilienceError::Cancelled("cancelled while waiting for a slot".into()));
            }

            if self.try_acquire_slot() {
                if self.rpm_bucket.as_ref().map_or(true, |bucket| bucket.try_consume(1.0)) {
                    return Ok(());
                }
                self.release();
            }

            tokio::select! {
                () = cancellation.cancelled() => {
                    return Err(ResilienceError::Cancelled("cancelled while waiting for a slot".into()));
                }
                () = tokio::time::sleep(POLL_GRANULARITY) => {}
            }
        }
    }

    /// Return a concurrency slot. Never goes below zero.
    pub fn release(&self) {
        let mut in_flight = self.in_flight.lock().expect("lock poisoned");
        *in_flight = in_flight.saturating_sub(1);
    }

    /// Deduct `n` tokens from the TPM bucket, blocking until enough have
    /// refilled. A no-op if no TPM limit is configured.
    pub async fn consume_tokens(&self, cancellation: &CancellationToken, n: u64) -> Result<(), ResilienceError<Infallible>> {
        let Some(bucket) = &self.tpm_bucket else {
            return Ok(());
        };
        loop {
            if cancellation.is_cancelled() {
                return Err(ResilienceError::Cancelled("cancelled while waiting for tokens".into()));
            }
            if bucket.try_consume(n as f64) {
                return Ok(());
            }
            tokio::select! {
                () = cancellation.cancelled() => {
                    return Err(ResilienceError::Cancelled("cancelled while waiting for tokens".into()));
                }
                () = tokio::time::sleep(POLL_GRANULARITY) => {}
            }
        }
    }

    /// Sleep for `cooldown_on_retry` (a no-op when zero), honoring cancellation.
    pub async fn wait(&self, cancellation: &CancellationToken) {
        if self.config.cooldown_on_retry.is_zero() {
            return;
        }
        tokio::select! {
            () = cancellation.cancelled() => {}
            () = tokio::time::sleep(self.config.cooldown_on_retry) => {}
        }
    }

    /// Current in-flight count, for diagnostics/metrics.
    #[must_use]
    pub fn in_flight(&self) -> u32 {
        *self.in_flight.lock().expect("lock poisoned")
    }

    /// Current RPM bucket level, for diagnostics/metrics. `None` if unlimited.
    #[must_use]
    pub fn rpm_level(&self) -> Option<f64> {
        self.rpm_bucket.as_ref().map(TokenBucket::level)
    }

    /// Current TPM bucket level, for diagnostics/metrics. `None` if unlimited.
    #[must_use]
    pub fn tpm_level(&self) -> Option<f64> {
        self.tpm_bucket.as_ref().map(TokenBucket::level)
    }

    fn try_acquire_slot(&self) -> bool {
        if self.config.max_concurrent == 0 {
            return true;
        }
        let mut in_flight = self.in_flight.lock().expect("lock poisoned");
        if *in_flight < self.config.max_concurrent {
            *in_flight += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_blocks_past_max_concurrent_until_release() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 0,
            max_concurrent: 1,
            cooldown_on_retry: Duration::ZERO,
        });
        let ct = CancellationToken::new();
        limiter.allow(&ct).await.unwrap();
        assert_eq!(limiter.in_flight(), 1);

        let limiter = std::sync::Arc::new(limiter);
        let limiter_clone = limiter.clone();
        let ct_clone = ct.clone();
        let waiter = tokio::spawn(async move { limiter_clone.allow(&ct_clone).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        limiter.release();
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn release_never_goes_below_zero() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 0,
            max_concurrent: 1,
            cooldown_on_retry: Duration::ZERO,
        });
        limiter.release();
        limiter.release();
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn zero_rpm_means_unlimited() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 0,
            max_concurrent: 0,
            cooldown_on_retry: Duration::ZERO,
        });
        let ct = CancellationToken::new();
        for _ in 0..100 {
            limiter.allow(&ct).await.unwrap();
        }
    }

    #[tokio::test]
    async fn consume_tokens_blocks_until_refill() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 60,
            max_concurrent: 0,
            cooldown_on_retry: Duration::ZERO,
        });
        let ct = CancellationToken::new();
        limiter.consume_tokens(&ct, 60).await.unwrap();
        assert!(limiter.tpm_level().unwrap() < 1.0);

        let start = Instant::now();
        limiter.consume_tokens(&ct, 1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn cancelled_allow_returns_cancelled_error() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 0,
            max_concurrent: 1,
            cooldown_on_retry: Duration::ZERO,
        });
        let ct = CancellationToken::new();
        limiter.allow(&ct).await.unwrap();

        ct.cancel();
        let result = limiter.allow(&ct).await;
        assert!(matches!(result, Err(ResilienceError::Cancelled(_))));
    }

    #[tokio::test]
    async fn wait_is_noop_when_cooldown_zero() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rpm: 0,
            tpm: 0,
            max_concurrent: 0,
            cooldown_on_retry: Duration::ZERO,
        });
        let ct = CancellationToken::new();
        let start = Instant::now();
        limiter.wait(&ct).await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
