//! Circuit breaker: closed / open / half-open.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use agent_types::ResilienceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

/// Configuration for [`CircuitBreaker`].
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before tripping from closed to open.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a half-open probe.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    open_since: Option<Instant>,
}

/// Trips open after `failure_threshold` consecutive failures, and stays
/// open until `reset_timeout` has elapsed, at which point the next call is
/// let through as a half-open probe.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Construct a breaker with the given configuration.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                open_since: None,
            }),
        }
    }

    /// The breaker's current state, for diagnostics/metrics.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("lock poisoned");
        self.transition_if_due(&mut inner);
        match inner.state {
            State::Closed => CircuitState::Closed,
            State::Open => CircuitState::Open,
            State::HalfOpen => CircuitState::HalfOpen,
        }
    }

    /// Force the breaker back to closed, clearing its failure count.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.state = State::Closed;
        inner.consecutive_failures = 0;
        inner.open_since = None;
    }

    fn transition_if_due(&self, inner: &mut Inner) {
        if inner.state == State::Open {
            if let Some(since) = inner.open_since {
                if since.elapsed() >= self.config.reset_timeout {
                    inner.state = State::HalfOpen;
                }
            }
        }
    }

    /// Call `f` through the breaker. While open, fails immediately with
    /// [`ResilienceError::CircuitOpen`] without invoking `f`.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let mut inner = self.inner.lock().expect("lock poisoned");
            self.transition_if_due(&mut inner);
            if inner.state == State::Open {
                return Err(ResilienceError::CircuitOpen);
            }
        }

        match f().await {
            Ok(value) => {
                let mut inner = self.inner.lock().expect("lock poisoned");
                inner.state = State::Closed;
                inner.consecutive_failures = 0;
                inner.open_since = None;
                Ok(value)
            }
            Err(err) => {
                let mut inner = self.inner.lock().expect("lock poisoned");
                match inner.state {
                    State::HalfOpen => {
                        inner.state = State::Open;
                        inner.open_since = Some(Instant::now());
                    }
                    State::Closed => {
                        inner.consecutive_failures += 1;
                        if inner.consecutive_failures >= self.config.failure_threshold {
                            inner.state = State::Open;
                            inner.open_since = Some(Instant::now());
                        }
                    }
                    State::Open => {}
                }
                Err(ResilienceError::Inner(err))
            }
        }
    }
}

/// The breaker's externally observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally.
    Closed,
    /// Calls fail immediately without invoking the protected function.
    Open,
    /// The reset timeout elapsed; the next call is a probe.
    HalfOpen,
}
