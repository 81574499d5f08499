use std::time::Duration;

use agent_resilience::{retry, CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use agent_types::ResilienceError;
use criterion::{criterion_group, criterion_main, Criterion};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct NeverRetryable;

impl std::fmt::Display for NeverRetryable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "never retryable")
    }
}
impl std::error::Error for NeverRetryable {}
impl agent_resilience::Retryable for NeverRetryable {
    fn retry_code(&self) -> Option<agent_resilience::RetryableCode> {
        None
    }
}

/// Overhead of `retry` on the first-attempt-succeeds path, isolating its own
/// bookkeeping from any backoff sleep.
fn bench_retry_first_attempt_success(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let policy = RetryPolicy::default();
    let ct = CancellationToken::new();

    c.bench_function("retry_first_attempt_success", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result: Result<&str, ResilienceError<NeverRetryable>> =
                    retry(&ct, &policy, || async { Ok("ok") }).await;
                result.unwrap()
            })
        })
    });
}

/// Overhead of a closed-circuit `CircuitBreaker::call` on the success path.
fn bench_circuit_breaker_closed_call(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let breaker = CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 5,
        reset_timeout: Duration::from_secs(30),
    });

    c.bench_function("circuit_breaker_closed_call", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result: Result<&str, ResilienceError<NeverRetryable>> =
                    breaker.call(|| async { Ok("ok") }).await;
                result.unwrap()
            })
        })
    });
}

criterion_group!(
    benches,
    bench_retry_first_attempt_success,
    bench_circuit_breaker_closed_call
);
criterion_main!(benches);
