#![deny(missing_docs)]
//! Retry, circuit breaker, hedging, and rate limiting for oracle and tool
//! calls.
//!
//! No single module in the reasoning core owns this; these are first
//! principles primitives built around `tokio`'s cancellation and timer
//! facilities, composable around any fallible async call.

pub mod circuit_breaker;
pub mod hedge;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use hedge::hedge;
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use retry::{retry, RetryPolicy, RetryableCode, Retryable};
