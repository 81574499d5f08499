//! [`ExecutorConfig`]: the executor's construction-time knobs.

use std::time::Duration;

use agent_types::ConfigError;

/// Default cap on Plan/Replan iterations per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default wall-clock budget for one run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Construction-time configuration for an [`crate::Executor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Hard cap on Plan+Replan calls in one run. Always positive.
    pub max_iterations: usize,
    /// Wall-clock budget for one run, derived from the caller's cancellation
    /// context. A zero duration means "no timeout beyond whatever deadline
    /// the caller's context already carries".
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecutorConfig {
    /// Build a config, rejecting a non-positive `max_iterations`.
    pub fn new(max_iterations: i64, timeout: Duration) -> Result<Self, ConfigError> {
        if max_iterations <= 0 {
            return Err(ConfigError::NonPositiveMaxIterations(max_iterations));
        }
        Ok(Self {
            max_iterations: max_iterations as usize,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn zero_max_iterations_is_rejected() {
        let err = ExecutorConfig::new(0, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveMaxIterations(0)));
    }

    #[test]
    fn negative_max_iterations_is_rejected() {
        let err = ExecutorConfig::new(-3, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveMaxIterations(-3)));
    }

    #[test]
    fn zero_timeout_is_accepted_as_no_timeout() {
        let config = ExecutorConfig::new(5, Duration::ZERO).unwrap();
        assert_eq!(config.timeout, Duration::ZERO);
    }
}
