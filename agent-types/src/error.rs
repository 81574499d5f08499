//! Error taxonomy for the agent reasoning core.
//!
//! Each concern gets its own `thiserror`-derived enum rather than one
//! grab-bag error, so callers can match on exactly the failure mode they
//! care about.

/// Errors constructing or configuring an [`crate::PlannerState`]-driving
/// component (executor, planner registry entry, resilience primitive).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_iterations` was zero or negative.
    #[error("max_iterations must be positive, got {0}")]
    NonPositiveMaxIterations(i64),
    /// A planner name was not found in the registry.
    #[error("no planner registered under name {0:?}")]
    UnknownPlanner(String),
    /// No oracle was supplied where one is required.
    #[error("missing oracle")]
    MissingOracle,
}

/// Errors from tool operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The input provided to the tool could not be decoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// The handoff target declined the transfer (`is_enabled` returned false).
    #[error("handoff disabled: {0}")]
    HandoffDisabled(String),
    /// Catch-all for other tool errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from hook callbacks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A hook callback failed; this is fatal to the run it fired in.
    #[error("hook failed: {0}")]
    Failed(String),
    /// Catch-all for other hook errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors a planner strategy can surface from `Plan`/`Replan`.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The oracle call failed. The string is prefixed by the strategy name
    /// per `spec.md` §7 (e.g. `"reflexion actor: ..."`).
    #[error("{0}")]
    Oracle(String),
    /// The planner could not make sense of an oracle response it required
    /// to be well-formed (e.g. a score it could not parse after already
    /// applying the documented fallback).
    #[error("malformed planner response: {0}")]
    Malformed(String),
    /// Catch-all for other planner errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a run of the [`crate::Executor`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The run's cancellation context was cancelled or its deadline elapsed.
    #[error("agent execution cancelled: {0}")]
    Cancelled(String),
    /// The planner returned an error that `OnError` did not suppress.
    #[error(transparent)]
    Planner(#[from] PlannerError),
    /// A hook callback returned an error; fatal to the run.
    #[error(transparent)]
    Hook(#[from] HookError),
    /// The loop reached `max_iterations` without a terminal action.
    #[error("agent reached maximum iterations ({0})")]
    MaxIterations(usize),
    /// Construction-time configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// An error from the oracle (LLM) collaborator. Opaque: the core does not
/// interpret oracle failures beyond deciding whether to retry them, which
/// is the resilience layer's job, not this type's.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct OracleError(pub String);

/// Errors from resilience primitives (retry, circuit breaker, hedge, rate limiter).
#[derive(Debug, thiserror::Error)]
pub enum ResilienceError<E> {
    /// The circuit is open; the protected function was not invoked.
    #[error("circuit breaker is open")]
    CircuitOpen,
    /// The caller's cancellation context was cancelled while waiting.
    #[error("cancelled: {0}")]
    Cancelled(String),
    /// The protected function itself failed (after retries/hedging were exhausted).
    #[error(transparent)]
    Inner(E),
}
