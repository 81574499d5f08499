//! The `Planner` contract every strategy in `agent-op-*` implements.

use async_trait::async_trait;

use agent_types::{Action, PlannerError, PlannerState};

/// A strategy mapping `(state) -> actions`.
///
/// `plan` is called on the first iteration of a run (`state.iteration == 0`);
/// `replan` on every subsequent iteration. The default `replan` simply calls
/// `plan` again, which is correct for stateless strategies (ReAct); stateful
/// strategies (e.g. self-discover) override it to skip redundant work.
///
/// Planner instances may hold mutable state across runs (Reflexion's
/// accumulated reflections, LATS's search tree). Concurrent `plan`/`replan`
/// calls on one shared instance are outside this contract — callers should
/// construct one planner per concurrent run.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce the next batch of actions from the first call of a run.
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError>;

    /// Produce the next batch of actions from a later call of a run.
    /// Defaults to [`Planner::plan`].
    async fn replan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        self.plan(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlanner(AtomicUsize);

    #[async_trait]
    impl Planner for CountingPlanner {
        async fn plan(&self, _state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Action::respond_final("done")])
        }
    }

    #[tokio::test]
    async fn default_replan_delegates_to_plan() {
        let planner = CountingPlanner(AtomicUsize::new(0));
        let state = PlannerState::new("hi", vec![], vec![]);
        planner.replan(&state).await.unwrap();
        assert_eq!(planner.0.load(Ordering::SeqCst), 1);
    }
}
