//! The `Hooks` record of optional lifecycle callbacks, and `compose_hooks`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agent_types::{Action, AiMessage, HookError, Message, Observation, PlannerError, ToolCall, ToolResult};

type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send + 'a>>;
type OnErrorFuture = Pin<Box<dyn Future<Output = Option<PlannerError>> + Send>>;
type OnEndFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

type OnStartFn = Arc<dyn for<'a> Fn(&'a str) -> HookFuture<'a> + Send + Sync>;
type OnEndFn = Arc<dyn for<'a> Fn(Option<&'a str>, Option<&'a str>) -> OnEndFuture<'a> + Send + Sync>;
/// Takes the error by value: cheaper than cloning it just to hand out a
/// shared reference, and every real implementation either inspects it once
/// or replaces it outright.
type OnErrorFn = Arc<dyn Fn(PlannerError) -> OnErrorFuture + Send + Sync>;
type BeforePlanFn = Arc<dyn for<'a> Fn(&'a agent_types::PlannerState) -> HookFuture<'a> + Send + Sync>;
type AfterPlanFn = Arc<dyn for<'a> Fn(&'a [Action]) -> HookFuture<'a> + Send + Sync>;
type BeforeActFn = Arc<dyn for<'a> Fn(&'a Action) -> HookFuture<'a> + Send + Sync>;
type AfterActFn = Arc<dyn for<'a> Fn(&'a Action, &'a Observation) -> HookFuture<'a> + Send + Sync>;
type OnToolCallFn = Arc<dyn for<'a> Fn(&'a ToolCall) -> HookFuture<'a> + Send + Sync>;
type OnToolResultFn = Arc<dyn for<'a> Fn(&'a ToolResult) -> HookFuture<'a> + Send + Sync>;
type OnIterationFn = Arc<dyn Fn(usize) -> HookFuture<'static> + Send + Sync>;
type OnHandoffFn = Arc<dyn for<'a> Fn(&'a str) -> HookFuture<'a> + Send + Sync>;
type BeforeGenerateFn = Arc<dyn for<'a> Fn(&'a [Message]) -> HookFuture<'a> + Send + Sync>;
type AfterGenerateFn = Arc<dyn for<'a> Fn(&'a AiMessage) -> HookFuture<'a> + Send + Sync>;

/// A record of optional callbacks at each lifecycle join point.
///
/// Every field is independently optional; an unset field is a no-op when
/// fired. Build one with [`Hooks::default`] and the `with_*` setters, or
/// combine several with [`compose_hooks`].
#[derive(Clone, Default)]
pub struct Hooks {
    /// Fired once before the first iteration, with the run's input text.
    pub on_start: Option<OnStartFn>,
    /// Fired in every exit path with the final text (if any) and the final
    /// error's rendering (if any). Cannot abort the run.
    pub on_end: Option<OnEndFn>,
    /// Fired when the planner returns an error. Returning `Some` replaces
    /// the error; returning `None` defers to the next composed `on_error`,
    /// or, if none remain, the original error propagates.
    pub on_error: Option<OnErrorFn>,
    /// Fired before each `Plan`/`Replan` call.
    pub before_plan: Option<BeforePlanFn>,
    /// Fired after the planner returns its batch of actions.
    pub after_plan: Option<AfterPlanFn>,
    /// Fired before dispatching each action.
    pub before_act: Option<BeforeActFn>,
    /// Fired after an action's observation is produced.
    pub after_act: Option<AfterActFn>,
    /// Fired when a `tool` action resolves to a tool call.
    pub on_tool_call: Option<OnToolCallFn>,
    /// Fired once a tool call has produced a result.
    pub on_tool_result: Option<OnToolResultFn>,
    /// Fired at the end of each completed iteration.
    pub on_iteration: Option<OnIterationFn>,
    /// Fired when a handoff action dispatches, with the target agent id.
    pub on_handoff: Option<OnHandoffFn>,
    /// Fired before an oracle `generate` call.
    pub before_generate: Option<BeforeGenerateFn>,
    /// Fired after an oracle `generate` call returns successfully.
    pub after_generate: Option<AfterGenerateFn>,
}

macro_rules! fire {
    ($slot:expr, $($arg:expr),*) => {
        match &$slot {
            Some(f) => f($($arg),*).await,
            None => Ok(()),
        }
    };
}

impl Hooks {
    /// Fire `on_start`, if set.
    pub async fn fire_on_start(&self, input: &str) -> Result<(), HookError> {
        fire!(self.on_start, input)
    }

    /// Fire `on_end`, if set. Never returns an error; cannot abort.
    pub async fn fire_on_end(&self, final_result: Option<&str>, final_error: Option<&str>) {
        if let Some(f) = &self.on_end {
            f(final_result, final_error).await;
        }
    }

    /// Run a planner error through `on_error`. Returns the replacement if
    /// set, else the original error unchanged.
    pub async fn fire_on_error(&self, err: PlannerError) -> PlannerError {
        match &self.on_error {
            Some(f) => {
                let rendered = err.to_string();
                f(err).await.unwrap_or(PlannerError::Other(rendered.into()))
            }
            None => err,
        }
    }

    /// Fire `before_plan`, if set.
    pub async fn fire_before_plan(&self, state: &agent_types::PlannerState) -> Result<(), HookError> {
        fire!(self.before_plan, state)
    }

    /// Fire `after_plan`, if set.
    pub async fn fire_after_plan(&self, actions: &[Action]) -> Result<(), HookError> {
        fire!(self.after_plan, actions)
    }

    /// Fire `before_act`, if set.
    pub async fn fire_before_act(&self, action: &Action) -> Result<(), HookError> {
        fire!(self.before_act, action)
    }

    /// Fire `after_act`, if set.
    pub async fn fire_after_act(&self, action: &Action, observation: &Observation) -> Result<(), HookError> {
        fire!(self.after_act, action, observation)
    }

    /// Fire `on_tool_call`, if set.
    pub async fn fire_on_tool_call(&self, call: &ToolCall) -> Result<(), HookError> {
        fire!(self.on_tool_call, call)
    }

    /// Fire `on_tool_result`, if set.
    pub async fn fire_on_tool_result(&self, result: &ToolResult) -> Result<(), HookError> {
        fire!(self.on_tool_result, result)
    }

    /// Fire `on_iteration`, if set.
    pub async fn fire_on_iteration(&self, iteration: usize) -> Result<(), HookError> {
        fire!(self.on_iteration, iteration)
    }

    /// Fire `on_handoff`, if set.
    pub async fn fire_on_handoff(&self, target_id: &str) -> Result<(), HookError> {
        fire!(self.on_handoff, target_id)
    }

    /// Fire `before_generate`, if set.
    pub async fn fire_before_generate(&self, messages: &[Message]) -> Result<(), HookError> {
        fire!(self.before_generate, messages)
    }

    /// Fire `after_generate`, if set.
    pub async fn fire_after_generate(&self, message: &AiMessage) -> Result<(), HookError> {
        fire!(self.after_generate, message)
    }
}

/// Compose several `Hooks` records into one.
///
/// Each field of the result invokes the matching field of `h1..hn` in
/// registration order. For error-returning slots, the first callback to
/// return an error short-circuits the rest. `on_error` keeps looking while
/// callbacks return `None`, taking the first `Some` replacement; if all
/// return `None` the original error is returned unchanged (signaled here by
/// `on_error` itself returning `None` up to the caller). `on_end` always
/// invokes every composed hook's `on_end`, in order, regardless of outcome.
#[must_use]
pub fn compose_hooks(hooks: Vec<Hooks>) -> Hooks {
    let hooks = Arc::new(hooks);

    let h = hooks.clone();
    let on_start: OnStartFn = Arc::new(move |input: &str| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_on_start(input).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let on_end: OnEndFn = Arc::new(
        move |result: Option<&str>, error: Option<&str>| -> OnEndFuture<'_> {
            let h = h.clone();
            Box::pin(async move {
                for hook in h.iter() {
                    hook.fire_on_end(result, error).await;
                }
            })
        },
    );

    let h = hooks.clone();
    let on_error: OnErrorFn = Arc::new(move |err: PlannerError| -> OnErrorFuture {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                if let Some(f) = &hook.on_error {
                    if let Some(replacement) = f(PlannerError::Other(err.to_string().into())).await {
                        return Some(replacement);
                    }
                }
            }
            None
        })
    });

    let h = hooks.clone();
    let before_plan: BeforePlanFn =
        Arc::new(move |state: &agent_types::PlannerState| -> HookFuture<'_> {
            let h = h.clone();
            Box::pin(async move {
                for hook in h.iter() {
                    hook.fire_before_plan(state).await?;
                }
                Ok(())
            })
        });

    let h = hooks.clone();
    let after_plan: AfterPlanFn = Arc::new(move |actions: &[Action]| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_after_plan(actions).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let before_act: BeforeActFn = Arc::new(move |action: &Action| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_before_act(action).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let after_act: AfterActFn =
        Arc::new(move |action: &Action, observation: &Observation| -> HookFuture<'_> {
            let h = h.clone();
            Box::pin(async move {
                for hook in h.iter() {
                    hook.fire_after_act(action, observation).await?;
                }
                Ok(())
            })
        });

    let h = hooks.clone();
    let on_tool_call: OnToolCallFn = Arc::new(move |call: &ToolCall| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_on_tool_call(call).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let on_tool_result: OnToolResultFn = Arc::new(move |result: &ToolResult| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_on_tool_result(result).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let on_iteration: OnIterationFn = Arc::new(move |iteration: usize| -> HookFuture<'static> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_on_iteration(iteration).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let on_handoff: OnHandoffFn = Arc::new(move |target_id: &str| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_on_handoff(target_id).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let before_generate: BeforeGenerateFn = Arc::new(move |messages: &[Message]| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_before_generate(messages).await?;
            }
            Ok(())
        })
    });

    let h = hooks.clone();
    let after_generate: AfterGenerateFn = Arc::new(move |message: &AiMessage| -> HookFuture<'_> {
        let h = h.clone();
        Box::pin(async move {
            for hook in h.iter() {
                hook.fire_after_generate(message).await?;
            }
            Ok(())
        })
    });

    Hooks {
        on_start: Some(on_start),
        on_end: Some(on_end),
        on_error: Some(on_error),
        before_plan: Some(before_plan),
        after_plan: Some(after_plan),
        before_act: Some(before_act),
        after_act: Some(after_act),
        on_tool_call: Some(on_tool_call),
        on_tool_result: Some(on_tool_result),
        on_iteration: Some(on_iteration),
        on_handoff: Some(on_handoff),
        before_generate: Some(before_generate),
        after_generate: Some(after_generate),
    }
}
