//! [`Executor`]: the Plan → Act → Observe → Replan reasoning loop
//! (`spec.md` §4.1).

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use agent_hooks::Hooks;
use agent_planner::Planner;
use agent_tool::ToolRegistry;
use agent_types::{ActionKind, Event, Message, PlannerState, ToolContext};

use crate::config::ExecutorConfig;
use crate::dispatch::dispatch;
use crate::rebuild::rebuild_messages;

/// The terminal action kind a finished iteration stopped on.
enum Terminal {
    /// A `respond-final` action, carrying the run's final text.
    Respond(String),
    /// A `handoff` action. Its `Event::Handoff` was already emitted by
    /// dispatch; no further terminal event follows it (`spec.md` invariant 5).
    Handoff,
}

/// Drives one planner through Plan → Act → Observe → Replan until a
/// terminal action, cancellation, or iteration exhaustion.
///
/// Holds a planner instance and its construction-time configuration. One
/// `Executor` can drive many runs; planner state that survives across runs
/// (Reflexion's reflections, LATS's tree) lives on the planner itself, not
/// here (`spec.md` §9).
pub struct Executor {
    planner: Arc<dyn Planner>,
    config: ExecutorConfig,
}

impl Executor {
    /// Construct an executor around a planner and its configuration.
    #[must_use]
    pub fn new(planner: Arc<dyn Planner>, config: ExecutorConfig) -> Self {
        Self { planner, config }
    }

    /// This executor's configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop, yielding `Event`s as they are produced.
    ///
    /// The caller pulls events one at a time; dropping the stream before a
    /// terminal event stops the run and releases its timeout timer promptly.
    /// Exactly one terminal event (`Done` or `Error`) is emitted, and
    /// nothing follows it.
    pub fn run(
        &self,
        input: impl Into<String>,
        agent_id: impl Into<String>,
        tools: ToolRegistry,
        initial_messages: Vec<Message>,
        hooks: Hooks,
        cancellation: CancellationToken,
    ) -> impl Stream<Item = Event> + Send + 'static {
        self.run_with_metadata(input, agent_id, tools, initial_messages, hooks, cancellation, std::collections::HashMap::new())
    }

    /// Like [`Executor::run`], but seeds `PlannerState.metadata` with
    /// `initial_metadata` (the agent facade's `WithMetadata` option) before
    /// the first `plan` call.
    pub fn run_with_metadata(
        &self,
        input: impl Into<String>,
        agent_id: impl Into<String>,
        tools: ToolRegistry,
        initial_messages: Vec<Message>,
        hooks: Hooks,
        cancellation: CancellationToken,
        initial_metadata: std::collections::HashMap<String, serde_json::Value>,
    ) -> impl Stream<Item = Event> + Send + 'static {
        let planner = self.planner.clone();
        let config = self.config.clone();
        let input = input.into();
        let agent_id = agent_id.into();

        stream! {
            let run_cancellation = cancellation.child_token();
            if !config.timeout.is_zero() {
                let timer_token = run_cancellation.clone();
                let duration = config.timeout;
                tokio::spawn(async move {
                    tokio::select! {
                        () = tokio::time::sleep(duration) => timer_token.cancel(),
                        () = timer_token.cancelled() => {}
                    }
                });
            }

            let mut registry = ToolRegistry::new();
            for tool in tools.iter() {
                registry.add(tool.clone());
            }
            let tool_ctx = ToolContext::new(run_cancellation.clone());

            if let Err(err) = hooks.fire_on_start(&input).await {
                let message = err.to_string();
                tracing::error!(agent_id = %agent_id, %message, "on_start hook failed");
                hooks.fire_on_end(None, Some(&message)).await;
                run_cancellation.cancel();
                yield Event::Error { agent_id: agent_id.clone(), message };
                return;
            }

            let mut state = PlannerState::new(input.clone(), initial_messages.clone(), registry.definitions());
            state.metadata = initial_metadata;

            for iteration in 0..config.max_iterations {
                if run_cancellation.is_cancelled() {
                    let message = "agent execution cancelled: context cancelled or timed out".to_string();
                    tracing::debug!(agent_id = %agent_id, iteration, "cancelled before iteration");
                    hooks.fire_on_end(None, Some(&message)).await;
                    run_cancellation.cancel();
                    yield Event::Error { agent_id: agent_id.clone(), message };
                    return;
                }

                state.iteration = iteration;
                tracing::debug!(agent_id = %agent_id, iteration, "planning");

                if let Err(err) = hooks.fire_before_plan(&state).await {
                    let message = err.to_string();
                    hooks.fire_on_end(None, Some(&message)).await;
                    run_cancellation.cancel();
                    yield Event::Error { agent_id: agent_id.clone(), message };
                    return;
                }

                let plan_result = if iteration == 0 {
                    planner.plan(&state).await
                } else {
                    planner.replan(&state).await
                };

                let actions = match plan_result {
                    Ok(actions) => actions,
                    Err(err) => {
                        let resolved = hooks.fire_on_error(err).await;
                        let message = resolved.to_string();
                        tracing::warn!(agent_id = %agent_id, iteration, %message, "planner error");
                        hooks.fire_on_end(None, Some(&message)).await;
                        run_cancellation.cancel();
                        yield Event::Error { agent_id: agent_id.clone(), message };
                        return;
                    }
                };

                if let Err(err) = hooks.fire_after_plan(&actions).await {
                    let message = err.to_string();
                    hooks.fire_on_end(None, Some(&message)).await;
                    run_cancellation.cancel();
                    yield Event::Error { agent_id: agent_id.clone(), message };
                    return;
                }

                let mut terminal: Option<Terminal> = None;

                for action in &actions {
                    if let Err(err) = hooks.fire_before_act(action).await {
                        let message = err.to_string();
                        hooks.fire_on_end(None, Some(&message)).await;
                        run_cancellation.cancel();
                        yield Event::Error { agent_id: agent_id.clone(), message };
                        return;
                    }

                    let outcome = match dispatch(action, &agent_id, &registry, &tool_ctx, &hooks).await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            let message = err.to_string();
                            hooks.fire_on_end(None, Some(&message)).await;
                            run_cancellation.cancel();
                            yield Event::Error { agent_id: agent_id.clone(), message };
                            return;
                        }
                    };

                    for event in outcome.events {
                        yield event;
                    }

                    if let Err(err) = hooks.fire_after_act(action, &outcome.observation).await {
                        let message = err.to_string();
                        hooks.fire_on_end(None, Some(&message)).await;
                        run_cancellation.cancel();
                        yield Event::Error { agent_id: agent_id.clone(), message };
                        return;
                    }

                    state.observations.push(outcome.observation);
                    for (key, value) in action.metadata.clone() {
                        state.metadata.insert(key, value);
                    }

                    match &action.kind {
                        ActionKind::RespondFinal(text) => {
                            terminal = Some(Terminal::Respond(text.clone()));
                            break;
                        }
                        ActionKind::Handoff { .. } => {
                            terminal = Some(Terminal::Handoff);
                            break;
                        }
                        _ => {}
                    }
                }

                if let Some(terminal) = terminal {
                    match terminal {
                        Terminal::Respond(text) => {
                            hooks.fire_on_end(Some(&text), None).await;
                            run_cancellation.cancel();
                            yield Event::Done { agent_id: agent_id.clone(), text };
                        }
                        Terminal::Handoff => {
                            hooks.fire_on_end(None, None).await;
                            run_cancellation.cancel();
                        }
                    }
                    return;
                }

                if let Err(err) = hooks.fire_on_iteration(iteration).await {
                    let message = err.to_string();
                    hooks.fire_on_end(None, Some(&message)).await;
                    run_cancellation.cancel();
                    yield Event::Error { agent_id: agent_id.clone(), message };
                    return;
                }

                state.messages = rebuild_messages(&initial_messages, &state.observations);
            }

            let message = format!("agent reached maximum iterations ({})", config.max_iterations);
            tracing::warn!(agent_id = %agent_id, "iteration budget exhausted");
            hooks.fire_on_end(None, Some(&message)).await;
            run_cancellation.cancel();
            yield Event::Error { agent_id: agent_id.clone(), message };
        }
    }
}
