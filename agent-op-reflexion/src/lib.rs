#![deny(missing_docs)]
//! Reflexion — actor/evaluator/reflector with score-driven retry.
//!
//! The actor generates; unless it already emitted tool calls, an evaluator
//! scores the response in `[0,1]`. A low score earns the actor one retry
//! seasoned with a reflection, which is also appended to the planner's
//! reflection list so future iterations (and future runs, until [`reset`](ReflexionPlanner::reset))
//! start from it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use agent_planner::{build_messages_from_state, parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, Message, Oracle, PlannerError, PlannerState};

/// Configuration for [`ReflexionPlanner`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReflexionConfig {
    /// Score at or above which the actor's response is accepted outright.
    pub threshold: f64,
    /// Reflections accumulated before the loop gives up and accepts
    /// whatever the actor last produced.
    pub max_reflections: usize,
}

impl Default for ReflexionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            max_reflections: 3,
        }
    }
}

/// The `reflexion` planner strategy.
pub struct ReflexionPlanner {
    actor: Arc<dyn Oracle>,
    evaluator: Arc<dyn Oracle>,
    config: ReflexionConfig,
    reflections: Mutex<Vec<String>>,
}

impl ReflexionPlanner {
    /// Construct a Reflexion planner. `evaluator` defaults to `actor` when
    /// `None`.
    #[must_use]
    pub fn new(actor: Arc<dyn Oracle>, evaluator: Option<Arc<dyn Oracle>>, config: ReflexionConfig) -> Self {
        let evaluator = evaluator.unwrap_or_else(|| actor.clone());
        Self {
            actor,
            evaluator,
            config,
            reflections: Mutex::new(Vec::new()),
        }
    }

    /// Reflections accumulated so far, oldest first.
    #[must_use]
    pub fn reflections(&self) -> Vec<String> {
        self.reflections.lock().expect("lock poisoned").clone()
    }

    /// Clear accumulated reflections, as if this planner were fresh.
    pub fn reset(&self) {
        self.reflections.lock().expect("lock poisoned").clear();
    }

    fn reflections_preamble(&self) -> Option<Message> {
        let reflections = self.reflections.lock().expect("lock poisoned");
        if reflections.is_empty() {
            return None;
        }
        Some(Message::system(format!(
            "Reflections from prior attempts:\n{}",
            reflections.join("\n")
        )))
    }
}

/// Parse a `[0,1]` score out of free text, clamping in range and defaulting
/// to `0.5` on parse failure.
fn parse_score(text: &str) -> f64 {
    let trimmed = text.trim();
    let parsed = trimmed.parse::<f64>().ok().or_else(|| {
        trimmed
            .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
            .find_map(|token| token.parse::<f64>().ok())
    });
    parsed.unwrap_or(0.5).clamp(0.0, 1.0)
}

#[async_trait]
impl Planner for ReflexionPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let mut messages = build_messages_from_state(state);
        if let Some(preamble) = self.reflections_preamble() {
            messages.insert(0, preamble);
        }

        let bound_actor = self.actor.bind_tools(state.tools.clone());
        let first = bound_actor
            .generate(&messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("reflexion actor: {err}")))?;

        if first.has_tool_calls() {
            return Ok(parse_ai_response(&first));
        }

        let mut eval_messages = messages.clone();
        eval_messages.push(Message::ai(first.text.clone()));
        eval_messages.push(Message::human(
            "Score the response above from 0 to 1 on how well it addresses the task. Reply with only the number.",
        ));

        let evaluation = self.evaluator.generate(&eval_messages).await;
        let Ok(evaluation) = evaluation else {
            return Ok(parse_ai_response(&first));
        };
        let score = parse_score(&evaluation.text);

        let reflection_count = self.reflections.lock().expect("lock poisoned").len();
        if score >= self.config.threshold || reflection_count >= self.config.max_reflections {
            return Ok(parse_ai_response(&first));
        }

        let mut reflect_messages = eval_messages.clone();
        reflect_messages.push(Message::ai(evaluation.text.clone()));
        reflect_messages.push(Message::human(
            "Briefly reflect on how to improve the response given that score.",
        ));
        let Ok(reflection) = self.evaluator.generate(&reflect_messages).await else {
            return Ok(parse_ai_response(&first));
        };
        self.reflections
            .lock()
            .expect("lock poisoned")
            .push(reflection.text.clone());

        let mut retry_messages = messages;
        retry_messages.push(Message::human(format!(
            "Your previous response scored {score:.2}. Reflection: {}",
            reflection.text
        )));

        match bound_actor.generate(&retry_messages).await {
            Ok(retry) => Ok(parse_ai_response(&retry)),
            Err(_) => Ok(parse_ai_response(&first)),
        }
    }
}

/// This strategy's registry name.
pub const NAME: &str = "reflexion";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, config: serde_json::Value| {
        let config: ReflexionConfig = if config.is_null() {
            ReflexionConfig::default()
        } else {
            serde_json::from_value(config)
                .map_err(|err| agent_types::ConfigError::UnknownPlanner(format!("reflexion: {err}")))?
        };
        Ok(Arc::new(ReflexionPlanner::new(oracle, None, config)) as Arc<dyn Planner>)
    })
}

/// Register the `reflexion` factory into `registry`.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `reflexion` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::testing::ScriptedOracle;

    #[tokio::test]
    async fn high_score_accepts_first_response() {
        let actor = Arc::new(ScriptedOracle::with_texts(["weak"]));
        let evaluator = Arc::new(ScriptedOracle::with_texts(["0.9"]));
        let planner = ReflexionPlanner::new(actor, Some(evaluator), ReflexionConfig::default());
        let state = PlannerState::new("hi", vec![Message::human("hi")], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(t) if t == "weak"));
        assert!(planner.reflections().is_empty());
    }

    #[tokio::test]
    async fn low_score_retries_and_records_one_reflection() {
        let actor = Arc::new(ScriptedOracle::with_texts(["weak", "improved"]));
        let evaluator = Arc::new(ScriptedOracle::with_texts(["0.3", "Add detail"]));
        let planner = ReflexionPlanner::new(actor, Some(evaluator), ReflexionConfig::default());
        let state = PlannerState::new("hi", vec![Message::human("hi")], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(t) if t == "improved"));
        assert_eq!(planner.reflections(), vec!["Add detail".to_string()]);
    }

    #[tokio::test]
    async fn tool_calls_skip_evaluation() {
        use agent_types::{AiMessage, ToolCall};
        let actor = Arc::new(ScriptedOracle::new(vec![AiMessage::with_tool_calls(
            "",
            vec![ToolCall {
                id: "1".into(),
                name: "echo".into(),
                arguments: serde_json::json!({}),
            }],
        )]));
        let evaluator = Arc::new(ScriptedOracle::with_texts(["1.0"]));
        let planner = ReflexionPlanner::new(actor, Some(evaluator.clone()), ReflexionConfig::default());
        let state = PlannerState::new("hi", vec![], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::Tool(_)));
        assert_eq!(evaluator.call_count(), 0);
    }

    #[test]
    fn score_parsing_defaults_on_garbage() {
        assert_eq!(parse_score("not a number"), 0.5);
        assert_eq!(parse_score("1.5"), 1.0);
        assert_eq!(parse_score("-1"), 0.0);
        assert_eq!(parse_score("0.42"), 0.42);
    }

    #[test]
    fn reset_clears_reflections() {
        let actor = Arc::new(ScriptedOracle::with_texts(["x"]));
        let planner = ReflexionPlanner::new(actor, None, ReflexionConfig::default());
        planner.reflections.lock().unwrap().push("stale".into());
        planner.reset();
        assert!(planner.reflections().is_empty());
    }

    #[test]
    fn factory_registers_under_reflexion() {
        let mut registry = PlannerRegistry::new();
        register(&mut registry);
        assert!(registry.list().contains(&NAME.to_string()));
    }

    #[test]
    fn register_global_populates_process_wide_registry() {
        register_global();
        assert!(agent_planner::list_planners().contains(&NAME.to_string()));
    }
}
