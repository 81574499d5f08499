#![deny(missing_docs)]
//! LATS — Monte-Carlo tree search guided reasoning (`spec.md` §4.2.5).
//!
//! Builds a fresh search tree each `plan` call: select by UCT, expand the
//! chosen leaf with oracle-generated next steps, evaluate the new leaf,
//! backpropagate its score to the root, short-circuit on a high score, and
//! stash a reflection on a low one. Reflections accumulate across calls on
//! the same planner instance, like [Reflexion](../agent_op_reflexion).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use agent_planner::{parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, ConfigError, Message, Oracle, PlannerError, PlannerState};

/// Configuration for [`LatsPlanner`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LatsConfig {
    /// How many candidate next steps are requested at each expansion.
    pub expansion_width: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// UCT exploration constant `c`.
    pub exploration_constant: f64,
}

impl Default for LatsConfig {
    fn default() -> Self {
        Self {
            expansion_width: 5,
            max_depth: 10,
            exploration_constant: std::f64::consts::SQRT_2,
        }
    }
}

impl LatsConfig {
    /// Replace any non-positive field with its default (`spec.md` §4.2.5:
    /// "all positive (non-positive ignored)").
    #[must_use]
    fn sanitized(mut self) -> Self {
        let default = Self::default();
        if self.expansion_width == 0 {
            self.expansion_width = default.expansion_width;
        }
        if self.max_depth == 0 {
            self.max_depth = default.max_depth;
        }
        if self.exploration_constant <= 0.0 {
            self.exploration_constant = default.exploration_constant;
        }
        self
    }
}

struct LatsNode {
    content: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: u64,
    value: f64,
    depth: usize,
    reflection: Option<String>,
}

impl LatsNode {
    fn root() -> Self {
        Self {
            content: None,
            parent: None,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
            depth: 0,
            reflection: None,
        }
    }
}

/// The `lats` planner strategy.
pub struct LatsPlanner {
    oracle: Arc<dyn Oracle>,
    config: LatsConfig,
    reflections: Mutex<Vec<String>>,
}

impl LatsPlanner {
    /// Construct a LATS planner over the given oracle.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, config: LatsConfig) -> Self {
        Self {
            oracle,
            config: config.sanitized(),
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

    fn path_to(&self, tree: &[LatsNode], mut idx: usize) -> Vec<String> {
        let mut steps = Vec::new();
        loop {
            if let Some(content) = &tree[idx].content {
                steps.push(content.clone());
            }
            match tree[idx].parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
        steps.reverse();
        steps
    }

    fn select(&self, tree: &[LatsNode]) -> usize {
        let mut current = 0usize;
        loop {
            let node = &tree[current];
            if node.children.is_empty() {
                return current;
            }
            let best = node
                .children
                .iter()
                .copied()
                .max_by(|&a, &b| uct(tree, a, self.config.exploration_constant)
                    .partial_cmp(&uct(tree, b, self.config.exploration_constant))
                    .unwrap_or(std::cmp::Ordering::Equal));
            current = best.expect("non-empty children");
        }
    }

    async fn expand(&self, tree: &mut Vec<LatsNode>, leaf: usize) -> usize {
        if tree[leaf].depth >= self.config.max_depth {
            return leaf;
        }
        let path = self.path_to(tree, leaf);
        let reflections = self.reflections();
        let prompt = format!(
            "Path so far:\n{}\n{}\nPropose {} distinct possible next steps. Reply with exactly {} numbered lines.",
            render_path(&path),
            render_reflections(&reflections),
            self.config.expansion_width,
            self.config.expansion_width,
        );
        let messages = vec![Message::human(prompt)];
        let thoughts = match self.oracle.generate(&messages).await {
            Ok(response) => parse_numbered_lines(&response.text, self.config.expansion_width),
            Err(_) => Vec::new(),
        };
        if thoughts.is_empty() {
            return leaf;
        }
        let depth = tree[leaf].depth + 1;
        let mut first_child = None;
        for content in thoughts {
            let idx = tree.len();
            tree.push(LatsNode {
                content: Some(content),
                parent: Some(leaf),
                children: Vec::new(),
                visits: 0,
                value: 0.0,
                depth,
                reflection: None,
            });
            tree[leaf].children.push(idx);
            if first_child.is_none() {
                first_child = Some(idx);
            }
        }
        first_child.unwrap_or(leaf)
    }

    async fn evaluate(&self, tree: &[LatsNode], node: usize) -> f64 {
        let path = self.path_to(tree, node);
        let prompt = format!(
            "Path:\n{}\nScore how promising this path is from 0 to 1. Reply with only the number.",
            render_path(&path),
        );
        let messages = vec![Message::human(prompt)];
        match self.oracle.generate(&messages).await {
            Ok(response) => parse_score(&response.text),
            Err(_) => 0.5,
        }
    }

    fn backpropagate(&self, tree: &mut [LatsNode], mut idx: usize, score: f64) {
        loop {
            tree[idx].visits += 1;
            tree[idx].value += score;
            match tree[idx].parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
    }

    async fn reflect_on(&self, tree: &mut [LatsNode], node: usize) {
        if tree[node].reflection.is_some() {
            return;
        }
        let path = self.path_to(tree, node);
        let prompt = format!(
            "This path scored poorly:\n{}\nBriefly reflect on what went wrong.",
            render_path(&path),
        );
        let messages = vec![Message::human(prompt)];
        if let Ok(response) = self.oracle.generate(&messages).await {
            tree[node].reflection = Some(response.text.clone());
            self.reflections.lock().expect("lock poisoned").push(response.text);
        }
    }

    async fn synthesize(&self, state: &PlannerState, path: &[String]) -> Result<Vec<Action>, PlannerError> {
        let mut messages = state.messages.clone();
        messages.push(Message::system(format!(
            "Discovered reasoning path:\n{}\n\nUsing this path, give the final answer.",
            render_path(path)
        )));
        let response = self
            .oracle
            .generate(&messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("lats: {err}")))?;
        Ok(parse_ai_response(&response))
    }
}

fn uct(tree: &[LatsNode], idx: usize, c: f64) -> f64 {
    if idx == 0 {
        return 0.0;
    }
    let node = &tree[idx];
    if node.visits == 0 {
        return f64::INFINITY;
    }
    let parent_visits = tree[node.parent.expect("non-root has a parent")].visits;
    let exploitation = node.value / node.visits as f64;
    let exploration = c * ((parent_visits as f64).ln() / node.visits as f64).sqrt();
    exploitation + exploration
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        return "(empty)".to_string();
    }
    path.iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_reflections(reflections: &[String]) -> String {
    if reflections.is_empty() {
        String::new()
    } else {
        format!("Reflections from prior attempts:\n{}\n", reflections.join("\n"))
    }
}

fn parse_numbered_lines(text: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        let stripped = strip_list_prefix(line.trim());
        if stripped.is_empty() || out.contains(&stripped) {
            continue;
        }
        out.push(stripped);
        if out.len() >= limit {
            break;
        }
    }
    out
}

fn strip_list_prefix(line: &str) -> String {
    let trimmed = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let trimmed = trimmed.trim_start_matches(['.', ')', ':', '-', '*']).trim();
    trimmed.to_string()
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
impl Planner for LatsPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let mut tree = vec![LatsNode::root()];
        let total_iterations = self.config.expansion_width * self.config.max_depth;

        for _ in 0..total_iterations {
            let leaf = self.select(&tree);
            let current = self.expand(&mut tree, leaf).await;
            let score = self.evaluate(&tree, current).await;
            self.backpropagate(&mut tree, current, score);

            if score >= 0.9 {
                let path = self.path_to(&tree, current);
                return self.synthesize(state, &path).await;
            }
            if score < 0.3 {
                self.reflect_on(&mut tree, current).await;
            }
        }

        let best_leaf = tree
            .iter()
            .enumerate()
            .filter(|(_, node)| node.children.is_empty() && node.visits > 0)
            .max_by(|(_, a), (_, b)| {
                (a.value / a.visits as f64)
                    .partial_cmp(&(b.value / b.visits as f64))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx);

        let path = match best_leaf {
            Some(idx) => self.path_to(&tree, idx),
            None => vec!["Unable to find a viable reasoning path.".to_string()],
        };
        self.synthesize(state, &path).await
    }
}

/// This strategy's registry name.
pub const NAME: &str = "lats";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, config: serde_json::Value| {
        let config: LatsConfig = if config.is_null() {
            LatsConfig::default()
        } else {
            serde_json::from_value(config).map_err(|err| ConfigError::UnknownPlanner(format!("lats: {err}")))?
        };
        Ok(Arc::new(LatsPlanner::new(oracle, config)) as Arc<dyn Planner>)
    })
}

/// Register the `lats` factory into `registry`.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `lats` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}
