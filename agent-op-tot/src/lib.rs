#![deny(missing_docs)]
//! Tree-of-Thought — BFS/DFS search over generated next-step thoughts.
//!
//! Each node is one reasoning step appended to a path; a generator prompt
//! proposes next steps, an evaluator prompt scores a path's newest step as
//! `sure`/`maybe`/`impossible`. BFS explores breadth-first via a max-heap
//! keyed on score; DFS recurses into whichever child strictly improves on
//! the best score seen so far.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use agent_planner::{parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, ConfigError, Message, Oracle, PlannerError, PlannerState};

/// Search order for [`TotPlanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotStrategy {
    /// Breadth-first via a score-ordered max-heap.
    Bfs,
    /// Greedy depth-first recursion.
    Dfs,
}

/// Configuration for [`TotPlanner`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TotConfig {
    /// How many next-step candidates the generator is asked for at each node.
    pub branch_factor: usize,
    /// Maximum path length before a branch stops expanding.
    pub max_depth: usize,
    /// Search order.
    pub strategy: TotStrategy,
}

impl Default for TotConfig {
    fn default() -> Self {
        Self {
            branch_factor: 3,
            max_depth: 5,
            strategy: TotStrategy::Bfs,
        }
    }
}

/// The `tot` planner strategy.
pub struct TotPlanner {
    oracle: Arc<dyn Oracle>,
    config: TotConfig,
}

impl TotPlanner {
    /// Construct a Tree-of-Thought planner over the given oracle.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, config: TotConfig) -> Self {
        Self { oracle, config }
    }

    async fn generate_thoughts(&self, problem: &str, path: &[String]) -> Vec<String> {
        let prompt = format!(
            "Problem: {problem}\nCurrent path of steps:\n{}\n\nGiven the problem and the current path, propose {} distinct possible next steps. Reply with exactly {} numbered lines, one step per line.",
            render_path(path),
            self.config.branch_factor,
            self.config.branch_factor,
        );
        let messages = vec![Message::human(prompt)];
        match self.oracle.generate(&messages).await {
            Ok(response) => parse_numbered_lines(&response.text, self.config.branch_factor),
            Err(_) => Vec::new(),
        }
    }

    async fn evaluate_path(&self, problem: &str, path: &[String]) -> f64 {
        let prompt = format!(
            "Problem: {problem}\nCandidate path of steps:\n{}\n\nIs this path on track to solve the problem? Reply with exactly one word: sure, maybe, or impossible.",
            render_path(path),
        );
        let messages = vec![Message::human(prompt)];
        match self.oracle.generate(&messages).await {
            Ok(response) => classify_verdict(&response.text),
            Err(_) => 0.0,
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
            .map_err(|err| PlannerError::Oracle(format!("tree-of-thought: {err}")))?;
        Ok(parse_ai_response(&response))
    }

    async fn run_bfs(&self, problem: &str) -> (f64, Vec<String>) {
        let mut heap: BinaryHeap<ScoredPath> = BinaryHeap::new();
        for thought in self.generate_thoughts(problem, &[]).await {
            let path = vec![thought];
            let score = self.evaluate_path(problem, &path).await;
            if score > 0.0 {
                heap.push(ScoredPath { score, path, depth: 1 });
            }
        }

        let mut best_score = f64::NEG_INFINITY;
        let mut best_path = Vec::new();

        while let Some(top) = heap.pop() {
            if top.score > best_score {
                best_score = top.score;
                best_path = top.path.clone();
            }
            if top.depth < self.config.max_depth {
                for thought in self.generate_thoughts(problem, &top.path).await {
                    let mut child_path = top.path.clone();
                    child_path.push(thought);
                    let score = self.evaluate_path(problem, &child_path).await;
                    if score > 0.0 {
                        heap.push(ScoredPath {
                            score,
                            path: child_path,
                            depth: top.depth + 1,
                        });
                    }
                }
            }
        }

        (best_score, best_path)
    }

    fn run_dfs<'a>(&'a self, problem: &'a str) -> Pin<Box<dyn Future<Output = (f64, Vec<String>)> + Send + 'a>> {
        Box::pin(async move {
            let mut best_score = f64::NEG_INFINITY;
            let mut best_path = Vec::new();
            self.dfs_step(problem, &[], 0, &mut best_score, &mut best_path).await;
            (best_score, best_path)
        })
    }

    fn dfs_step<'a>(
        &'a self,
        problem: &'a str,
        path: &'a [String],
        depth: usize,
        best_score: &'a mut f64,
        best_path: &'a mut Vec<String>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if depth >= self.config.max_depth {
                return;
            }
            for thought in self.generate_thoughts(problem, path).await {
                let mut child_path = path.to_vec();
                child_path.push(thought);
                let score = self.evaluate_path(problem, &child_path).await;
                if score > *best_score {
                    *best_score = score;
                    *best_path = child_path.clone();
                    self.dfs_step(problem, &child_path, depth + 1, best_score, best_path).await;
                }
            }
        })
    }
}

#[async_trait]
impl Planner for TotPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration, strategy = ?self.config.strategy))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let (_, path) = match self.config.strategy {
            TotStrategy::Bfs => self.run_bfs(&state.input).await,
            TotStrategy::Dfs => self.run_dfs(&state.input).await,
        };

        if path.is_empty() {
            let sentinel = vec!["Unable to find a viable reasoning path.".to_string()];
            return self.synthesize(state, &sentinel).await;
        }
        self.synthesize(state, &path).await
    }
}

struct ScoredPath {
    score: f64,
    path: Vec<String>,
    depth: usize,
}

impl PartialEq for ScoredPath {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for ScoredPath {}
impl PartialOrd for ScoredPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal)
    }
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

/// Parse up to `limit` distinct numbered lines out of free text.
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

/// Map an evaluator's `sure`/`maybe`/`impossible` verdict to its score.
fn classify_verdict(text: &str) -> f64 {
    let lower = text.to_lowercase();
    if lower.contains("impossible") {
        0.0
    } else if lower.contains("maybe") {
        0.5
    } else if lower.contains("sure") {
        1.0
    } else {
        0.0
    }
}

/// This strategy's registry name.
pub const NAME: &str = "tot";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, config: serde_json::Value| {
        let config: TotConfig = if config.is_null() {
            TotConfig::default()
        } else {
            serde_json::from_value(config).map_err(|err| ConfigError::UnknownPlanner(format!("tot: {err}")))?
        };
        Ok(Arc::new(TotPlanner::new(oracle, config)) as Arc<dyn Planner>)
    })
}

/// Register the `tot` factory into `registry`.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `tot` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::testing::ScriptedOracle;

    #[test]
    fn verdict_classification() {
        assert_eq!(classify_verdict("Sure, this works"), 1.0);
        assert_eq!(classify_verdict("Maybe"), 0.5);
        assert_eq!(classify_verdict("impossible"), 0.0);
        assert_eq!(classify_verdict("unclear"), 0.0);
    }

    #[test]
    fn numbered_line_parsing_strips_prefixes_and_dedups() {
        let text = "1. Do the thing\n2) Do the thing\n3. Do another thing\n";
        let lines = parse_numbered_lines(text, 3);
        assert_eq!(lines, vec!["Do the thing".to_string(), "Do another thing".to_string()]);
    }

    #[tokio::test]
    async fn empty_heap_falls_back_to_sentinel_path() {
        let oracle = Arc::new(ScriptedOracle::with_texts(["impossible", "final answer"]));
        let planner = TotPlanner::new(oracle, TotConfig::default());
        let state = PlannerState::new("hard problem", vec![Message::human("hard problem")], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(_)));
    }

    #[test]
    fn scored_path_orders_by_score() {
        let mut heap = BinaryHeap::new();
        heap.push(ScoredPath { score: 0.2, path: vec![], depth: 0 });
        heap.push(ScoredPath { score: 0.9, path: vec![], depth: 0 });
        heap.push(ScoredPath { score: 0.5, path: vec![], depth: 0 });
        assert_eq!(heap.pop().unwrap().score, 0.9);
        assert_eq!(heap.pop().unwrap().score, 0.5);
        assert_eq!(heap.pop().unwrap().score, 0.2);
    }

    #[test]
    fn factory_registers_under_tot() {
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
