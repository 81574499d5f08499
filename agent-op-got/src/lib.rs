#![deny(missing_docs)]
//! Graph-of-Thought — a controller driving generate/merge/split/loop/aggregate
//! over a persistent thought graph.
//!
//! The default controller runs a fixed generate/merge/aggregate schedule;
//! [`ThoughtGraph`] itself supports arbitrary operation sequences for a
//! future controller that fans out.

mod graph;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use agent_planner::{parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, ConfigError, Message, Oracle, PlannerError, PlannerState};

pub use graph::{ThoughtGraph, ThoughtNode};

/// Configuration for [`GotPlanner`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GotConfig {
    /// Number of sequential generate phases the default controller runs.
    pub generate_phases: usize,
    /// Distinct next-thoughts requested per generate call.
    pub branch_factor: usize,
    /// Whether to run one merge over all current leaves before aggregating.
    pub merge_enabled: bool,
    /// Hard cap on total operations (generate/merge/aggregate calls) per `plan`.
    pub max_operations: usize,
}

impl Default for GotConfig {
    fn default() -> Self {
        Self {
            generate_phases: 3,
            branch_factor: 3,
            merge_enabled: false,
            max_operations: 10,
        }
    }
}

/// The `got` planner strategy.
pub struct GotPlanner {
    oracle: Arc<dyn Oracle>,
    config: GotConfig,
}

impl GotPlanner {
    /// Construct a Graph-of-Thought planner over the given oracle.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, config: GotConfig) -> Self {
        Self { oracle, config }
    }

    /// `generate`: propose `branch_factor` distinct next thoughts from the
    /// listed source nodes, each added as a child of every source.
    async fn op_generate(&self, graph: &ThoughtGraph, sources: &[ThoughtNode]) -> Vec<String> {
        let prompt = format!(
            "Source thoughts:\n{}\n\nPropose {} distinct next thoughts building on these. Reply with exactly {} numbered lines.",
            render_nodes(sources),
            self.config.branch_factor,
            self.config.branch_factor,
        );
        let source_ids: Vec<String> = sources.iter().map(|n| n.id.clone()).collect();
        let thoughts = self.ask(&prompt, self.config.branch_factor).await;
        thoughts
            .into_iter()
            .map(|content| graph.add_node(content, 0.0, source_ids.clone()))
            .collect()
    }

    /// `merge`: synthesize one node from several source nodes.
    async fn op_merge(&self, graph: &ThoughtGraph, sources: &[ThoughtNode]) -> String {
        let prompt = format!(
            "Source thoughts:\n{}\n\nSynthesize these into a single combined thought.",
            render_nodes(sources),
        );
        let source_ids: Vec<String> = sources.iter().map(|n| n.id.clone()).collect();
        let content = self.ask_single(&prompt).await;
        graph.add_node(content, 0.0, source_ids)
    }

    /// `split`: break one node into 2-3 sub-nodes.
    #[allow(dead_code)]
    async fn op_split(&self, graph: &ThoughtGraph, source: &ThoughtNode) -> Vec<String> {
        let prompt = format!(
            "Thought: {}\n\nBreak this into 2 to 3 distinct sub-thoughts. Reply with one per numbered line.",
            source.content,
        );
        let thoughts = self.ask(&prompt, 3).await;
        thoughts
            .into_iter()
            .map(|content| graph.add_node(content, 0.0, vec![source.id.clone()]))
            .collect()
    }

    /// `loop`: refine one node in place, adding the refinement as a child.
    #[allow(dead_code)]
    async fn op_loop(&self, graph: &ThoughtGraph, source: &ThoughtNode) -> String {
        let prompt = format!("Thought: {}\n\nRefine this thought further.", source.content);
        let content = self.ask_single(&prompt).await;
        graph.add_node(content, 0.0, vec![source.id.clone()])
    }

    /// `aggregate`: produce one comprehensive answer from the listed nodes.
    async fn op_aggregate(&self, graph: &ThoughtGraph, sources: &[ThoughtNode]) -> String {
        let prompt = format!(
            "Source thoughts:\n{}\n\nProduce one comprehensive answer drawing on all of these.",
            render_nodes(sources),
        );
        let source_ids: Vec<String> = sources.iter().map(|n| n.id.clone()).collect();
        let content = self.ask_single(&prompt).await;
        graph.add_node(content, 0.0, source_ids)
    }

    async fn ask(&self, prompt: &str, limit: usize) -> Vec<String> {
        let messages = vec![Message::human(prompt.to_string())];
        match self.oracle.generate(&messages).await {
            Ok(response) => parse_numbered_lines(&response.text, limit),
            Err(_) => Vec::new(),
        }
    }

    async fn ask_single(&self, prompt: &str) -> String {
        let messages = vec![Message::human(prompt.to_string())];
        match self.oracle.generate(&messages).await {
            Ok(response) => response.text,
            Err(_) => String::new(),
        }
    }
}

fn render_nodes(nodes: &[ThoughtNode]) -> String {
    if nodes.is_empty() {
        return "(none)".to_string();
    }
    nodes
        .iter()
        .map(|n| format!("- [{}] {}", n.id, n.content))
        .collect::<Vec<_>>()
        .join("\n")
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

#[async_trait]
impl Planner for GotPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let graph = ThoughtGraph::new();
        let root = graph.add_node(state.input.clone(), 0.0, vec![]);
        let mut op_count = 0usize;

        let mut leaves = vec![graph.get_node(&root).expect("just inserted")];
        for _ in 0..self.config.generate_phases {
            if op_count >= self.config.max_operations {
                break;
            }
            self.op_generate(&graph, &leaves).await;
            op_count += 1;
            leaves = graph.leaf_nodes();
        }

        if self.config.merge_enabled && leaves.len() >= 2 && op_count < self.config.max_operations {
            self.op_merge(&graph, &leaves).await;
            op_count += 1;
            leaves = graph.leaf_nodes();
        }

        if leaves.len() > 1 && op_count < self.config.max_operations {
            self.op_aggregate(&graph, &leaves).await;
            leaves = graph.leaf_nodes();
        }

        let mut messages = state.messages.clone();
        messages.push(Message::system(format!(
            "Current leaf thoughts:\n{}\n\nGive the final answer.",
            render_nodes(&leaves)
        )));
        let response = self
            .oracle
            .generate(&messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("graph-of-thought: {err}")))?;
        Ok(parse_ai_response(&response))
    }
}

/// This strategy's registry name.
pub const NAME: &str = "got";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, config: serde_json::Value| {
        let config: GotConfig = if config.is_null() {
            GotConfig::default()
        } else {
            serde_json::from_value(config).map_err(|err| ConfigError::UnknownPlanner(format!("got: {err}")))?
        };
        Ok(Arc::new(GotPlanner::new(oracle, config)) as Arc<dyn Planner>)
    })
}

/// Register the `got` factory into `registry`.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `got` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::testing::ScriptedOracle;

    #[tokio::test]
    async fn default_run_generates_then_aggregates_then_synthesizes() {
        let oracle = Arc::new(ScriptedOracle::with_texts([
            "1. idea one\n2. idea two\n3. idea three",
            "1. idea one\n2. idea two\n3. idea three",
            "1. idea one\n2. idea two\n3. idea three",
            "a comprehensive answer",
            "final text",
        ]));
        let config = GotConfig {
            generate_phases: 3,
            branch_factor: 3,
            merge_enabled: false,
            max_operations: 10,
        };
        let planner = GotPlanner::new(oracle, config);
        let state = PlannerState::new("solve this", vec![Message::human("solve this")], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(t) if t == "final text"));
    }

    #[tokio::test]
    async fn single_leaf_skips_aggregate() {
        let oracle = Arc::new(ScriptedOracle::with_texts(["1. only idea", "final"]));
        let config = GotConfig {
            generate_phases: 1,
            branch_factor: 1,
            merge_enabled: false,
            max_operations: 10,
        };
        let planner = GotPlanner::new(oracle.clone(), config);
        let state = PlannerState::new("solve", vec![], vec![]);
        let actions = planner.plan(&state).await.unwrap();
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(_)));
        // generate (1 call) + final synthesis (1 call), no aggregate call since only one leaf.
        assert_eq!(oracle.call_count(), 2);
    }

    #[test]
    fn factory_registers_under_got() {
        let mut registry = PlannerRegistry::new();
        register(&mut registry);
        assert!(registry.list().contains(&NAME.to_string()));
    }

    #[test]
    fn register_global_populates_process_wide_registry() {
        register_global();
        assert!(agent_planner::list_planners().contains(&NAME.to_string()));
    }

    #[tokio::test]
    async fn op_split_breaks_a_node_into_sub_nodes_with_it_as_parent() {
        let oracle = Arc::new(ScriptedOracle::with_texts(["1. sub-thought one\n2. sub-thought two"]));
        let planner = GotPlanner::new(oracle, GotConfig::default());
        let graph = ThoughtGraph::new();
        let root = graph.get_node(&graph.add_node("a broad thought", 0.0, vec![])).unwrap();

        let children = planner.op_split(&graph, &root).await;

        assert_eq!(children.len(), 2);
        for child_id in &children {
            let child = graph.get_node(child_id).unwrap();
            assert_eq!(child.parents, vec![root.id.clone()]);
        }
        assert_eq!(graph.get_node(&root.id).unwrap().children, children);
    }

    #[tokio::test]
    async fn op_loop_refines_a_node_by_adding_one_child() {
        let oracle = Arc::new(ScriptedOracle::with_texts(["a refined thought"]));
        let planner = GotPlanner::new(oracle, GotConfig::default());
        let graph = ThoughtGraph::new();
        let root = graph.get_node(&graph.add_node("a rough thought", 0.0, vec![])).unwrap();

        let refined_id = planner.op_loop(&graph, &root).await;

        let refined = graph.get_node(&refined_id).unwrap();
        assert_eq!(refined.content, "a refined thought");
        assert_eq!(refined.parents, vec![root.id.clone()]);
        assert_eq!(graph.get_node(&root.id).unwrap().children, vec![refined_id]);
    }
}
