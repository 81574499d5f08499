use std::sync::Arc;

use agent_executor::{Executor, ExecutorConfig};
use agent_hooks::Hooks;
use agent_planner::Planner;
use agent_tool::ToolRegistry;
use agent_types::{Action, Message, PlannerError, PlannerState};
use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, Criterion};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// A planner that answers immediately with no tool calls, isolating the
/// loop's own per-iteration overhead from any oracle latency.
struct InstantPlanner;

#[async_trait]
impl Planner for InstantPlanner {
    async fn plan(&self, _state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        Ok(vec![Action::respond_final("done")])
    }
}

fn bench_single_iteration_no_tools(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let executor = Executor::new(Arc::new(InstantPlanner), ExecutorConfig::default());

    c.bench_function("single_iteration_no_tools", |b| {
        b.iter(|| {
            rt.block_on(async {
                let stream = executor.run(
                    "hello",
                    "bench-agent",
                    ToolRegistry::new(),
                    vec![Message::human("hello")],
                    Hooks::default(),
                    CancellationToken::new(),
                );
                tokio::pin!(stream);
                while stream.next().await.is_some() {}
            })
        })
    });
}

criterion_group!(benches, bench_single_iteration_no_tools);
criterion_main!(benches);
