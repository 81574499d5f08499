//! Shared test doubles, gated behind the `testing` feature.
//!
//! Every planner crate needs the same canned-response oracle shape; this
//! lives here once instead of being redefined per crate (see `SPEC_FULL.md`
//! §C.4).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::OracleError;
use crate::message::Message;
use crate::oracle::{AiMessage, Oracle};
use crate::state::ToolDefinition;

/// An oracle that returns a fixed queue of canned responses, one per call,
/// looping the final response if the queue is exhausted.
pub struct ScriptedOracle {
    responses: Mutex<Vec<AiMessage>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedOracle {
    /// Construct an oracle that returns each response in order.
    #[must_use]
    pub fn new(responses: Vec<AiMessage>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Construct an oracle returning the given plain-text responses in order.
    #[must_use]
    pub fn with_texts(texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(texts.into_iter().map(AiMessage::text).collect())
    }

    /// How many times `generate` has been called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock poisoned").len()
    }

    /// The messages passed on the nth call.
    #[must_use]
    pub fn call(&self, n: usize) -> Option<Vec<Message>> {
        self.calls.lock().expect("lock poisoned").get(n).cloned()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, messages: &[Message]) -> Result<AiMessage, OracleError> {
        self.calls.lock().expect("lock poisoned").push(messages.to_vec());
        let mut responses = self.responses.lock().expect("lock poisoned");
        if responses.is_empty() {
            return Err(OracleError("ScriptedOracle: no responses left".into()));
        }
        if responses.len() == 1 {
            Ok(responses[0].clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn bind_tools(&self, _tools: Vec<ToolDefinition>) -> Arc<dyn Oracle> {
        Arc::new(ScriptedOracle::new(self.responses.lock().expect("lock poisoned").clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order_then_repeats_last() {
        let oracle = ScriptedOracle::with_texts(["first", "second"]);
        assert_eq!(oracle.generate(&[]).await.unwrap().text, "first");
        assert_eq!(oracle.generate(&[]).await.unwrap().text, "second");
        assert_eq!(oracle.generate(&[]).await.unwrap().text, "second");
        assert_eq!(oracle.call_count(), 3);
    }
}
