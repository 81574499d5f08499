//! Conversation turns and the persona that seeds them.

use serde::{Deserialize, Serialize};

use crate::action::ToolCall;

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A system/instruction message.
    System,
    /// A human user turn.
    Human,
    /// An assistant (oracle) turn.
    Ai,
    /// A tool result turn.
    Tool,
}

/// A polymorphic chat turn.
///
/// An `Ai` message may additionally carry tool calls; a `Tool` message
/// references the `id` of the `ToolCall` it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The textual content of this turn. Empty for a pure tool-call `Ai`
    /// message that carries no accompanying text.
    pub text: String,
    /// Tool calls attached to this turn. Only meaningful when `role == Ai`.
    pub tool_calls: Vec<ToolCall>,
    /// The id of the `ToolCall` this message answers. Only meaningful when
    /// `role == Tool`.
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::text_only(Role::System, text)
    }

    /// Create a human message.
    #[must_use]
    pub fn human(text: impl Into<String>) -> Self {
        Self::text_only(Role::Human, text)
    }

    /// Create a plain-text assistant message carrying no tool calls.
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self::text_only(Role::Ai, text)
    }

    /// Create an assistant message that carries tool calls.
    #[must_use]
    pub fn ai_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Ai,
            text: text.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool-result message answering the given tool-call id.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            text: text.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text_only(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Whether this `Ai` message carries at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// An immutable persona descriptor rendered into at most one system
/// message at loop start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Persona {
    /// The persona's role (e.g. "senior backend engineer").
    pub role: String,
    /// The persona's goal for this run.
    pub goal: String,
    /// Narrative backstory establishing voice and expertise.
    pub backstory: String,
    /// Short trait adjectives (e.g. "terse", "cautious").
    pub traits: Vec<String>,
}

impl Persona {
    /// Whether every field is empty, in which case no system message is
    /// rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.goal.is_empty()
            && self.backstory.is_empty()
            && self.traits.is_empty()
    }

    /// Render this persona into a system message, or `None` if it is
    /// entirely empty.
    #[must_use]
    pub fn render(&self) -> Option<Message> {
        if self.is_empty() {
            return None;
        }
        let mut text = String::new();
        if !self.role.is_empty() {
            text.push_str(&format!("Role: {}\n", self.role));
        }
        if !self.goal.is_empty() {
            text.push_str(&format!("Goal: {}\n", self.goal));
        }
        if !self.backstory.is_empty() {
            text.push_str(&format!("Backstory: {}\n", self.backstory));
        }
        if !self.traits.is_empty() {
            text.push_str(&format!("Traits: {}\n", self.traits.join(", ")));
        }
        Some(Message::system(text.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_persona_renders_nothing() {
        assert!(Persona::default().render().is_none());
    }

    #[test]
    fn persona_with_one_field_renders() {
        let persona = Persona {
            role: "analyst".into(),
            ..Default::default()
        };
        let msg = persona.render().expect("should render");
        assert_eq!(msg.role, Role::System);
        assert!(msg.text.contains("analyst"));
    }

    #[test]
    fn ai_message_with_tool_calls_round_trips() {
        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hi"}),
        };
        let msg = Message::ai_with_tool_calls("", vec![call]);
        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls[0].name, "echo");
    }
}
