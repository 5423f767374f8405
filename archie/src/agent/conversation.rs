//! Conversation state - the append-only turn log replayed to the model

use serde::Serialize;

use crate::llm::ChatMessage;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    Tool,
}

/// One entry in the conversation; immutable once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
    tool_name: Option<String>,
    tool_result: Option<String>,
}

impl Turn {
    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn tool_result(&self) -> Option<&str> {
        self.tool_result.as_deref()
    }

    /// Chat message this turn is replayed as
    ///
    /// Tool turns go back to the model as user messages prefixed with the tool name.
    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::User => ChatMessage::user(&self.content),
            TurnRole::Assistant => ChatMessage::assistant(&self.content),
            TurnRole::Tool => ChatMessage::user(format!(
                "[Result of {}]\n{}",
                self.tool_name.as_deref().unwrap_or("tool"),
                self.tool_result.as_deref().unwrap_or(&self.content)
            )),
        }
    }
}

/// Ordered turn log; only the agent appends, only a reset removes
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::User,
            content: content.into(),
            tool_name: None,
            tool_result: None,
        });
    }

    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::Assistant,
            content: content.into(),
            tool_name: None,
            tool_result: None,
        });
    }

    pub(crate) fn push_tool(&mut self, tool: impl Into<String>, result: impl Into<String>) {
        let result = result.into();
        self.turns.push(Turn {
            role: TurnRole::Tool,
            content: result.clone(),
            tool_name: Some(tool.into()),
            tool_result: Some(result),
        });
    }

    /// Drop every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// System prompt followed by every turn in order
    pub fn to_messages(&self, system_prompt: &str) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(system_prompt))
            .chain(self.turns.iter().map(Turn::to_message))
            .collect()
    }
}
