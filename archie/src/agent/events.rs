//! Agent events - the only channel from the orchestration loop to a front end
//!
//! Events are delivered in order over an unbounded mpsc channel. A front end
//! that has gone away simply stops receiving; the loop never blocks on it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Observable activity of one user turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Waiting on the model
    Thinking { message: String },
    /// A tool call is about to run
    ToolStart {
        tool: String,
        params: IndexMap<String, String>,
    },
    /// A tool call finished
    ToolEnd {
        tool: String,
        result: String,
        success: bool,
        duration_ms: u64,
    },
    /// Final answer for the turn
    Response { content: String },
    /// The turn ended without an answer (failure, cancellation, limit)
    Error { message: String },
}

impl AgentEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            AgentEvent::Thinking { .. } => "thinking",
            AgentEvent::ToolStart { .. } => "tool_start",
            AgentEvent::ToolEnd { .. } => "tool_end",
            AgentEvent::Response { .. } => "response",
            AgentEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Response { .. } | AgentEvent::Error { .. })
    }
}

/// Sending half handed to the agent for one turn
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

/// Create a connected emitter and receiver
pub fn event_channel() -> (EventEmitter, mpsc::UnboundedReceiver<AgentEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventEmitter { tx }, rx)
}

impl EventEmitter {
    /// Emit a raw event
    pub fn emit(&self, event: AgentEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn thinking(&self, message: &str) {
        self.emit(AgentEvent::Thinking {
            message: message.to_string(),
        });
    }

    pub fn tool_start(&self, tool: &str, params: &IndexMap<String, String>) {
        self.emit(AgentEvent::ToolStart {
            tool: tool.to_string(),
            params: params.clone(),
        });
    }

    pub fn tool_end(&self, tool: &str, result: &str, success: bool, duration_ms: u64) {
        self.emit(AgentEvent::ToolEnd {
            tool: tool.to_string(),
            result: result.to_string(),
            success,
            duration_ms,
        });
    }

    pub fn response(&self, content: &str) {
        self.emit(AgentEvent::Response {
            content: content.to_string(),
        });
    }

    pub fn error(&self, message: &str) {
        self.emit(AgentEvent::Error {
            message: message.to_string(),
        });
    }
}
