//! Agent - conversation state, tool-call protocol and the orchestration loop

mod conversation;
mod engine;
mod events;
mod parser;
mod prompt;

pub use conversation::{Conversation, Turn, TurnRole};
pub use engine::{Agent, AgentError, CANCELLED_MESSAGE, CancelHandle, TurnOutcome};
pub use events::{AgentEvent, EventEmitter, event_channel};
pub use parser::{ToolCall, parse_tool_call};
pub use prompt::system_prompt;
