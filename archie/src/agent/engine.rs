//! Orchestration loop - drives the model through tool calls to a final answer
//!
//! One call to [`Agent::process_input`] handles one user turn:
//!
//! 1. check the cancel token (cancelled: stop, no model call)
//! 2. stop with an error if the iteration ceiling is reached
//! 3. emit `Thinking` and send the system prompt plus every turn to the model
//! 4. check the cancel token again once the model returns
//! 5. a tool call in the reply runs through the invoker and loops back to 1;
//!    a reply without one is the final answer
//!
//! Cancellation is cooperative: a running tool call is never interrupted, the
//! token is only observed at the two checkpoints and by the model backend.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::conversation::Conversation;
use super::events::{AgentEvent, EventEmitter, event_channel};
use super::parser::parse_tool_call;
use super::prompt::system_prompt;
use crate::config::Config;
use crate::llm::{ChatModel, LlmError, create_client};
use crate::tools::{ToolContext, ToolDescriptor, ToolError, ToolInvoker, ToolRegistry};

/// Message carried by the `Error` event when a turn is cancelled
pub const CANCELLED_MESSAGE: &str = "Operation cancelled by the user";

/// Errors that prevent a turn from starting
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent is already processing a request")]
    Busy,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed { response: String },
    Cancelled,
    Failed { message: String },
    LimitReached { iterations: u32 },
}

/// Shared slot holding the token of the turn in flight
///
/// Clones can be moved to a signal handler or another task; `cancel` there
/// reaches whichever turn is currently running.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    slot: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelHandle {
    /// Signal the running turn; `false` when there is nothing to cancel
    pub fn cancel(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(token) => {
                info!("CancelHandle::cancel: cancelling running turn");
                token.cancel();
                true
            }
            None => {
                debug!("CancelHandle::cancel: nothing to cancel");
                false
            }
        }
    }

    /// Whether a turn is in flight
    pub fn is_running(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Install a fresh token for a new turn
    fn begin(&self) -> Result<TurnGuard, AgentError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(AgentError::Busy);
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Ok(TurnGuard {
            slot: Arc::clone(&self.slot),
            token,
        })
    }
}

/// Clears the slot when the turn exits, however it exits
struct TurnGuard {
    slot: Arc<Mutex<Option<CancellationToken>>>,
    token: CancellationToken,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Per-turn state threaded through the loop
struct TurnContext {
    id: Uuid,
    cancel: CancellationToken,
    iteration: u32,
    events: EventEmitter,
}

/// The conversational agent
pub struct Agent {
    model: Arc<dyn ChatModel>,
    invoker: ToolInvoker,
    conversation: Conversation,
    system_prompt: String,
    max_iterations: Option<u32>,
    cancel: CancelHandle,
}

impl Agent {
    /// Create an agent over a model and an invoker
    pub fn new(model: Arc<dyn ChatModel>, invoker: ToolInvoker) -> Self {
        debug!(model = %model.name(), "Agent::new: called");
        let ctx = invoker.context();
        let system_prompt = system_prompt(
            invoker.registry(),
            ctx.root(),
            ctx.extra_dir().ok().map(|extra| extra.root()),
        );
        Self {
            model,
            invoker,
            conversation: Conversation::new(),
            system_prompt,
            max_iterations: None,
            cancel: CancelHandle::default(),
        }
    }

    /// Build the model, tools and sandbox from configuration
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        debug!("Agent::from_config: called");
        let model = create_client(&config.llm)?;
        let ctx = ToolContext::from_config(&config.sandbox, &config.tools)?;
        let registry = Arc::new(ToolRegistry::standard()?);
        Ok(Self::new(model, ToolInvoker::new(registry, ctx)).with_max_iterations(config.agent.max_iterations))
    }

    /// Cap model calls per turn (`None` = unlimited)
    pub fn with_max_iterations(mut self, max_iterations: Option<u32>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn model_name(&self) -> String {
        self.model.name()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tool_context(&self) -> &ToolContext {
        self.invoker.context()
    }

    /// Descriptors of every registered tool, in registration order
    pub fn tool_descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.invoker.registry().descriptors()
    }

    /// Handle for cancelling from outside the turn
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Signal the running turn; `false` when there is nothing to cancel
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_running()
    }

    /// Forget every turn
    pub fn clear_history(&mut self) {
        info!(turns = self.conversation.len(), "Agent::clear_history: called");
        self.conversation.clear();
    }

    /// Run one user turn, streaming events until a terminal one
    pub async fn process_input(&mut self, input: &str, events: &EventEmitter) -> Result<TurnOutcome, AgentError> {
        let guard = self.cancel.begin()?;
        let mut turn = TurnContext {
            id: Uuid::now_v7(),
            cancel: guard.token.clone(),
            iteration: 0,
            events: events.clone(),
        };
        info!(turn_id = %turn.id, input_len = input.len(), "Agent::process_input: turn started");

        self.conversation.push_user(input);
        let outcome = self.run_turn(&mut turn).await;

        info!(turn_id = %turn.id, iterations = turn.iteration, ?outcome, "Agent::process_input: turn finished");
        drop(guard);
        Ok(outcome)
    }

    async fn run_turn(&mut self, turn: &mut TurnContext) -> TurnOutcome {
        loop {
            if turn.cancel.is_cancelled() {
                return Self::cancelled(turn);
            }
            if let Some(max) = self.max_iterations
                && turn.iteration >= max
            {
                warn!(turn_id = %turn.id, max, "Agent::run_turn: iteration limit reached");
                turn.events.error(&format!(
                    "Stopped after {} model calls without a final answer",
                    max
                ));
                return TurnOutcome::LimitReached { iterations: max };
            }

            turn.iteration += 1;
            turn.events.thinking(if turn.iteration == 1 {
                "Processing..."
            } else {
                "Continuing..."
            });

            let messages = self.conversation.to_messages(&self.system_prompt);
            debug!(turn_id = %turn.id, iteration = turn.iteration, messages = messages.len(), "Agent::run_turn: calling model");
            let reply = match self.model.chat(&messages, &turn.cancel).await {
                Ok(reply) => reply,
                Err(e) if e.is_cancelled() || turn.cancel.is_cancelled() => return Self::cancelled(turn),
                Err(e) => {
                    warn!(turn_id = %turn.id, error = %e, "Agent::run_turn: model call failed");
                    let message = e.to_string();
                    turn.events.error(&message);
                    return TurnOutcome::Failed { message };
                }
            };

            if turn.cancel.is_cancelled() {
                return Self::cancelled(turn);
            }

            match parse_tool_call(&reply) {
                Some(call) => {
                    debug!(turn_id = %turn.id, tool = %call.name, "Agent::run_turn: tool call");
                    turn.events.tool_start(&call.name, &call.params);
                    let invocation = self.invoker.invoke(&call.name, &call.params).await;
                    turn.events.tool_end(
                        &invocation.tool,
                        &invocation.result.content,
                        !invocation.result.is_error,
                        invocation.duration.as_millis() as u64,
                    );

                    self.conversation.push_assistant(reply);
                    self.conversation.push_tool(invocation.tool, invocation.result.content);
                }
                None => {
                    debug!(turn_id = %turn.id, "Agent::run_turn: final answer");
                    self.conversation.push_assistant(reply.clone());
                    turn.events.response(&reply);
                    return TurnOutcome::Completed { response: reply };
                }
            }
        }
    }

    fn cancelled(turn: &TurnContext) -> TurnOutcome {
        info!(turn_id = %turn.id, iteration = turn.iteration, "Agent::run_turn: cancelled");
        turn.events.error(CANCELLED_MESSAGE);
        TurnOutcome::Cancelled
    }

    /// Run a turn and return only its final text
    ///
    /// Failures come back as `Error: <message>`.
    pub async fn invoke(&mut self, input: &str) -> Result<String, AgentError> {
        let (events, mut rx) = event_channel();
        self.process_input(input, &events).await?;
        drop(events);

        let mut output = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::Response { content } => output = content,
                AgentEvent::Error { message } => output = format!("Error: {}", message),
                _ => {}
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::TurnRole;
    use crate::llm::mock::{Scripted, ScriptedModel};
    use crate::llm::{ChatMessage, Role};
    use crate::tools::{Tool, ToolParams};
    use async_trait::async_trait;
    use std::sync::OnceLock;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn agent_with(model: Arc<dyn ChatModel>, registry: ToolRegistry, root: &std::path::Path) -> Agent {
        let ctx = ToolContext::new(root).unwrap();
        Agent::new(model, ToolInvoker::new(Arc::new(registry), ctx))
    }

    fn standard_agent(model: Arc<dyn ChatModel>, root: &std::path::Path) -> Agent {
        agent_with(model, ToolRegistry::standard().unwrap(), root)
    }

    fn drain(rx: &mut UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn kinds(events: &[AgentEvent]) -> Vec<&'static str> {
        events.iter().map(AgentEvent::event_type).collect()
    }

    const LIST: &str = "[TOOL: list_files]\ndirectory: .\n[/TOOL]";

    #[tokio::test]
    async fn test_direct_answer() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replies(["Hello! How can I help?"]));
        let mut agent = standard_agent(model.clone(), temp.path());
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("hi", &events).await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                response: "Hello! How can I help?".into()
            }
        );
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["thinking", "response"]);
        assert_eq!(
            events[0],
            AgentEvent::Thinking {
                message: "Processing...".into()
            }
        );
        assert_eq!(agent.conversation().len(), 2);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_three_tool_calls_then_answer() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), "alpha").unwrap();
        let model = Arc::new(ScriptedModel::replies([
            LIST,
            "[TOOL: read_file]\npath: a.txt\n[/TOOL]",
            "[TOOL: create_file]\nname: b.txt\ncontent: beta\n[/TOOL]",
            "Done: read a.txt and created b.txt.",
        ]));
        let mut agent = standard_agent(model.clone(), temp.path());
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("copy things", &events).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec![
                "thinking", "tool_start", "tool_end", "thinking", "tool_start", "tool_end", "thinking", "tool_start",
                "tool_end", "thinking", "response"
            ]
        );
        assert_eq!(
            events[3],
            AgentEvent::Thinking {
                message: "Continuing...".into()
            }
        );
        // user + 3 x (assistant + tool) + final assistant
        assert_eq!(agent.conversation().len(), 8);
        assert_eq!(std::fs::read_to_string(temp.path().join("b.txt")).unwrap(), "beta");

        // Every model call sees the whole history so far
        let requests = model.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[3].len(), 8);
        assert_eq!(requests[3][0].role, Role::System);
        assert_eq!(requests[3][7], ChatMessage::user("[Result of create_file]\nFile created: b.txt (0.0KB)"));
    }

    #[tokio::test]
    async fn test_failed_tool_is_fed_back() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replies([
            "[TOOL: teleport]\nto: mars\n[/TOOL]",
            "[TOOL: read_file]\n[/TOOL]",
            "Sorry, I couldn't do that.",
        ]));
        let mut agent = standard_agent(model.clone(), temp.path());
        let (events, mut rx) = event_channel();

        agent.process_input("go", &events).await.unwrap();

        let events = drain(&mut rx);
        let ends: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::ToolEnd { result, success, .. } => Some((result.clone(), *success)),
                _ => None,
            })
            .collect();
        assert_eq!(ends[0], ("Tool \"teleport\" not found".to_string(), false));
        assert_eq!(
            ends[1],
            (
                "Error: Required parameter \"path\" not provided or empty".to_string(),
                false
            )
        );
        let tool_turns: Vec<_> = agent
            .conversation()
            .turns()
            .iter()
            .filter(|t| t.role() == TurnRole::Tool)
            .collect();
        assert_eq!(tool_turns.len(), 2);
    }

    #[tokio::test]
    async fn test_sandbox_violation_is_a_failed_tool_turn() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replies([
            "[TOOL: read_file]\npath: ../../etc/passwd\n[/TOOL]",
            "I can't access that.",
        ]));
        let mut agent = standard_agent(model, temp.path());
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("read passwd", &events).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        let events = drain(&mut rx);
        assert!(events.iter().any(
            |e| matches!(e, AgentEvent::ToolEnd { success: false, result, .. } if result.contains("Access denied"))
        ));
    }

    #[tokio::test]
    async fn test_model_failure_ends_turn() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Scripted::Fail("model exploded".into())]));
        let mut agent = standard_agent(model, temp.path());
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("hi", &events).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Failed { ref message } if message.contains("model exploded")));
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["thinking", "error"]);
        assert!(!agent.is_running());
    }

    #[tokio::test]
    async fn test_cancel_during_model_call() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Scripted::Stall(
            Duration::from_secs(30),
            "too late".into(),
        )]));
        let mut agent = standard_agent(model, temp.path());
        let handle = agent.cancel_handle();
        let (events, mut rx) = event_channel();

        let canceller = async {
            // Wait for the model call to begin
            while !handle.is_running() {
                tokio::task::yield_now().await;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(handle.cancel());
        };
        let (outcome, _) = tokio::join!(agent.process_input("slow", &events), canceller);

        assert_eq!(outcome.unwrap(), TurnOutcome::Cancelled);
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["thinking", "error"]);
        assert_eq!(
            events.last(),
            Some(&AgentEvent::Error {
                message: CANCELLED_MESSAGE.into()
            })
        );
        // Only the user turn; the stalled reply is dropped
        assert_eq!(agent.conversation().len(), 1);
        assert!(!agent.is_running());
        assert!(!agent.cancel());
    }

    /// Cancels the running turn from inside a tool call
    struct CancellingTool {
        handle: Arc<OnceLock<CancelHandle>>,
    }

    #[async_trait]
    impl Tool for CancellingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("stop_me", "Cancels the turn")
        }

        async fn execute(&self, _params: &ToolParams, _ctx: &ToolContext) -> Result<String, ToolError> {
            if let Some(handle) = self.handle.get() {
                handle.cancel();
            }
            Ok("finished anyway".into())
        }
    }

    #[tokio::test]
    async fn test_cancel_checked_before_next_model_call() {
        let temp = tempdir().unwrap();
        let slot = Arc::new(OnceLock::new());
        let mut registry = ToolRegistry::empty();
        registry
            .register(Arc::new(CancellingTool {
                handle: Arc::clone(&slot),
            }))
            .unwrap();
        let model = Arc::new(ScriptedModel::replies(["[TOOL: stop_me][/TOOL]", "never sent"]));
        let mut agent = agent_with(model.clone(), registry, temp.path());
        slot.set(agent.cancel_handle()).unwrap();
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("go", &events).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Cancelled);
        // The in-flight tool call completed; the second model call never happened
        assert_eq!(model.call_count(), 1);
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["thinking", "tool_start", "tool_end", "error"]);
        assert!(matches!(&events[2], AgentEvent::ToolEnd { success: true, .. }));
        assert_eq!(agent.conversation().len(), 3);
    }

    /// Model that ignores the token but cancels the turn while "thinking"
    struct SelfCancellingModel {
        handle: Arc<OnceLock<CancelHandle>>,
    }

    #[async_trait]
    impl ChatModel for SelfCancellingModel {
        fn name(&self) -> String {
            "self-cancelling".into()
        }

        async fn chat(&self, _messages: &[ChatMessage], _cancel: &CancellationToken) -> Result<String, LlmError> {
            if let Some(handle) = self.handle.get() {
                handle.cancel();
            }
            Ok("[TOOL: create_file]\nname: should_not_exist.txt\ncontent: x\n[/TOOL]".into())
        }
    }

    #[tokio::test]
    async fn test_cancel_checked_after_model_returns() {
        let temp = tempdir().unwrap();
        let slot = Arc::new(OnceLock::new());
        let model = Arc::new(SelfCancellingModel {
            handle: Arc::clone(&slot),
        });
        let mut agent = standard_agent(model, temp.path());
        slot.set(agent.cancel_handle()).unwrap();
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("go", &events).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Cancelled);
        assert_eq!(kinds(&drain(&mut rx)), vec!["thinking", "error"]);
        assert_eq!(agent.conversation().len(), 1);
        assert!(!temp.path().join("should_not_exist.txt").exists());
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replies([LIST, LIST, LIST]));
        let mut agent = standard_agent(model.clone(), temp.path()).with_max_iterations(Some(2));
        let (events, mut rx) = event_channel();

        let outcome = agent.process_input("loop forever", &events).await.unwrap();

        assert_eq!(outcome, TurnOutcome::LimitReached { iterations: 2 });
        assert_eq!(model.call_count(), 2);
        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec!["thinking", "tool_start", "tool_end", "thinking", "tool_start", "tool_end", "error"]
        );
    }

    #[tokio::test]
    async fn test_clear_history_resets_context() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::replies(["first", "second"]));
        let mut agent = standard_agent(model.clone(), temp.path());
        let (events, _rx) = event_channel();

        agent.process_input("one", &events).await.unwrap();
        agent.clear_history();
        assert!(agent.conversation().is_empty());
        agent.process_input("two", &events).await.unwrap();

        let requests = model.requests();
        assert_eq!(requests[1].len(), 2);
        assert_eq!(requests[1][1], ChatMessage::user("two"));
    }

    #[tokio::test]
    async fn test_cancel_with_nothing_running() {
        let temp = tempdir().unwrap();
        let agent = standard_agent(Arc::new(ScriptedModel::replies(["x"])), temp.path());
        assert!(!agent.is_running());
        assert!(!agent.cancel());
    }

    #[tokio::test]
    async fn test_busy_when_slot_taken() {
        let temp = tempdir().unwrap();
        let mut agent = standard_agent(Arc::new(ScriptedModel::replies(["x"])), temp.path());
        let guard = agent.cancel.begin().unwrap();
        let (events, _rx) = event_channel();

        let err = agent.process_input("hi", &events).await.unwrap_err();
        assert!(matches!(err, AgentError::Busy));
        assert!(agent.conversation().is_empty());

        drop(guard);
        assert!(agent.process_input("hi", &events).await.is_ok());
    }

    #[tokio::test]
    async fn test_invoke_collects_output() {
        let temp = tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            Scripted::Reply("All good".into()),
            Scripted::Fail("boom".into()),
        ]));
        let mut agent = standard_agent(model, temp.path());

        assert_eq!(agent.invoke("hi").await.unwrap(), "All good");
        let failed = agent.invoke("again").await.unwrap();
        assert!(failed.starts_with("Error: "));
        assert!(failed.contains("boom"));
    }

    #[test]
    fn test_system_prompt_lists_root() {
        let temp = tempdir().unwrap();
        let agent = standard_agent(Arc::new(ScriptedModel::replies(["x"])), temp.path());
        let root = agent.tool_context().root().display().to_string();
        assert!(agent.system_prompt().contains(&root));
    }
}
