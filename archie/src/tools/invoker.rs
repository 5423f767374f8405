//! ToolInvoker - turns a parsed tool call into a ToolResult
//!
//! Lookup, validation, coercion and execution all collapse into a
//! [`ToolResult`]: unknown names, missing parameters, handler errors and
//! handler panics come back as failed results instead of errors, so the
//! orchestration loop can feed them straight back to the model.

use futures::FutureExt;
use indexmap::IndexMap;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::params::ToolParams;
use super::{ToolContext, ToolError, ToolRegistry, ToolResult};

/// Outcome of one invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: String,
    pub result: ToolResult,
    pub duration: Duration,
}

/// Runs tools from a registry against a context
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>, ctx: ToolContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Resolve, validate and run a tool; never retries
    pub async fn invoke(&self, name: &str, raw: &IndexMap<String, String>) -> Invocation {
        debug!(tool_name = %name, params = raw.len(), "ToolInvoker::invoke: called");
        let started = Instant::now();
        let result = self.run(name, raw).await;
        let duration = started.elapsed();
        debug!(tool_name = %name, is_error = result.is_error, ?duration, "ToolInvoker::invoke: finished");

        Invocation {
            tool: name.to_string(),
            result,
            duration,
        }
    }

    async fn run(&self, name: &str, raw: &IndexMap<String, String>) -> ToolResult {
        let Some((descriptor, tool)) = self.registry.get(name) else {
            debug!("ToolInvoker::run: unknown tool");
            return ToolResult::error(ToolError::UnknownTool { name: name.to_string() }.to_string());
        };

        let params = match ToolParams::prepare(descriptor, raw) {
            Ok(params) => params,
            Err(e) => {
                debug!(%e, "ToolInvoker::run: validation failed");
                return ToolResult::error(format!("Error: {}", e));
            }
        };

        let exec = AssertUnwindSafe(tool.execute(&params, &self.ctx)).catch_unwind();
        match exec.await {
            Ok(Ok(content)) => ToolResult::success(content),
            Ok(Err(e)) => {
                debug!(%e, "ToolInvoker::run: tool returned error");
                ToolResult::error(format!("Error: {}", e))
            }
            Err(payload) => {
                let e = ToolError::Panicked(panic_message(&payload));
                warn!(tool_name = %name, %e, "ToolInvoker::run: tool panicked");
                ToolResult::error(format!("Error: {}", e))
            }
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
