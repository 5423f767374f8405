//! Archie - conversational file assistant
//!
//! Archie turns natural-language requests into a bounded sequence of file
//! operations inside a sandboxed folder. A chat model decides what to do; the
//! agent parses its replies for tool calls written in a small marker
//! protocol, runs them through the sandbox, feeds the results back, and stops
//! when the model answers without calling a tool.
//!
//! # Modules
//!
//! - [`agent`] - Conversation state, tool-call parser and orchestration loop
//! - [`tools`] - Tool registry, invoker, path sandbox and the built-in tools
//! - [`llm`] - Chat model trait with Ollama and OpenAI-compatible backends
//! - [`config`] - Configuration types and loading
//! - [`repl`] - Interactive and one-shot terminal front end
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod repl;
pub mod tools;
