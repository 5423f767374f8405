//! Tool system
//!
//! Tools give the model filesystem access, a restricted shell and downloads.
//! Every path argument is resolved through the [`Sandbox`] held by the
//! [`ToolContext`]; tools cannot escape the sandbox root, and the optional
//! extra directory is only ever read.

mod context;
mod error;
mod invoker;
mod params;
mod registry;
mod sandbox;
mod schema;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use invoker::{Invocation, ToolInvoker};
pub use params::{ParamValue, ToolParams};
pub use registry::ToolRegistry;
pub use sandbox::{ReadOnlyRoot, Sandbox};
pub use schema::{ParamKind, ParamSpec, ToolDescriptor};
pub use traits::{Tool, ToolResult};
