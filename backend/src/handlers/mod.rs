//! Tool handlers: argument decoding, the registry, dispatch and the HTTP surface

pub mod args;
pub mod dispatch;
pub mod health;
pub mod registry;
pub mod tools;

pub use dispatch::dispatch;
pub use health::{health_check, root};
pub use registry::{tool_definitions, ToolDefinition};
pub use tools::{call_tool, list_tools};
