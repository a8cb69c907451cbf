//! Tool façade over the narrator, served over MCP

pub mod definitions;
pub mod mcp;
pub mod router;

pub use definitions::{ToolDefinition, tool_definitions};
pub use router::{ToolOutput, ToolRouter};
