//! # ferry-mcp
//!
//! MCP session layer. Each backend is reachable through one [`McpSession`]:
//! the docs server is spawned as a child process and spoken to over its
//! stdio pipes, the chat server is reached over a server-sent-events
//! endpoint. Both expose the same "invoke named tool" surface.

pub mod session;
pub mod transport;

pub use session::McpSession;
pub use transport::{SseConfig, StdioConfig, TransportConfig};
