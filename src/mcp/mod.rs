/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication,
/// including line framing, JSON-RPC parsing and method dispatch.

pub mod protocol;
pub mod server;
pub mod transport;

// Re-export main types
pub use server::{McpServer, SessionState};
pub use transport::LineTransport;
