/// Public library interface for the Redash MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::sync::Arc;
use thiserror::Error;

pub mod config;
pub mod mcp;
pub mod redash;
pub mod tools;

// Re-export public modules and types
pub use config::{ConfigError, PollConfig, RedashConfig};
pub use mcp::{McpServer, SessionState};
pub use redash::{JobPoller, RedashClient, RedashError};
pub use tools::{RedashTools, ToolError, ToolHandler};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Redash client error: {0}")]
    Redash(#[from] RedashError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main Redash server that implements the MCP protocol
///
/// Owns the authenticated Redash client and the tool set built on it.
pub struct RedashMcpServer {
    tools: RedashTools,
}

impl RedashMcpServer {
    /// Create a new server from validated configuration
    pub fn new(config: RedashConfig) -> Result<Self, ServerError> {
        config.validate()?;
        tracing::info!("Initializing Redash MCP server for {}", config.base_url);

        let client = RedashClient::new(Arc::new(config))?;

        Ok(Self {
            tools: RedashTools::new(client),
        })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method returns once stdin is closed or an IO error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut mcp_server = McpServer::new(self.tools);
        mcp_server.run().await
    }

    /// Get a reference to the tool set (useful for testing)
    pub fn tools(&self) -> &RedashTools {
        &self.tools
    }

    /// Turn this server into a dispatcher for custom streams
    pub fn into_mcp_server(self) -> McpServer<RedashTools> {
        McpServer::new(self.tools)
    }
}
