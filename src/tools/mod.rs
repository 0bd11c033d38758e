/// MCP tools for Redash
///
/// This module contains the tools that external clients (like Claude)
/// can call through `tools/call`. Every failure is turned into a tool
/// result with `isError` set; nothing here produces a JSON-RPC error.

pub mod args;
pub mod metadata;
pub mod query;

pub use args::{ArgumentError, Arguments};
pub use metadata::*;
pub use query::*;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::mcp::protocol::{ToolCallResult, ToolDefinition};
use crate::redash::{RedashClient, RedashError};

/// Errors a tool can report back to the client
///
/// The `Display` output is the text the client sees.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Argument(#[from] ArgumentError),

    #[error("Failed to {action}: {source}")]
    Backend {
        action: &'static str,
        source: RedashError,
    },

    #[error("Failed to format result: {0}")]
    Format(#[source] serde_json::Error),
}

impl ToolError {
    fn backend(action: &'static str) -> impl FnOnce(RedashError) -> ToolError {
        move |source| ToolError::Backend { action, source }
    }
}

/// The tool surface seen by the MCP dispatcher
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Full, static set of tool descriptors
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run a tool; failures come back as `isError` results
    async fn call(&self, name: &str, arguments: Arguments) -> ToolCallResult;
}

/// Redash-backed tool set
pub struct RedashTools {
    client: RedashClient,
}

impl RedashTools {
    pub fn new(client: RedashClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RedashClient {
        &self.client
    }

    async fn dispatch(&self, name: &str, args: &Arguments) -> Result<String, ToolError> {
        match name {
            "execute_query" => execute_query(&self.client, args).await,
            "execute_adhoc_query" => execute_adhoc_query(&self.client, args).await,
            "get_query" => get_query(&self.client, args).await,
            "get_dashboard" => get_dashboard(&self.client, args).await,
            "get_alert" => get_alert(&self.client, args).await,
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[async_trait]
impl ToolHandler for RedashTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    async fn call(&self, name: &str, arguments: Arguments) -> ToolCallResult {
        info!(tool = name, "Calling tool");

        match self.dispatch(name, &arguments).await {
            Ok(text) => ToolCallResult::success(text),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}

/// Descriptors for every tool this server exposes
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "execute_query".to_string(),
            description: "Execute a saved Redash query by its ID and return the results".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query_id": {"type": "number", "description": "The ID of the query to execute"},
                    "parameters": {"type": "object", "description": "Optional parameters for the query (key-value pairs)"}
                },
                "required": ["query_id"]
            }),
        },
        ToolDefinition {
            name: "execute_adhoc_query".to_string(),
            description: "Execute an ad-hoc SQL query directly against a Redash data source".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The SQL query to execute"},
                    "data_source_id": {"type": "number", "description": "The ID of the data source to use"}
                },
                "required": ["query", "data_source_id"]
            }),
        },
        ToolDefinition {
            name: "get_query".to_string(),
            description: "Get a saved Redash query's metadata and SQL".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query_id": {"type": "number", "description": "The ID of the query"}
                },
                "required": ["query_id"]
            }),
        },
        ToolDefinition {
            name: "get_dashboard".to_string(),
            description: "Get a Redash dashboard with its widgets and the queries behind them".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "dashboard_id": {"type": "number", "description": "The ID of the dashboard"}
                },
                "required": ["dashboard_id"]
            }),
        },
        ToolDefinition {
            name: "get_alert".to_string(),
            description: "Get a Redash alert's state, options and query".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "alert_id": {"type": "number", "description": "The ID of the alert"}
                },
                "required": ["alert_id"]
            }),
        },
    ]
}
