/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests one line at a time
/// 2. Dispatches them by method name to the handlers below
/// 3. Writes JSON-RPC responses back, one line each
///
/// Requests are handled strictly one after another. A `tools/call` that
/// waits on a Redash job holds the loop until the job finishes.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::mcp::transport::LineTransport;
use crate::tools::ToolHandler;
use crate::ServerError;

/// Per-connection session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
}

/// MCP server that handles communication with the client
pub struct McpServer<T> {
    /// The tool set served to the client
    tools: T,
    session: SessionState,
}

impl<T: ToolHandler> McpServer<T> {
    /// Create a new MCP server
    pub fn new(tools: T) -> Self {
        Self {
            tools,
            session: SessionState::Uninitialized,
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve one session over any line-oriented byte stream
    ///
    /// Returns `Ok(())` when the input reaches end of stream.
    pub async fn serve<R, W>(&mut self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        let mut transport = LineTransport::new(reader, writer);

        while let Some(line) = transport.read_message().await? {
            let Some(response) = self.handle_message(&line).await else {
                continue;
            };

            let encoded = match serde_json::to_string(&response) {
                Ok(encoded) => encoded,
                Err(e) => {
                    error!("Failed to encode response, dropping it: {}", e);
                    continue;
                }
            };

            transport.write_message(encoded.as_bytes()).await?;
            debug!("Sent response: {}", encoded);
        }

        info!("MCP server shutting down (input closed)");
        Ok(())
    }

    /// Process a single framed message
    ///
    /// Returns `None` for notifications, which never get a response, and
    /// when a result could not be encoded.
    pub async fn handle_message(&mut self, line: &[u8]) -> Option<JsonRpcResponse> {
        debug!("Received request: {}", String::from_utf8_lossy(line));

        let request = match decode_envelope(line) {
            Ok(request) => request,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::parse_error(e.to_string()));
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(request);
            return None;
        };

        self.handle_request(id, request).await
    }

    /// Handle a JSON-RPC request that expects a response
    ///
    /// `None` only when the result payload could not be encoded.
    async fn handle_request(&mut self, id: Value, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(method) = request.method.as_deref() else {
            return Some(JsonRpcResponse::invalid_request(id, "missing method".to_string()));
        };

        match method {
            "initialize" => self.handle_initialize(id, request.params),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            other => {
                warn!("Unknown method: {}", other);
                Some(JsonRpcResponse::method_not_found(id, other))
            }
        }
    }

    /// Handle a notification; nothing is ever sent back
    fn handle_notification(&mut self, request: JsonRpcRequest) {
        match request.method.as_deref() {
            Some("initialized") | Some("notifications/initialized") => {
                info!("Client initialized");
            }
            Some(method) => debug!("Ignoring notification: {}", method),
            None => warn!("Ignoring message without id or method"),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, id: Value, params: Option<Value>) -> Option<JsonRpcResponse> {
        let params: InitializeParams = match decode_params(params) {
            Ok(params) => params,
            Err(message) => return Some(JsonRpcResponse::invalid_params(id, message)),
        };

        match &params.client_info {
            Some(client) => info!(
                "Initialize from client: {} {} (protocol {})",
                client.name,
                client.version,
                params.protocol_version.as_deref().unwrap_or("unknown")
            ),
            None => info!("Initialize from unnamed client"),
        }

        if self.session == SessionState::Initialized {
            warn!("Client sent initialize again");
        }
        self.session = SessionState::Initialized;

        encode_result(id, InitializeResult::for_this_server())
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> Option<JsonRpcResponse> {
        self.warn_if_uninitialized("tools/list");

        encode_result(
            id,
            ListToolsResult {
                tools: self.tools.definitions(),
            },
        )
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> Option<JsonRpcResponse> {
        self.warn_if_uninitialized("tools/call");

        let params: ToolCallParams = match decode_params(params) {
            Ok(params) => params,
            Err(message) => return Some(JsonRpcResponse::invalid_params(id, message)),
        };

        let arguments = params.arguments.unwrap_or_default();
        debug!("Calling tool {} with args: {:?}", params.name, arguments);

        let result = self.tools.call(&params.name, arguments).await;
        encode_result(id, result)
    }

    fn warn_if_uninitialized(&self, method: &str) {
        if self.session == SessionState::Uninitialized {
            warn!("{} received before initialize", method);
        }
    }
}

/// Decode one line as a JSON-RPC envelope
///
/// The line must hold a JSON object; arrays and scalars are parse errors
/// even when their elements would line up with the envelope fields.
fn decode_envelope(line: &[u8]) -> Result<JsonRpcRequest, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_slice(line)?;
    serde_json::from_value(Value::Object(object))
}

/// Decode method params, reporting shape mismatches as a message
fn decode_params<P: DeserializeOwned>(params: Option<Value>) -> Result<P, String> {
    let params = params.ok_or_else(|| "Missing parameters".to_string())?;
    serde_json::from_value(params).map_err(|e| format!("Invalid parameters: {}", e))
}

/// Wrap a result payload in a success response
///
/// A payload that cannot be encoded is logged and the response dropped.
fn encode_result<S: serde::Serialize>(id: Value, result: S) -> Option<JsonRpcResponse> {
    match serde_json::to_value(result) {
        Ok(value) => Some(JsonRpcResponse::success(id, value)),
        Err(e) => {
            error!("Failed to encode result, dropping response: {}", e);
            None
        }
    }
}
