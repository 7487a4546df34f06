//! MCP server implementation for desktop application automation.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: On signal, or once input closes and in-flight calls finish
//!
//! Tool calls run as independent tasks in a [`JoinSet`], so a slow script
//! does not hold up other requests. Responses are written by the dispatcher
//! loop only, in completion order.

use std::future::Future;
use std::io;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::executor::{AlwaysAvailable, AvailabilityProbe, Executor, ScriptProbe};
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, OutgoingMessage, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools::{definitions, ToolBox};
use crate::mcp::transport::{StdioTransport, Transport};

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // skip_serializing_if takes fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for tools/call request.
///
/// Malformed params still produce a tool result, so a missing or non-string
/// name is carried through and rejected by the tool box.
#[derive(Debug, Clone, Default)]
pub struct ToolCallParams {
    /// Name of the tool to call. Empty when the request has none.
    pub name: String,
    /// Arguments for the tool.
    pub arguments: Value,
}

impl ToolCallParams {
    /// Reads the params of a tools/call request.
    #[must_use]
    pub fn from_params(params: Option<&Value>) -> Self {
        let Some(params) = params else {
            return Self::default();
        };
        let name = match params.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            name,
            arguments: params.get("arguments").cloned().unwrap_or(Value::Null),
        }
    }
}

/// MCP server.
pub struct McpServer {
    tools: Arc<ToolBox>,
    initialized: bool,
}

impl McpServer {
    /// Creates a server around a tool box.
    #[must_use]
    pub fn new(tools: ToolBox) -> Self {
        Self {
            tools: Arc::new(tools),
            initialized: false,
        }
    }

    /// Creates a server that drives the configured application through
    /// `osascript`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let executor = Executor::from_config(&config.executor);
        let probe: Arc<dyn AvailabilityProbe> = if config.application.probe {
            Arc::new(ScriptProbe::new(executor.runner(), &config.application.name))
        } else {
            Arc::new(AlwaysAvailable)
        };

        Self::new(ToolBox::new(&config.application.name, executor, probe))
    }

    /// Returns whether the client has sent the `initialized` notification.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serves stdin/stdout until SIGINT/SIGTERM (Ctrl+C on Windows) or EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if signal handlers cannot be installed or transport
    /// I/O fails.
    pub async fn run(&mut self, max_line_bytes: usize) -> io::Result<()> {
        let shutdown = shutdown_signal()?;
        let mut transport = StdioTransport::stdio(max_line_bytes);
        self.serve_until(&mut transport, shutdown).await
    }

    /// Serves `transport` until `shutdown` completes or input closes.
    ///
    /// At EOF every in-flight tool call is still answered before returning.
    /// On shutdown in-flight calls are abandoned.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the transport fails.
    pub async fn serve_until<R, W, F>(
        &mut self,
        transport: &mut Transport<R, W>,
        shutdown: F,
    ) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut calls: JoinSet<OutgoingMessage> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    if !calls.is_empty() {
                        warn!(pending = calls.len(), "Shutting down with tool calls in flight");
                    }
                    calls.abort_all();
                    return Ok(());
                }

                Some(joined) = calls.join_next(), if !calls.is_empty() => {
                    if let Some(message) = finished_call(joined) {
                        transport.send(&message).await?;
                    }
                }

                line = transport.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    if let Some(message) = self.handle_line(&line, &mut calls) {
                        transport.send(&message).await?;
                    }
                }
            }
        }

        debug!(pending = calls.len(), "Input closed, finishing in-flight tool calls");
        while let Some(joined) = calls.join_next().await {
            if let Some(message) = finished_call(joined) {
                transport.send(&message).await?;
            }
        }

        Ok(())
    }

    /// Handles a single line of input.
    ///
    /// Returns the immediate reply, if any. Tool calls are spawned onto
    /// `calls` and answered when they finish.
    fn handle_line(
        &mut self,
        line: &str,
        calls: &mut JoinSet<OutgoingMessage>,
    ) -> Option<OutgoingMessage> {
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req, calls),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                None
            }
            Err(error) if error.id.is_some() => {
                warn!(id = ?error.id, "Rejecting invalid request");
                Some(error.into())
            }
            Err(error) => {
                warn!(error = %error.error.message, "Dropping unparseable message");
                None
            }
        }
    }

    /// Handles an incoming request.
    fn handle_request(
        &mut self,
        req: JsonRpcRequest,
        calls: &mut JoinSet<OutgoingMessage>,
    ) -> Option<OutgoingMessage> {
        debug!(id = %req.id, method = %req.method, "Received request");

        let reply: OutgoingMessage = match req.method.as_str() {
            "initialize" => Self::handle_initialize(&req).into(),
            "tools/list" => self.handle_tools_list(&req).into(),
            "tools/call" => {
                self.warn_if_uninitialized(&req.method);
                let params = ToolCallParams::from_params(req.params.as_ref());
                self.spawn_tool_call(req.id, params, calls);
                return None;
            }
            "ping" => JsonRpcResponse::success(req.id, json!({})).into(),
            _ => {
                warn!(method = %req.method, "Unknown method");
                JsonRpcError::method_not_found(req.id, &req.method).into()
            }
        };

        Some(reply)
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "initialized" | "notifications/initialized" => {
                info!("Client initialised");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                debug!("Ignoring cancellation; in-flight scripts run to completion");
            }
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
        let client = req
            .params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client = %client, "Initialising session");

        JsonRpcResponse::success(
            req.id.clone(),
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": ServerCapabilities::default(),
                "serverInfo": ServerInfo::default(),
            }),
        )
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        self.warn_if_uninitialized(&req.method);
        JsonRpcResponse::success(req.id.clone(), json!({ "tools": definitions() }))
    }

    /// Spawns a tool call onto `calls`.
    fn spawn_tool_call(
        &self,
        id: RequestId,
        params: ToolCallParams,
        calls: &mut JoinSet<OutgoingMessage>,
    ) {
        let tools = Arc::clone(&self.tools);
        debug!(id = %id, tool = %params.name, "Dispatching tool call");

        calls.spawn(async move {
            let result = tools.call(&params.name, &params.arguments).await;
            let message: OutgoingMessage = match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value).into(),
                Err(e) => JsonRpcError::internal_error(id, e.to_string()).into(),
            };
            message
        });
    }

    fn warn_if_uninitialized(&self, method: &str) {
        if !self.initialized {
            warn!(method = %method, "Request received before initialisation completed");
        }
    }
}

fn finished_call(joined: Result<OutgoingMessage, JoinError>) -> Option<OutgoingMessage> {
    match joined {
        Ok(message) => Some(message),
        Err(e) => {
            error!(error = %e, "Tool call task was lost");
            None
        }
    }
}

/// Completes on SIGINT or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    })
}

/// Completes on Ctrl+C.
#[cfg(windows)]
#[allow(clippy::unnecessary_wraps)] // matches the unix signature
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    })
}
