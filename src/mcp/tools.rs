//! Tool catalog and handlers.
//!
//! Each tool is a thin handler: it validates its arguments, fills a
//! [`ScriptTemplate`], runs the script through the [`Executor`] and shapes the
//! interpreter output into a JSON payload.
//!
//! Handlers return a [`ToolOutcome`]. The wire envelope
//! (`{success, ...}` / `{success: false, error, tool, args}`) is produced only
//! by [`ToolCallResult::from_outcome`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::executor::{AvailabilityProbe, ExecutionError, Executor};
use crate::mcp::protocol::{MCP_PROTOCOL_VERSION, SERVER_NAME};
use crate::script::cast::is_numeric;
use crate::script::{
    cast_str, tell_application, ParamKind, ScriptTemplate, ScriptText, SynthesisError,
};

/// Message returned when the target application cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str = "Application is not available or not running";

/// A failed tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The call named no tool.
    #[error("Missing required parameter: name")]
    MissingToolName,

    /// The tool name is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments were not a JSON object.
    #[error("Invalid arguments: expected an object")]
    ArgumentsNotObject,

    /// An argument failed validation.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// The script could not be executed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The target application is not running.
    #[error("{UNAVAILABLE_MESSAGE}")]
    Unavailable,
}

/// Result of a tool handler.
pub type ToolOutcome = Result<Value, ToolError>;

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call as sent on the wire.
///
/// Logical failures are encoded in the payload's `success` field; the
/// envelope itself is always a normal result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Creates a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// Encodes a handler outcome.
    #[must_use]
    pub fn from_outcome(tool: &str, arguments: &Value, outcome: ToolOutcome) -> Self {
        Self::text(payload(tool, arguments, outcome).to_string())
    }
}

/// Builds the JSON payload carried in a tool result.
#[must_use]
pub fn payload(tool: &str, arguments: &Value, outcome: ToolOutcome) -> Value {
    match outcome {
        Ok(Value::Object(mut fields)) => {
            fields.insert("success".to_string(), Value::Bool(true));
            Value::Object(fields)
        }
        Ok(other) => json!({ "success": true, "result": other }),
        Err(e) => json!({
            "success": false,
            "error": e.to_string(),
            "tool": tool,
            "args": arguments,
        }),
    }
}

/// Every tool in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetServerInfo,
    CheckApplication,
    ActivateApplication,
    QuitApplication,
    ListWindows,
    SetWindowBounds,
    CountElements,
    GetProperty,
    SetProperty,
    MakeElement,
    DeleteElement,
    OpenItem,
    DisplayNotification,
    DisplayDialog,
    GetClipboard,
    SetClipboard,
    RunScript,
}

impl Tool {
    /// All tools, in catalog order.
    pub const ALL: [Self; 17] = [
        Self::GetServerInfo,
        Self::CheckApplication,
        Self::ActivateApplication,
        Self::QuitApplication,
        Self::ListWindows,
        Self::SetWindowBounds,
        Self::CountElements,
        Self::GetProperty,
        Self::SetProperty,
        Self::MakeElement,
        Self::DeleteElement,
        Self::OpenItem,
        Self::DisplayNotification,
        Self::DisplayDialog,
        Self::GetClipboard,
        Self::SetClipboard,
        Self::RunScript,
    ];

    /// Wire name of the tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetServerInfo => "get_server_info",
            Self::CheckApplication => "check_application",
            Self::ActivateApplication => "activate_application",
            Self::QuitApplication => "quit_application",
            Self::ListWindows => "list_windows",
            Self::SetWindowBounds => "set_window_bounds",
            Self::CountElements => "count_elements",
            Self::GetProperty => "get_property",
            Self::SetProperty => "set_property",
            Self::MakeElement => "make_element",
            Self::DeleteElement => "delete_element",
            Self::OpenItem => "open_item",
            Self::DisplayNotification => "display_notification",
            Self::DisplayDialog => "display_dialog",
            Self::GetClipboard => "get_clipboard",
            Self::SetClipboard => "set_clipboard",
            Self::RunScript => "run_script",
        }
    }

    /// Looks up a tool by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Whether the availability probe must pass before the tool runs.
    #[must_use]
    pub const fn requires_application(self) -> bool {
        !matches!(
            self,
            Self::GetServerInfo
                | Self::CheckApplication
                | Self::DisplayNotification
                | Self::DisplayDialog
                | Self::GetClipboard
                | Self::SetClipboard
                | Self::RunScript
        )
    }

    /// Schema entry for tools/list.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn definition(self) -> ToolDefinition {
        let (description, input_schema) = match self {
            Self::GetServerInfo => (
                "Return server name, version, protocol version and the target application.",
                json!({ "type": "object", "properties": {} }),
            ),
            Self::CheckApplication => (
                "Check whether the target application is running and can receive scripts.",
                json!({ "type": "object", "properties": {} }),
            ),
            Self::ActivateApplication => (
                "Bring the target application to the front.",
                json!({ "type": "object", "properties": {} }),
            ),
            Self::QuitApplication => (
                "Quit the target application.",
                json!({
                    "type": "object",
                    "properties": {
                        "saving": {
                            "type": "string",
                            "enum": ["yes", "no", "ask"],
                            "description": "Optional: whether to save open documents"
                        }
                    }
                }),
            ),
            Self::ListWindows => (
                "List the names of all windows of the target application.",
                json!({ "type": "object", "properties": {} }),
            ),
            Self::SetWindowBounds => (
                "Move and resize a window. Bounds are left, top, right, bottom in points.",
                json!({
                    "type": "object",
                    "properties": {
                        "window": {
                            "type": ["string", "integer"],
                            "description": "Window name or 1-based index"
                        },
                        "bounds": {
                            "type": ["string", "array"],
                            "items": { "type": "number" },
                            "description": "Four numbers, e.g. \"0,22,800,600\" or [0,22,800,600]"
                        }
                    },
                    "required": ["window", "bounds"]
                }),
            ),
            Self::CountElements => (
                "Count the elements of a class, e.g. \"window\" or \"document\".",
                json!({
                    "type": "object",
                    "properties": {
                        "class": {
                            "type": "string",
                            "description": "Element class name"
                        }
                    },
                    "required": ["class"]
                }),
            ),
            Self::GetProperty => (
                "Read a property of a named element.",
                json!({
                    "type": "object",
                    "properties": {
                        "class": { "type": "string", "description": "Element class name" },
                        "name": {
                            "type": ["string", "integer"],
                            "description": "Element name or 1-based index"
                        },
                        "property": { "type": "string", "description": "Property name" }
                    },
                    "required": ["class", "name", "property"]
                }),
            ),
            Self::SetProperty => (
                "Set a property of a named element. Values are converted to numbers, \
                 booleans, lists or dates where they look like one.",
                json!({
                    "type": "object",
                    "properties": {
                        "class": { "type": "string", "description": "Element class name" },
                        "name": {
                            "type": ["string", "integer"],
                            "description": "Element name or 1-based index"
                        },
                        "property": { "type": "string", "description": "Property name" },
                        "value": { "description": "New value" }
                    },
                    "required": ["class", "name", "property", "value"]
                }),
            ),
            Self::MakeElement => (
                "Create a new element, optionally with initial properties.",
                json!({
                    "type": "object",
                    "properties": {
                        "class": { "type": "string", "description": "Element class name" },
                        "properties": {
                            "type": "object",
                            "description": "Optional: property names and values"
                        }
                    },
                    "required": ["class"]
                }),
            ),
            Self::DeleteElement => (
                "Delete a named element.",
                json!({
                    "type": "object",
                    "properties": {
                        "class": { "type": "string", "description": "Element class name" },
                        "name": {
                            "type": ["string", "integer"],
                            "description": "Element name or 1-based index"
                        }
                    },
                    "required": ["class", "name"]
                }),
            ),
            Self::OpenItem => (
                "Open a file or folder with the target application.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "POSIX path" }
                    },
                    "required": ["path"]
                }),
            ),
            Self::DisplayNotification => (
                "Show a system notification.",
                json!({
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "title": { "type": "string", "description": "Optional title" },
                        "subtitle": { "type": "string", "description": "Optional subtitle" },
                        "sound": { "type": "string", "description": "Optional sound name" }
                    },
                    "required": ["message"]
                }),
            ),
            Self::DisplayDialog => (
                "Show a modal dialog and return the button pressed and any text entered.",
                json!({
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "default_answer": {
                            "type": "string",
                            "description": "Optional: show a text field with this initial value"
                        },
                        "buttons": {
                            "type": ["array", "string"],
                            "items": { "type": "string" },
                            "description": "Optional: button labels"
                        },
                        "giving_up_after": {
                            "type": "integer",
                            "description": "Optional: dismiss after this many seconds"
                        }
                    },
                    "required": ["text"]
                }),
            ),
            Self::GetClipboard => (
                "Return the clipboard contents as text.",
                json!({ "type": "object", "properties": {} }),
            ),
            Self::SetClipboard => (
                "Replace the clipboard contents with text.",
                json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            ),
            Self::RunScript => (
                "Run raw AppleScript source and return its result.",
                json!({
                    "type": "object",
                    "properties": {
                        "script": { "type": "string", "description": "AppleScript source" },
                        "in_application": {
                            "type": "boolean",
                            "description": "Optional: wrap the script in a tell block for the target application"
                        }
                    },
                    "required": ["script"]
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Returns the tools/list catalog.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    Tool::ALL.into_iter().map(Tool::definition).collect()
}

/// Executes tool calls against one target application.
#[derive(Clone)]
pub struct ToolBox {
    application: String,
    executor: Executor,
    probe: Arc<dyn AvailabilityProbe>,
}

impl ToolBox {
    /// Creates a tool box.
    #[must_use]
    pub fn new(
        application: impl Into<String>,
        executor: Executor,
        probe: Arc<dyn AvailabilityProbe>,
    ) -> Self {
        Self {
            application: application.into(),
            executor,
            probe,
        }
    }

    /// Runs tool `name` and encodes the outcome.
    pub async fn call(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let outcome = self.dispatch(name, arguments).await;
        match &outcome {
            Ok(_) => debug!(tool = %name, "Tool call succeeded"),
            Err(e) => info!(tool = %name, error = %e, "Tool call failed"),
        }
        ToolCallResult::from_outcome(name, arguments, outcome)
    }

    /// Resolves and runs a tool.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolOutcome {
        if name.trim().is_empty() {
            return Err(ToolError::MissingToolName);
        }
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ToolError::ArgumentsNotObject),
        };

        if tool.requires_application() && !self.probe.is_available().await {
            return Err(ToolError::Unavailable);
        }

        match tool {
            Tool::GetServerInfo => Ok(self.call_get_server_info()),
            Tool::CheckApplication => Ok(self.call_check_application().await),
            Tool::ActivateApplication => self.call_activate_application().await,
            Tool::QuitApplication => self.call_quit_application(args).await,
            Tool::ListWindows => self.call_list_windows().await,
            Tool::SetWindowBounds => self.call_set_window_bounds(args).await,
            Tool::CountElements => self.call_count_elements(args).await,
            Tool::GetProperty => self.call_get_property(args).await,
            Tool::SetProperty => self.call_set_property(args).await,
            Tool::MakeElement => self.call_make_element(args).await,
            Tool::DeleteElement => self.call_delete_element(args).await,
            Tool::OpenItem => self.call_open_item(args).await,
            Tool::DisplayNotification => self.call_display_notification(args).await,
            Tool::DisplayDialog => self.call_display_dialog(args).await,
            Tool::GetClipboard => self.call_get_clipboard().await,
            Tool::SetClipboard => self.call_set_clipboard(args).await,
            Tool::RunScript => self.call_run_script(args).await,
        }
    }

    async fn run(&self, script: &ScriptText) -> Result<String, ToolError> {
        Ok(self.executor.execute(script).await?)
    }

    async fn run_in_app(&self, body: &ScriptText) -> Result<String, ToolError> {
        self.run(&tell_application(&self.application, body)).await
    }

    // ==================== Tool Handlers ====================

    fn call_get_server_info(&self) -> Value {
        json!({
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "application": self.application,
            "tools": Tool::ALL.len(),
        })
    }

    async fn call_check_application(&self) -> Value {
        json!({
            "application": self.application,
            "available": self.probe.is_available().await,
        })
    }

    async fn call_activate_application(&self) -> ToolOutcome {
        self.run_in_app(&ScriptText::raw("activate")).await?;
        Ok(json!({ "application": self.application, "activated": true }))
    }

    async fn call_quit_application(&self, args: &Map<String, Value>) -> ToolOutcome {
        let saving = args
            .get("saving")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(saving) = saving {
            if !["yes", "no", "ask"].contains(&saving) {
                return Err(SynthesisError::InvalidArgument {
                    name: "saving".to_string(),
                    message: "expected one of: yes, no, ask".to_string(),
                }
                .into());
            }
        }

        let body = ScriptTemplate::new()
            .text("quit")
            .optional(" saving ", "saving", ParamKind::Identifier)
            .render(args)?;
        self.run_in_app(&body).await?;
        Ok(json!({ "application": self.application, "quit": true }))
    }

    async fn call_list_windows(&self) -> ToolOutcome {
        let output = self
            .run_in_app(&ScriptText::raw("get name of every window"))
            .await?;
        let windows = split_list_output(&output);
        Ok(json!({ "count": windows.len(), "windows": windows }))
    }

    async fn call_set_window_bounds(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("set bounds of window ")
            .slot("window", element_kind(args.get("window")))
            .text(" to ")
            .slot("bounds", ParamKind::Rectangle)
            .render(args)?;
        self.run_in_app(&body).await?;
        Ok(json!({ "window": args.get("window"), "bounds": args.get("bounds") }))
    }

    async fn call_count_elements(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("count every ")
            .slot("class", ParamKind::Identifier)
            .render(args)?;
        let output = self.run_in_app(&body).await?;
        Ok(json!({ "class": args.get("class"), "count": cast_str(&output).to_json() }))
    }

    async fn call_get_property(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("get ")
            .slot("property", ParamKind::Identifier)
            .text(" of ")
            .slot("class", ParamKind::Identifier)
            .text(" ")
            .slot("name", element_kind(args.get("name")))
            .render(args)?;
        let output = self.run_in_app(&body).await?;
        Ok(json!({ "property": args.get("property"), "value": output }))
    }

    async fn call_set_property(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("set ")
            .slot("property", ParamKind::Identifier)
            .text(" of ")
            .slot("class", ParamKind::Identifier)
            .text(" ")
            .slot("name", element_kind(args.get("name")))
            .text(" to ")
            .slot("value", ParamKind::Auto)
            .render(args)?;
        self.run_in_app(&body).await?;
        Ok(json!({ "property": args.get("property"), "updated": true }))
    }

    async fn call_make_element(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("make new ")
            .slot("class", ParamKind::Identifier)
            .properties(" with properties ", "properties")
            .render(args)?;
        let output = self.run_in_app(&body).await?;
        Ok(json!({ "created": output }))
    }

    async fn call_delete_element(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("delete ")
            .slot("class", ParamKind::Identifier)
            .text(" ")
            .slot("name", element_kind(args.get("name")))
            .render(args)?;
        self.run_in_app(&body).await?;
        Ok(json!({ "deleted": true }))
    }

    async fn call_open_item(&self, args: &Map<String, Value>) -> ToolOutcome {
        let body = ScriptTemplate::new()
            .text("open POSIX file ")
            .slot("path", ParamKind::Text)
            .render(args)?;
        self.run_in_app(&body).await?;
        Ok(json!({ "opened": args.get("path") }))
    }

    async fn call_display_notification(&self, args: &Map<String, Value>) -> ToolOutcome {
        let script = ScriptTemplate::new()
            .text("display notification ")
            .slot("message", ParamKind::Text)
            .optional(" with title ", "title", ParamKind::Text)
            .optional(" subtitle ", "subtitle", ParamKind::Text)
            .optional(" sound name ", "sound", ParamKind::Text)
            .render(args)?;
        self.run(&script).await?;
        Ok(json!({ "displayed": true }))
    }

    async fn call_display_dialog(&self, args: &Map<String, Value>) -> ToolOutcome {
        let script = ScriptTemplate::new()
            .text("display dialog ")
            .slot("text", ParamKind::Text)
            .optional(" default answer ", "default_answer", ParamKind::Text)
            .optional(" buttons ", "buttons", ParamKind::TextList)
            .optional(" giving up after ", "giving_up_after", ParamKind::Number)
            .render(args)?;
        let output = self.run(&script).await?;
        Ok(json!({ "fields": parse_record_output(&output), "raw": output }))
    }

    async fn call_get_clipboard(&self) -> ToolOutcome {
        let output = self.run(&ScriptText::raw("the clipboard as text")).await?;
        Ok(json!({ "text": output }))
    }

    async fn call_set_clipboard(&self, args: &Map<String, Value>) -> ToolOutcome {
        let script = ScriptTemplate::new()
            .text("set the clipboard to ")
            .slot("text", ParamKind::Text)
            .render(args)?;
        self.run(&script).await?;
        Ok(json!({ "copied": true }))
    }

    async fn call_run_script(&self, args: &Map<String, Value>) -> ToolOutcome {
        let source = args
            .get("script")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SynthesisError::MissingArgument {
                name: "script".to_string(),
            })?;
        let in_application = args
            .get("in_application")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let script = ScriptText::raw(source);
        let output = if in_application {
            self.run_in_app(&script).await?
        } else {
            self.run(&script).await?
        };
        Ok(json!({ "output": output }))
    }
}

/// Slot kind for an element reference: numbers are indexes, anything else a
/// quoted name.
fn element_kind(value: Option<&Value>) -> ParamKind {
    match value {
        Some(Value::Number(_)) => ParamKind::Number,
        Some(Value::String(s)) if is_numeric(s.trim()) => ParamKind::Number,
        _ => ParamKind::Text,
    }
}

/// Splits AppleScript list output (`a, b, c`) into items.
#[must_use]
pub fn split_list_output(output: &str) -> Vec<String> {
    if output.trim().is_empty() {
        return Vec::new();
    }
    output.split(", ").map(|s| s.trim().to_string()).collect()
}

/// Parses AppleScript record output (`button returned:OK, text returned:x`)
/// into a JSON object. Items without a `:` are ignored.
#[must_use]
pub fn parse_record_output(output: &str) -> Map<String, Value> {
    output
        .split(", ")
        .filter_map(|item| item.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.trim().to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definitions_valid() {
        let tools = definitions();
        assert_eq!(tools.len(), Tool::ALL.len());

        for tool in &tools {
            assert!(!tool.name.is_empty());
            assert!(!tool.description.is_empty());
            assert!(tool.input_schema.is_object());
            assert_eq!(tool.input_schema["type"], "object");
        }
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("format_disk"), None);
    }

    #[test]
    fn allow_list() {
        assert!(!Tool::GetServerInfo.requires_application());
        assert!(!Tool::DisplayNotification.requires_application());
        assert!(Tool::ListWindows.requires_application());
        assert!(Tool::MakeElement.requires_application());
    }

    #[test]
    fn definition_serialises_camel_case() {
        let json = serde_json::to_value(Tool::OpenItem.definition()).unwrap();
        assert!(json.get("inputSchema").is_some());
        assert_eq!(json["name"], "open_item");
    }

    #[test]
    fn success_payload() {
        let value = payload("list_windows", &json!({}), Ok(json!({ "count": 0 })));
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 0);

        let value = payload("x", &json!({}), Ok(json!("plain")));
        assert_eq!(value, json!({ "success": true, "result": "plain" }));
    }

    #[test]
    fn failure_payload() {
        let args = json!({ "a": 1 });
        let value = payload("nope", &args, Err(ToolError::UnknownTool("nope".to_string())));
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": "Unknown tool: nope",
                "tool": "nope",
                "args": { "a": 1 },
            })
        );
    }

    #[test]
    fn unavailable_message() {
        assert_eq!(ToolError::Unavailable.to_string(), UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn result_content_is_text() {
        let result = ToolCallResult::from_outcome("t", &Value::Null, Ok(json!({})));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        let text = json["content"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap()["success"], true);
    }

    #[test]
    fn list_output() {
        assert_eq!(split_list_output(""), Vec::<String>::new());
        assert_eq!(split_list_output("Documents"), vec!["Documents"]);
        assert_eq!(
            split_list_output("Documents, Downloads, Desktop"),
            vec!["Documents", "Downloads", "Desktop"]
        );
    }

    #[test]
    fn record_output() {
        let fields = parse_record_output("button returned:OK, text returned:hello");
        assert_eq!(fields["button returned"], "OK");
        assert_eq!(fields["text returned"], "hello");
        assert!(parse_record_output("").is_empty());
    }

    #[test]
    fn element_kinds() {
        assert_eq!(element_kind(Some(&json!(2))), ParamKind::Number);
        assert_eq!(element_kind(Some(&json!("3"))), ParamKind::Number);
        assert_eq!(element_kind(Some(&json!("Inbox, old"))), ParamKind::Text);
        assert_eq!(element_kind(None), ParamKind::Text);
    }
}
