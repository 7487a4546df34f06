//! Integration tests for tool-to-script translation.
//!
//! Each test calls a tool through the [`ToolBox`] and checks the exact
//! AppleScript handed to the interpreter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use app_automation_mcp::executor::{
    AlwaysAvailable, BoxFuture, Executor, RetryPolicy, RunError, ScriptOutput, ScriptRunner,
    Sleeper,
};
use app_automation_mcp::mcp::{ToolBox, ToolError};
use app_automation_mcp::script::{ScriptText, SynthesisError};

struct Recorder {
    stdout: String,
    scripts: Mutex<Vec<String>>,
}

impl ScriptRunner for Recorder {
    fn run<'a>(&'a self, script: &'a ScriptText) -> BoxFuture<'a, Result<ScriptOutput, RunError>> {
        self.scripts.lock().unwrap().push(script.to_string());
        let out = ScriptOutput::success(self.stdout.clone());
        Box::pin(async move { Ok(out) })
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

fn toolbox(stdout: &str) -> (ToolBox, Arc<Recorder>) {
    let recorder = Arc::new(Recorder {
        stdout: stdout.to_string(),
        scripts: Mutex::new(Vec::new()),
    });
    let executor = Executor::new(recorder.clone(), Arc::new(NoSleep), RetryPolicy::default());
    (
        ToolBox::new("Finder", executor, Arc::new(AlwaysAvailable)),
        recorder,
    )
}

fn in_finder(body: &str) -> String {
    format!("tell application \"Finder\"\n{body}\nend tell")
}

/// Runs one tool and returns its result together with the single script run.
async fn run(tool: &str, args: Value, stdout: &str) -> (Value, String) {
    let (tools, recorder) = toolbox(stdout);
    let result = tools.dispatch(tool, &args).await.unwrap();
    let scripts = recorder.scripts.lock().unwrap().clone();
    assert_eq!(scripts.len(), 1, "expected exactly one script");
    (result, scripts[0].clone())
}

async fn rejected(tool: &str, args: Value) -> ToolError {
    let (tools, recorder) = toolbox("");
    let err = tools.dispatch(tool, &args).await.unwrap_err();
    assert!(recorder.scripts.lock().unwrap().is_empty());
    err
}

#[tokio::test]
async fn set_window_bounds_uses_rectangle_literal() {
    let (_, script) = run(
        "set_window_bounds",
        json!({ "window": "1", "bounds": "0,22,800,600" }),
        "",
    )
    .await;
    assert_eq!(script, in_finder("set bounds of window 1 to {0, 22, 800, 600}"));

    let (_, script) = run(
        "set_window_bounds",
        json!({ "window": "Downloads", "bounds": [10, 20, 30.5, 40] }),
        "",
    )
    .await;
    assert_eq!(
        script,
        in_finder("set bounds of window \"Downloads\" to {10, 20, 30.5, 40}")
    );
}

#[tokio::test]
async fn element_names_with_commas_stay_text() {
    let (_, script) = run(
        "set_property",
        json!({
            "class": "folder",
            "name": "Reports, 2024",
            "property": "comment",
            "value": "yes"
        }),
        "",
    )
    .await;
    assert_eq!(
        script,
        in_finder("set comment of folder \"Reports, 2024\" to true")
    );
}

#[tokio::test]
async fn set_property_value_is_inferred() {
    let (_, script) = run(
        "set_property",
        json!({ "class": "window", "name": 1, "property": "position", "value": "100, 200" }),
        "",
    )
    .await;
    assert_eq!(script, in_finder("set position of window 1 to {100,200}"));
}

#[tokio::test]
async fn make_element_with_and_without_properties() {
    let (result, script) = run(
        "make_element",
        json!({
            "class": "folder",
            "properties": { "name": "New \"stuff\"", "comment": "", "locked": "no" }
        }),
        "folder New of desktop",
    )
    .await;
    assert_eq!(
        script,
        in_finder("make new folder with properties {locked:false, name:\"New \\\"stuff\\\"\"}")
    );
    assert_eq!(result["created"], "folder New of desktop");

    let (_, script) = run(
        "make_element",
        json!({ "class": "folder", "properties": { "comment": "" } }),
        "",
    )
    .await;
    assert_eq!(script, in_finder("make new folder"));
}

#[tokio::test]
async fn notification_escapes_text_and_skips_empty_options() {
    let (_, script) = run(
        "display_notification",
        json!({ "message": "Line 1\nsaid \"done\"", "title": "Build", "subtitle": "" }),
        "",
    )
    .await;
    assert_eq!(
        script,
        "display notification \"Line 1\\nsaid \\\"done\\\"\" with title \"Build\""
    );
}

#[tokio::test]
async fn dialog_buttons_and_record_output() {
    let (result, script) = run(
        "display_dialog",
        json!({
            "text": "Continue?",
            "buttons": "Cancel, OK",
            "giving_up_after": "30"
        }),
        "button returned:OK, gave up:false",
    )
    .await;
    assert_eq!(
        script,
        "display dialog \"Continue?\" buttons {\"Cancel\", \"OK\"} giving up after 30"
    );
    assert_eq!(result["fields"]["button returned"], "OK");
    assert_eq!(result["fields"]["gave up"], "false");
}

#[tokio::test]
async fn dialog_buttons_need_a_label() {
    let err = rejected("display_dialog", json!({ "text": "Continue?", "buttons": "," })).await;
    assert!(matches!(
        err,
        ToolError::Synthesis(SynthesisError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn quit_with_saving_option() {
    let (_, script) = run("quit_application", json!({ "saving": "no" }), "").await;
    assert_eq!(script, in_finder("quit saving no"));

    let (_, script) = run("quit_application", json!({}), "").await;
    assert_eq!(script, in_finder("quit"));

    let (_, script) = run("quit_application", json!({ "saving": "" }), "").await;
    assert_eq!(script, in_finder("quit"));

    let err = rejected("quit_application", json!({ "saving": "maybe" })).await;
    assert!(matches!(
        err,
        ToolError::Synthesis(SynthesisError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn blank_tool_name_is_rejected() {
    for name in ["", "  "] {
        let err = rejected(name, json!({})).await;
        assert!(matches!(err, ToolError::MissingToolName), "name {name:?}");
    }
}

#[tokio::test]
async fn count_elements_parses_number() {
    let (result, script) = run("count_elements", json!({ "class": "window" }), "3").await;
    assert_eq!(script, in_finder("count every window"));
    assert_eq!(result["count"], json!(3));
    assert!(result["count"].is_u64());
}

#[tokio::test]
async fn class_names_cannot_inject_script() {
    let err = rejected(
        "count_elements",
        json!({ "class": "window\ndo shell script \"rm -rf ~\"" }),
    )
    .await;
    assert!(err.to_string().contains("class"));
}

#[tokio::test]
async fn open_item_quotes_path() {
    let (_, script) = run("open_item", json!({ "path": "/tmp/a \"b\".txt" }), "").await;
    assert_eq!(script, in_finder("open POSIX file \"/tmp/a \\\"b\\\".txt\""));
}

#[tokio::test]
async fn clipboard_round_trip_scripts() {
    let (_, script) = run("set_clipboard", json!({ "text": "a, b" }), "").await;
    assert_eq!(script, "set the clipboard to \"a, b\"");

    let (result, script) = run("get_clipboard", json!({}), "a, b").await;
    assert_eq!(script, "the clipboard as text");
    assert_eq!(result["text"], "a, b");
}

#[tokio::test]
async fn run_script_optionally_targets_application() {
    let (result, script) = run("run_script", json!({ "script": "return 1 + 1" }), "2").await;
    assert_eq!(script, "return 1 + 1");
    assert_eq!(result["output"], "2");

    let (_, script) = run(
        "run_script",
        json!({ "script": "get name", "in_application": true }),
        "",
    )
    .await;
    assert_eq!(script, in_finder("get name"));

    let err = rejected("run_script", json!({ "script": "   " })).await;
    assert_eq!(err.to_string(), "Missing required parameter: script");
}

#[tokio::test]
async fn non_object_arguments_are_rejected() {
    let err = rejected("list_windows", json!([1, 2])).await;
    assert!(matches!(err, ToolError::ArgumentsNotObject));
}
