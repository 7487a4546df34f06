//! Integration tests for script execution retry.
//!
//! A recording sleeper captures every backoff delay, so the schedule can be
//! checked exactly without real time passing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_automation_mcp::executor::{
    BoxFuture, ExecutionError, Executor, RetryPolicy, RunError, ScriptOutput, ScriptRunner,
    Sleeper,
};
use app_automation_mcp::script::ScriptText;

/// Replays a fixed sequence of outputs, then keeps failing.
struct Replay {
    outputs: Mutex<VecDeque<ScriptOutput>>,
    attempts: Mutex<u32>,
}

impl Replay {
    fn new(outputs: Vec<ScriptOutput>) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.into()),
            attempts: Mutex::new(0),
        })
    }

    fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

impl ScriptRunner for Replay {
    fn run<'a>(&'a self, _: &'a ScriptText) -> BoxFuture<'a, Result<ScriptOutput, RunError>> {
        *self.attempts.lock().unwrap() += 1;
        let out = self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptOutput::failure(1, "Connection is invalid. (-609)"));
        Box::pin(async move { Ok(out) })
    }
}

#[derive(Default)]
struct Recording {
    delays: Mutex<Vec<Duration>>,
}

impl Sleeper for Recording {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.delays.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

fn executor(runner: Arc<Replay>, sleeper: Arc<Recording>) -> Executor {
    Executor::new(runner, sleeper, RetryPolicy::default())
}

fn script() -> ScriptText {
    ScriptText::raw("get name of every window")
}

#[tokio::test]
async fn always_failing_script_backs_off_1_2_4_then_fails() {
    let runner = Replay::new(Vec::new());
    let sleeper = Arc::new(Recording::default());

    let err = executor(runner.clone(), sleeper.clone())
        .execute(&script())
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 4);
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
    assert!(matches!(err, ExecutionError::Exhausted { attempts: 4, .. }));
    assert!(err
        .to_string()
        .starts_with("Script execution failed after 4 attempts"));
    assert!(err.to_string().contains("(-609)"));
}

#[tokio::test]
async fn success_after_two_failures_stops_retrying() {
    let runner = Replay::new(vec![
        ScriptOutput::failure(1, "Connection is invalid. (-609)"),
        ScriptOutput::failure(1, "Application isn't running. (-600)"),
        ScriptOutput::success("Documents\n"),
    ]);
    let sleeper = Arc::new(Recording::default());

    let out = executor(runner.clone(), sleeper.clone())
        .execute(&script())
        .await
        .unwrap();

    assert_eq!(out, "Documents");
    assert_eq!(runner.attempts(), 3);
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn first_attempt_success_never_sleeps() {
    let runner = Replay::new(vec![ScriptOutput::success("true")]);
    let sleeper = Arc::new(Recording::default());

    let out = executor(runner.clone(), sleeper.clone())
        .execute(&script())
        .await
        .unwrap();

    assert_eq!(out, "true");
    assert_eq!(runner.attempts(), 1);
    assert!(sleeper.delays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn syntax_error_is_not_retried() {
    let runner = Replay::new(vec![ScriptOutput::failure(
        1,
        "2:5: syntax error: Expected end of line but found identifier. (-2741)",
    )]);
    let sleeper = Arc::new(Recording::default());

    let err = executor(runner.clone(), sleeper.clone())
        .execute(&script())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Permanent { .. }));
    assert_eq!(runner.attempts(), 1);
    assert!(sleeper.delays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn custom_policy_scales_backoff() {
    let runner = Replay::new(Vec::new());
    let sleeper = Arc::new(Recording::default());
    let policy = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(250),
    };

    let err = Executor::new(runner.clone(), sleeper.clone(), policy)
        .execute(&script())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Exhausted { attempts: 3, .. }));
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![Duration::from_millis(250), Duration::from_millis(500)]
    );
}
