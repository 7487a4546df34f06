//! Script execution with timeout, output cap and retry.
//!
//! Every call to [`Executor::execute`] runs the script in a fresh interpreter
//! process. Failed attempts are retried with a fixed exponential backoff
//! (`base_delay * 2^attempt`, no jitter) until `max_retries` is reached.
//!
//! # Retry state machine
//!
//! ```text
//!              ┌──────────── ok ───────────▶ Succeeded
//!              │
//! Attempting(n)┼── transient, n < max ──▶ Waiting(n, delay) ──▶ Attempting(n + 1)
//!              │
//!              └── permanent, or n == max ─▶ Failed
//! ```
//!
//! The delay is awaited through a [`Sleeper`], so tests can drive the machine
//! without real time passing.

pub mod error;
pub mod probe;
pub mod runner;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use error::{ExecutionError, ExecutionResult, RunError};
pub use probe::{AlwaysAvailable, AvailabilityProbe, ScriptProbe};
pub use runner::{OsascriptRunner, ScriptOutput, ScriptRunner};

use crate::config::ExecutorConfig;
use crate::script::ScriptText;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Timer used for backoff delays.
pub trait Sleeper: Send + Sync {
    /// Completes after `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Retry limits and backoff timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from the executor settings.
    #[must_use]
    pub const fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Delay to wait after failed attempt `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Next state after attempt `attempt` failed with `error`.
    #[must_use]
    pub fn after_failure(&self, attempt: u32, error: RunError) -> RetryState {
        if !error.is_transient() {
            return RetryState::Failed(ExecutionError::Permanent { source: error });
        }
        if attempt >= self.max_retries {
            return RetryState::Failed(ExecutionError::Exhausted {
                attempts: attempt + 1,
                source: error,
            });
        }
        RetryState::Waiting {
            attempt,
            delay: self.delay_for(attempt),
        }
    }
}

/// A state of one execution.
#[derive(Debug)]
pub enum RetryState {
    /// Running attempt `n` (zero-based).
    Attempting(u32),
    /// Attempt `attempt` failed; waiting before the next one.
    Waiting {
        /// The attempt that failed.
        attempt: u32,
        /// Backoff delay.
        delay: Duration,
    },
    /// The script succeeded with this trimmed stdout.
    Succeeded(String),
    /// No further attempts will be made.
    Failed(ExecutionError),
}

/// Runs scripts with retry.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn ScriptRunner>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor.
    #[must_use]
    pub fn new(
        runner: Arc<dyn ScriptRunner>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            runner,
            sleeper,
            policy,
        }
    }

    /// Creates an `osascript` executor with real-time backoff.
    #[must_use]
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            Arc::new(OsascriptRunner::from_config(config)),
            Arc::new(TokioSleeper),
            RetryPolicy::from_config(config),
        )
    }

    /// Returns the underlying runner.
    #[must_use]
    pub fn runner(&self) -> Arc<dyn ScriptRunner> {
        Arc::clone(&self.runner)
    }

    /// Runs `script` and returns its trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Permanent`] for failures that retrying cannot
    /// fix, and [`ExecutionError::Exhausted`] once all retries have failed.
    pub async fn execute(&self, script: &ScriptText) -> ExecutionResult<String> {
        let mut state = RetryState::Attempting(0);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    debug!(attempt = attempt + 1, script = %script, "Running script");
                    match self.attempt(script).await {
                        Ok(stdout) => RetryState::Succeeded(stdout),
                        Err(e) => {
                            warn!(attempt = attempt + 1, error = %e, "Script attempt failed");
                            self.policy.after_failure(attempt, e)
                        }
                    }
                }
                RetryState::Waiting { attempt, delay } => {
                    info!(
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Retrying script after backoff"
                    );
                    self.sleeper.sleep(delay).await;
                    RetryState::Attempting(attempt + 1)
                }
                RetryState::Succeeded(stdout) => return Ok(stdout),
                RetryState::Failed(e) => {
                    error!(error = %e, "Script execution failed");
                    return Err(e);
                }
            };
        }
    }

    async fn attempt(&self, script: &ScriptText) -> Result<String, RunError> {
        let output = self.runner.run(script).await?.into_result()?;

        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            warn!(stderr = %stderr, "Script wrote to stderr");
        }

        Ok(output.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn delay_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(200),
            Duration::from_secs(u64::from(u32::MAX))
        );
    }

    #[test]
    fn transitions() {
        let policy = RetryPolicy::default();
        let transient = || RunError::Timeout { timeout_ms: 10 };

        assert!(matches!(
            policy.after_failure(0, transient()),
            RetryState::Waiting { attempt: 0, delay } if delay == Duration::from_secs(1)
        ));
        assert!(matches!(
            policy.after_failure(3, transient()),
            RetryState::Failed(ExecutionError::Exhausted { attempts: 4, .. })
        ));
        assert!(matches!(
            policy.after_failure(
                0,
                RunError::Failed {
                    code: 1,
                    stderr: "syntax error".to_string()
                }
            ),
            RetryState::Failed(ExecutionError::Permanent { .. })
        ));
    }
}
