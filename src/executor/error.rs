//! Error types for script execution.

use std::io;

use thiserror::Error;

/// Result type for executor operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// A failure of a single interpreter run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The interpreter process could not be started.
    #[error("failed to start interpreter '{interpreter}': {source}")]
    Spawn {
        /// Interpreter command.
        interpreter: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The script did not finish within the timeout. The process is killed.
    #[error("script timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The script wrote more than the output cap to stdout.
    #[error("script output exceeded {limit} bytes")]
    OutputLimit {
        /// Output cap in bytes.
        limit: usize,
    },

    /// The interpreter exited unsuccessfully.
    #[error("script failed with exit code {code}: {stderr}")]
    Failed {
        /// Exit code, or -1 if the process was terminated by a signal.
        code: i32,
        /// Trimmed stderr of the interpreter.
        stderr: String,
    },

    /// Reading the process output failed.
    #[error("I/O error while running script: {0}")]
    Io(#[from] io::Error),
}

impl RunError {
    /// Returns `true` if running the same script again might succeed.
    ///
    /// A missing interpreter and a script the interpreter cannot compile fail
    /// the same way on every attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Spawn { .. } => false,
            Self::Failed { stderr, .. } => !is_syntax_error(stderr),
            Self::Timeout { .. } | Self::OutputLimit { .. } | Self::Io(_) => true,
        }
    }
}

/// Recognises AppleScript compile errors in interpreter stderr,
/// e.g. `2:5: syntax error: Expected end of line but found identifier. (-2741)`.
fn is_syntax_error(stderr: &str) -> bool {
    stderr.contains("syntax error") || stderr.contains("(-2740)") || stderr.contains("(-2741)")
}

/// A script that could not be executed.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Every attempt failed.
    #[error("Script execution failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: RunError,
    },

    /// The failure cannot be fixed by retrying.
    #[error("Script execution failed: {source}")]
    Permanent {
        /// Underlying failure.
        #[source]
        source: RunError,
    },
}
