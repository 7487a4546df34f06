//! Single-attempt interpreter runs.

use std::pin::pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::error::RunError;
use super::BoxFuture;
use crate::config::ExecutorConfig;
use crate::script::ScriptText;

/// Output of one completed interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Raw stdout.
    pub stdout: String,
    /// Raw stderr.
    pub stderr: String,
    /// Exit code, -1 if terminated by a signal.
    pub exit_code: i32,
}

impl ScriptOutput {
    /// Creates a successful output with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Creates a failed output with the given stderr.
    #[must_use]
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Returns `true` if the interpreter exited with code 0.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts an unsuccessful exit into a [`RunError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the exit code is non-zero.
    pub fn into_result(self) -> Result<Self, RunError> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(RunError::Failed {
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs one script once.
///
/// Implementations must start a fresh process per call; nothing is pooled.
pub trait ScriptRunner: Send + Sync {
    /// Runs `script` and returns its output.
    fn run<'a>(&'a self, script: &'a ScriptText) -> BoxFuture<'a, Result<ScriptOutput, RunError>>;
}

/// Runs scripts through `osascript -e <script>`.
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    interpreter: String,
    script_flag: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl OsascriptRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(interpreter: impl Into<String>, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            interpreter: interpreter.into(),
            script_flag: "-e".to_string(),
            timeout,
            max_output_bytes,
        }
    }

    /// Sets the flag that precedes the script source (`-e` for `osascript`).
    #[must_use]
    pub fn with_script_flag(mut self, flag: impl Into<String>) -> Self {
        self.script_flag = flag.into();
        self
    }

    /// Creates a runner from the executor settings.
    #[must_use]
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            config.interpreter.clone(),
            Duration::from_millis(config.timeout_ms),
            config.max_output_bytes,
        )
        .with_script_flag(config.script_flag.clone())
    }

    async fn run_once(&self, script: &ScriptText) -> Result<ScriptOutput, RunError> {
        let mut child = Command::new(&self.interpreter)
            .arg(&self.script_flag)
            .arg(script.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output_bytes;

        let collect = async {
            let mut out_fut = pin!(read_capped(stdout, limit, true));
            let mut err_fut = pin!(read_capped(stderr, limit, false));
            let mut out = None;
            let mut err = None;

            while out.is_none() || err.is_none() {
                tokio::select! {
                    captured = &mut out_fut, if out.is_none() => {
                        let captured = captured?;
                        if captured.overflowed {
                            return Err(RunError::OutputLimit { limit });
                        }
                        out = Some(captured.bytes);
                    }
                    captured = &mut err_fut, if err.is_none() => {
                        err = Some(captured?.bytes);
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<_, RunError>(ScriptOutput {
                stdout: String::from_utf8_lossy(&out.unwrap_or_default()).into_owned(),
                stderr: String::from_utf8_lossy(&err.unwrap_or_default()).into_owned(),
                exit_code: status.code().unwrap_or(-1),
            })
        };

        // On timeout or overflow the child is dropped, and kill_on_drop
        // terminates it.
        match tokio::time::timeout(self.timeout, collect).await {
            Ok(result) => result,
            Err(_) => Err(RunError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl ScriptRunner for OsascriptRunner {
    fn run<'a>(&'a self, script: &'a ScriptText) -> BoxFuture<'a, Result<ScriptOutput, RunError>> {
        Box::pin(self.run_once(script))
    }
}

struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

/// Reads a pipe to EOF, keeping at most `limit` bytes.
///
/// With `stop_on_overflow` the read ends as soon as the cap is exceeded;
/// otherwise the rest of the pipe is drained and discarded so the child never
/// blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
    stop_on_overflow: bool,
) -> std::io::Result<Captured> {
    let mut captured = Captured {
        bytes: Vec::new(),
        overflowed: false,
    };
    let Some(mut reader) = reader else {
        return Ok(captured);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit - captured.bytes.len();
        captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
        if n > room {
            captured.overflowed = true;
            if stop_on_overflow {
                break;
            }
        }
    }

    Ok(captured)
}
