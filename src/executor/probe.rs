//! Target application availability checks.

use std::sync::Arc;

use tracing::debug;

use super::runner::ScriptRunner;
use super::BoxFuture;
use crate::script::{quote, ScriptText};

/// Answers whether the target application can receive scripts.
pub trait AvailabilityProbe: Send + Sync {
    /// Returns `true` if the application is available.
    fn is_available(&self) -> BoxFuture<'_, bool>;
}

/// Probe that always reports the application as available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl AvailabilityProbe for AlwaysAvailable {
    fn is_available(&self) -> BoxFuture<'_, bool> {
        Box::pin(async { true })
    }
}

/// Probe that asks the interpreter `application "<name>" is running`.
///
/// Runs a single attempt with no retry; any failure counts as unavailable.
pub struct ScriptProbe {
    runner: Arc<dyn ScriptRunner>,
    script: ScriptText,
}

impl ScriptProbe {
    /// Creates a probe for `application`.
    #[must_use]
    pub fn new(runner: Arc<dyn ScriptRunner>, application: &str) -> Self {
        Self {
            runner,
            script: probe_script(application),
        }
    }
}

/// The script used to probe `application`.
#[must_use]
pub fn probe_script(application: &str) -> ScriptText {
    ScriptText::raw(format!("application {} is running", quote(application)))
}

impl AvailabilityProbe for ScriptProbe {
    fn is_available(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            match self.runner.run(&self.script).await {
                Ok(output) if output.succeeded() => output.stdout.trim() == "true",
                Ok(output) => {
                    debug!(stderr = %output.stderr.trim(), "Availability probe failed");
                    false
                }
                Err(e) => {
                    debug!(error = %e, "Availability probe failed");
                    false
                }
            }
        })
    }
}
