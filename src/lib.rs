//! app-automation-mcp: MCP server for scripting macOS desktop applications
//!
//! This library turns MCP tool calls into AppleScript, runs the scripts
//! through `osascript` and returns the results as JSON text.
//!
//! # Architecture
//!
//! - **Script synthesis**: typed templates fill argument slots with escaped,
//!   kind-checked AppleScript literals
//! - **Execution**: one interpreter process per attempt, with a timeout, an
//!   output cap and exponential-backoff retry
//! - **Dispatch**: newline-delimited JSON-RPC over stdio, tool calls running
//!   concurrently on a single-threaded runtime
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types
//! - [`executor`] — Script execution and retry
//! - [`mcp`] — MCP protocol implementation and tool catalog
//! - [`script`] — Value casting, escaping and script templates

pub mod config;
pub mod error;
pub mod executor;
pub mod mcp;
pub mod script;
