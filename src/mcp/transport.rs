//! stdio transport for MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! Input arrives in arbitrary chunks. [`LineFramer`] reassembles them: a line
//! is only handed out once its terminating `\n` has been read, and an
//! unterminated tail at EOF is never treated as a message.

use std::collections::VecDeque;
use std::io;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Size of a single read from the input stream.
const READ_CHUNK_BYTES: usize = 8192;

/// Accumulates input bytes and splits them into complete lines.
///
/// The buffer is bounded: a line longer than `max_line_bytes` is discarded up
/// to and including its newline.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_line_bytes: usize,
    discarding: bool,
}

impl LineFramer {
    /// Creates a framer accepting lines up to `max_line_bytes` long.
    #[must_use]
    pub const fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Appends `chunk` and drains every complete line.
    ///
    /// Trailing `\r` is stripped and blank lines are skipped. Invalid UTF-8 is
    /// replaced, which makes the line fail JSON parsing downstream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                self.buf.clear();
                continue;
            }

            self.buf.extend_from_slice(head);
            if self.buf.len() > self.max_line_bytes {
                warn!(
                    bytes = self.buf.len(),
                    limit = self.max_line_bytes,
                    "Dropping oversized message"
                );
                self.buf.clear();
                continue;
            }

            let mut line = std::mem::take(&mut self.buf);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let text = String::from_utf8_lossy(&line);
            if !text.trim().is_empty() {
                lines.push(text.into_owned());
            }
        }

        if !self.discarding {
            self.buf.extend_from_slice(rest);
            if self.buf.len() > self.max_line_bytes {
                warn!(
                    bytes = self.buf.len(),
                    limit = self.max_line_bytes,
                    "Dropping oversized message"
                );
                self.buf.clear();
                self.discarding = true;
            }
        }

        lines
    }

    /// Returns the number of buffered bytes of the incomplete line.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Discards the incomplete tail. Called at EOF.
    pub fn finish(&mut self) {
        if !self.buf.is_empty() {
            debug!(
                bytes = self.buf.len(),
                "Discarding unterminated input at end of stream"
            );
        }
        self.buf.clear();
        self.discarding = false;
    }
}

/// A newline-delimited JSON-RPC transport over any byte stream pair.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
    framer: LineFramer,
    ready: VecDeque<String>,
}

/// The transport over the process's stdin and stdout.
pub type StdioTransport = Transport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a transport over stdin/stdout.
    #[must_use]
    pub fn stdio(max_line_bytes: usize) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), max_line_bytes)
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over `reader` and `writer`.
    #[must_use]
    pub fn new(reader: R, writer: W, max_line_bytes: usize) -> Self {
        Self {
            reader,
            writer,
            framer: LineFramer::new(max_line_bytes),
            ready: VecDeque::new(),
        }
    }

    /// Returns the next complete line.
    ///
    /// Returns `None` once the input is closed (EOF). Cancel-safe: no input
    /// is lost if the future is dropped while waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the input fails.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK_BYTES];

        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }

            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                self.framer.finish();
                return Ok(None);
            }

            self.ready.extend(self.framer.push(&chunk[..n]));
        }
    }

    /// Serialises `message` and writes it as one line.
    ///
    /// The line and its newline go out in a single write so concurrent
    /// responses never interleave.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn send<T: Serialize + Sync>(&mut self, message: &T) -> io::Result<()> {
        let mut json = serde_json::to_vec(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !json.contains(&b'\n'),
            "JSON message must not contain embedded newlines"
        );

        json.push(b'\n');
        self.writer.write_all(&json).await?;
        self.writer.flush().await
    }

    /// Consumes the transport and returns the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
