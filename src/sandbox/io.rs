//! Output capture for the sandboxed `console`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Which buffer a console line is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// `console.log`, `console.info`, `console.debug`.
    Stdout,
    /// `console.error`, `console.warn`.
    Stderr,
}

#[derive(Debug, Default)]
struct Buffers {
    stdout: Vec<String>,
    stderr: Vec<String>,
}

/// Line buffers fed by the sandboxed console.
///
/// Cloning yields another handle to the same buffers, which is how the
/// console closures on the engine worker write into a runtime's capture.
#[derive(Clone, Debug, Default)]
pub struct OutputCapture {
    buffers: Arc<Mutex<Buffers>>,
}

impl OutputCapture {
    /// Create a new, empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buffers> {
        // A panicking writer cannot leave the line vectors half-written.
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every captured line.
    pub fn reset(&self) {
        let mut buffers = self.lock();
        buffers.stdout.clear();
        buffers.stderr.clear();
    }

    /// Append one line to a stream.
    pub fn push(&self, stream: Stream, line: impl Into<String>) {
        let mut buffers = self.lock();
        match stream {
            Stream::Stdout => buffers.stdout.push(line.into()),
            Stream::Stderr => buffers.stderr.push(line.into()),
        }
    }

    /// Snapshot of the stdout lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.lock().stdout.clone()
    }

    /// Snapshot of the stderr lines.
    pub fn stderr_lines(&self) -> Vec<String> {
        self.lock().stderr.clone()
    }

    /// Stdout lines joined with `\n`.
    pub fn stdout(&self) -> String {
        self.lock().stdout.join("\n")
    }

    /// Stderr lines joined with `\n`.
    pub fn stderr(&self) -> String {
        self.lock().stderr.join("\n")
    }

    /// Check if neither stream holds a line.
    pub fn is_empty(&self) -> bool {
        let buffers = self.lock();
        buffers.stdout.is_empty() && buffers.stderr.is_empty()
    }
}
