//! # Output Streams
//!
//! Commands never print directly: they write to the [`Output`] carried in
//! [`Streams`]. The binary wires stdout/stderr; tests wire a
//! [`SharedBuffer`] and read back exactly what a command printed.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// A cloneable, thread-safe writer handle.
#[derive(Clone)]
pub struct Output {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    /// Wrap any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Process standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Process standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write one line and flush.
    pub fn line(&self, line: impl fmt::Display) -> io::Result<()> {
        let mut writer = self.inner.lock();
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// The streams a command writes to.
#[derive(Debug, Clone)]
pub struct Streams {
    /// Command results.
    pub out: Output,
    /// Diagnostics that must not mix with results.
    pub err: Output,
}

impl Streams {
    /// Standard process streams.
    pub fn stdio() -> Self {
        Self {
            out: Output::stdout(),
            err: Output::stderr(),
        }
    }
}

impl Default for Streams {
    fn default() -> Self {
        Self::stdio()
    }
}

/// In-memory writer whose contents can be read back through any clone.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
