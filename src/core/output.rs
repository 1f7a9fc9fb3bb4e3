use crate::domain::error::JsonExtResult;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Output handler interface
///
/// Implementations turn a data dictionary into text. Writing the text is the
/// caller's job; see [`OutputSink`].
pub trait OutputHandler: Send + Sync {
    /// Label the handler is registered under
    fn label(&self) -> &str;

    /// Render `data` to text. `template` is part of the interface; handlers
    /// that have no use for it ignore it.
    fn render(&self, data: &Value, template: Option<&str>) -> JsonExtResult<String>;

    /// Whether rendered output must reach the real stream even while the
    /// sink is suppressed
    fn bypasses_suppression(&self) -> bool {
        false
    }
}

/// Plain-text form of a value: strings bare, everything else compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Destination for rendered and incidental output
///
/// A suppressed sink drops everything written through it until it is
/// restored. The underlying writers are never swapped out.
pub struct OutputSink {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    suppressed: bool,
}

impl OutputSink {
    pub fn new(stdout: Box<dyn Write + Send>, stderr: Box<dyn Write + Send>) -> Self {
        Self {
            stdout,
            stderr,
            suppressed: false,
        }
    }

    /// Sink over the process standard streams
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn suppress(&mut self) {
        if !self.suppressed {
            tracing::debug!("suppressing incidental output");
        }
        self.suppressed = true;
    }

    pub fn restore(&mut self) {
        if self.suppressed {
            tracing::debug!("restoring output streams");
        }
        self.suppressed = false;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn write_out(&mut self, text: &str) -> io::Result<()> {
        if self.suppressed {
            return Ok(());
        }
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()
    }

    pub fn write_err(&mut self, text: &str) -> io::Result<()> {
        if self.suppressed {
            return Ok(());
        }
        self.stderr.write_all(text.as_bytes())?;
        self.stderr.flush()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdio()
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("suppressed", &self.suppressed)
            .finish_non_exhaustive()
    }
}

/// In-memory writer whose contents stay readable after it is handed to a sink
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer lock poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
