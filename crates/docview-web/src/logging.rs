#![forbid(unsafe_code)]

//! `tracing` subscriber that writes formatted lines to a host sink.
//!
//! In the browser the sink is `console.log`; natively it can be anything
//! with the `fn(&str)` shape. Events are formatted by `tracing-subscriber`'s
//! `fmt` layer without timestamps (the host console stamps them) and are
//! flushed one line at a time.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Line sink.
pub type Sink = fn(&str);

/// Buffers bytes and hands complete lines to the sink.
#[derive(Debug)]
pub struct LineWriter {
    buf: Vec<u8>,
    sink: Sink,
}

impl LineWriter {
    #[must_use]
    pub const fn new(sink: Sink) -> Self {
        Self {
            buf: Vec::new(),
            sink,
        }
    }

    fn emit_complete_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            (self.sink)(text.trim_end_matches('\r'));
        }
    }
}

impl io::Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        self.emit_complete_lines();
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit_complete_lines();
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            (self.sink)(&String::from_utf8_lossy(&rest));
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

/// [`MakeWriter`] producing a fresh [`LineWriter`] per event.
#[derive(Debug, Clone, Copy)]
pub struct SinkMakeWriter {
    sink: Sink,
}

impl SinkMakeWriter {
    #[must_use]
    pub const fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl<'a> MakeWriter<'a> for SinkMakeWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::new(self.sink)
    }
}

/// Parse a level directive such as `info` or `docview_core=debug,warn`.
pub fn parse_filter(directive: &str) -> Result<EnvFilter, String> {
    let directive = directive.trim();
    let directive = if directive.is_empty() { "info" } else { directive };
    EnvFilter::try_new(directive).map_err(|err| format!("invalid log directive {directive:?}: {err}"))
}

/// Install the global subscriber. Fails if the directive is invalid or a
/// subscriber is already installed.
pub fn init(directive: &str, sink: Sink) -> Result<(), String> {
    let filter = parse_filter(directive)?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(SinkMakeWriter::new(sink))
        .with_ansi(false)
        .with_target(true)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| format!("logging already initialized: {err}"))
}
