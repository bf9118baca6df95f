use std::io::Write;

use tracing::{error, warn};

use crate::checker::Violation;

/// Receives the violation that made a verification fail.
pub trait DiagnosticSink {
    fn report(&mut self, violation: &Violation);
}

/// Emits violations as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, violation: &Violation) {
        error!(kind = %violation.kind(), "{violation}");
    }
}

/// Writes one line per violation to a byte stream such as stderr.
#[derive(Debug)]
pub struct StreamSink<W> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl StreamSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> DiagnosticSink for StreamSink<W> {
    fn report(&mut self, violation: &Violation) {
        if let Err(e) = writeln!(self.writer, "{violation}") {
            warn!("Failed to write diagnostic: {e}");
        }
    }
}

/// Collects violations, mostly useful in tests.
impl DiagnosticSink for Vec<Violation> {
    fn report(&mut self, violation: &Violation) {
        self.push(violation.clone());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, violation: &Violation) {
        (**self).report(violation);
    }
}
