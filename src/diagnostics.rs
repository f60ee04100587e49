//! Reporting of non-fatal parse problems.
//!
//! The demultiplexer never prints. Every recoverable problem is handed to a
//! [`DiagnosticSink`]; the default sink forwards to `tracing`, tests and
//! embedding tools can collect diagnostics into a `Vec` instead.

use std::fmt;
use tracing::warn;

use crate::error::ParseError;

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A memory region record was dropped (bad header or counter value).
    MalformedRegion,
    /// A boundary-like line failed the grammar, or content had no active section.
    ProtocolDesync,
}

impl DiagnosticKind {
    pub fn of(error: &ParseError) -> Self {
        if error.is_region_scoped() {
            DiagnosticKind::MalformedRegion
        } else {
            DiagnosticKind::ProtocolDesync
        }
    }
}

/// A single problem together with the stream position it was seen at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub pid: Option<u32>,
    /// Active section, empty if none.
    pub section: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(error: &ParseError, pid: Option<u32>, section: &str) -> Self {
        Self {
            kind: DiagnosticKind::of(error),
            pid,
            section: section.to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) if !self.section.is_empty() => {
                write!(f, "/proc/{}/{}: {}", pid, self.section, self.message)
            }
            Some(pid) => write!(f, "/proc/{}: {}", pid, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Receiver for non-fatal diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Default sink: logs every diagnostic at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::MalformedRegion => warn!("Skipping memory region: {}", diagnostic),
            DiagnosticKind::ProtocolDesync => warn!("Discarding line: {}", diagnostic),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_error() {
        let e = ParseError::MalformedHeader("bad".into());
        assert_eq!(DiagnosticKind::of(&e), DiagnosticKind::MalformedRegion);

        let e = ParseError::ProtocolDesync("==> ?".into());
        assert_eq!(DiagnosticKind::of(&e), DiagnosticKind::ProtocolDesync);
    }

    #[test]
    fn test_display_with_context() {
        let e = ParseError::MalformedHeader("bad".into());
        let d = Diagnostic::new(&e, Some(42), "smaps");
        assert!(d.to_string().starts_with("/proc/42/smaps: "));

        let d = Diagnostic::new(&e, None, "");
        assert_eq!(d.to_string(), e.to_string());
    }

    fn report_desync<S: DiagnosticSink>(mut sink: S) {
        sink.report(Diagnostic::new(
            &ParseError::ProtocolDesync("x".into()),
            None,
            "",
        ));
    }

    #[test]
    fn test_vec_sink_collects_through_reference() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        report_desync(&mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].kind, DiagnosticKind::ProtocolDesync);
    }
}
