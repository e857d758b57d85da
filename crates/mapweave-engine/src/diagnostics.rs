//! Per-request diagnostic collection

use mapweave_core::{Diagnostic, DiagnosticCode, Location, Severity};

/// Accumulates diagnostics in insertion order without deduplication.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    entries: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        location: Location,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(severity, code, location, message);
        tracing::trace!(%diagnostic, "recorded diagnostic");
        self.entries.push(diagnostic);
    }

    /// Record with the code's default severity.
    pub fn report(&mut self, code: DiagnosticCode, location: Location, message: impl Into<String>) {
        self.record(code.default_severity(), code, location, message);
    }

    /// Take every diagnostic recorded so far, oldest first.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}
