//! Collected scan results
//!
//! A `Report` is the diagnostic sink the host hands to the scanner. It
//! applies per-code severity overrides as diagnostics arrive.

use serde::{Deserialize, Serialize};
use crate::config::SeverityThreshold;
use crate::diagnostic::{Diagnostic, DiagnosticCode, DiagnosticSink, Location, Severity};

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of diagnostics
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,

    /// Number of token streams scanned
    pub files_scanned: usize,
}

/// Diagnostics collected across one or more scans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Summary statistics
    pub summary: ReportSummary,

    /// All diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,

    /// Severity overrides applied on collection
    #[serde(skip)]
    overrides: SeverityThreshold,

    /// File attached to locations reported while it is being scanned
    #[serde(skip)]
    current_file: Option<String>,
}

impl Report {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty report that applies severity overrides
    pub fn with_overrides(overrides: SeverityThreshold) -> Self {
        Self {
            overrides,
            ..Self::default()
        }
    }

    /// Mark the start of a new token stream.
    ///
    /// Subsequent diagnostics without a file are attributed to `file`.
    pub fn begin_file(&mut self, file: impl Into<String>) {
        self.summary.files_scanned += 1;
        self.current_file = Some(file.into());
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, mut diagnostic: Diagnostic) {
        diagnostic.severity = self.overrides.get_severity(diagnostic.code, diagnostic.severity);

        if let (Some(location), Some(file)) = (diagnostic.location.as_mut(), &self.current_file) {
            if location.file.is_none() {
                location.file = Some(file.clone());
            }
        }

        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }
}

impl DiagnosticSink for Report {
    fn report_error(&mut self, location: Location, message: String) {
        self.add_diagnostic(
            Diagnostic::new(DiagnosticCode::FunctionForbidden, Severity::Error, message)
                .with_location(location),
        );
    }

    fn report_warning(&mut self, location: Location, message: String) {
        self.add_diagnostic(
            Diagnostic::new(DiagnosticCode::FunctionBehaviorChanged, Severity::Warn, message)
                .with_location(location),
        );
    }
}
