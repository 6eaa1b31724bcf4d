//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A function that must not be used at or after a PHP version
    FunctionForbidden,

    /// A function whose behavior differs at or after a PHP version
    FunctionBehaviorChanged,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FunctionForbidden => "FUNCTION_FORBIDDEN",
            Self::FunctionBehaviorChanged => "FUNCTION_BEHAVIOR_CHANGED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - behavior differs across versions, should be reviewed
    Warn,

    /// Error - usage is forbidden for the target version
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Position of a call-site in a token stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File the token stream was produced from, when known
    pub file: Option<String>,

    /// Index of the token in its stream
    pub token_index: usize,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,

    /// Optional column number (1-indexed)
    pub column: Option<usize>,
}

impl Location {
    /// Create a location from a bare token index
    pub fn at_token(token_index: usize) -> Self {
        Self {
            file: None,
            token_index,
            line: None,
            column: None,
        }
    }

    /// Create a location with token index and line number
    pub fn with_line(token_index: usize, line: usize) -> Self {
        Self {
            file: None,
            token_index,
            line: Some(line),
            column: None,
        }
    }

    /// Create a location with token index, line, and column
    pub fn with_position(token_index: usize, line: usize, column: usize) -> Self {
        Self {
            file: None,
            token_index,
            line: Some(line),
            column: Some(column),
        }
    }

    /// Attach the originating file
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}", line, column),
            (Some(line), None) => write!(f, "{}", line),
            _ => write!(f, "token #{}", self.token_index),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Call-site location
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// Receiver for diagnostics produced by a scan.
///
/// The scanner hands over ownership of every message immediately; it never
/// reads back what it reported.
pub trait DiagnosticSink {
    /// Report a forbidden usage
    fn report_error(&mut self, location: Location, message: String);

    /// Report a usage whose behavior differs
    fn report_warning(&mut self, location: Location, message: String);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report_error(&mut self, location: Location, message: String) {
        self.push(
            Diagnostic::new(DiagnosticCode::FunctionForbidden, Severity::Error, message)
                .with_location(location),
        );
    }

    fn report_warning(&mut self, location: Location, message: String) {
        self.push(
            Diagnostic::new(DiagnosticCode::FunctionBehaviorChanged, Severity::Warn, message)
                .with_location(location),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::FunctionForbidden.as_str(), "FUNCTION_FORBIDDEN");
        assert_eq!(DiagnosticCode::FunctionBehaviorChanged.as_str(), "FUNCTION_BEHAVIOR_CHANGED");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::FunctionForbidden,
            Severity::Error,
            "The use of function ereg is forbidden in PHP version 7.0",
        )
        .with_location(Location::with_position(3, 12, 5));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("FUNCTION_FORBIDDEN"));
        assert!(json.contains("error"));
    }

    #[test]
    fn vec_sink_maps_severity_to_code() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report_error(Location::at_token(1), "forbidden".to_string());
        sink.report_warning(Location::at_token(2), "different".to_string());

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].code, DiagnosticCode::FunctionForbidden);
        assert_eq!(sink[0].severity, Severity::Error);
        assert_eq!(sink[1].code, DiagnosticCode::FunctionBehaviorChanged);
        assert_eq!(sink[1].severity, Severity::Warn);
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::at_token(7).to_string(), "token #7");
        assert_eq!(
            Location::with_position(7, 3, 9).in_file("index.php").to_string(),
            "index.php:3:9"
        );
    }
}
