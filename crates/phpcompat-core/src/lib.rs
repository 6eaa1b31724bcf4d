//! PHPCompat Core
//!
//! Core domain model shared by the sniffs and the host binary.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod version;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity, Location};
pub use version::{PhpVersion, VersionError, resolve_target_version};
pub use report::{Report, ReportSummary};
pub use config::{Config, ConfigError, SeverityThreshold};
