//! PHP compatibility sniffs
//!
//! This crate handles:
//! - The read-only token stream model handed over by a tokenizer
//! - Versioned compatibility tables (literal and pattern rules)
//! - Call-site scanning and diagnostic emission
//! - The built-in release-notes rule set

pub mod token;
pub mod table;
pub mod scanner;
pub mod release_notes;

pub use token::{Token, TokenKind, TokenStream, TokenError};
pub use table::{
    CompatibilityTable, FunctionRule, LiteralLookup, MatchMode, PatternLookup, RuleKey,
    RuleLookup, TableBuilder, TableError, VersionStatus,
};
pub use scanner::{CallSiteScanner, ScanOptions};
pub use release_notes::{release_notes_rules, release_notes_table};
