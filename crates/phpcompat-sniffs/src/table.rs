//! Versioned compatibility tables
//!
//! A table maps function names (or regular-expression patterns) to the PHP
//! versions at which their behavior changed. Tables are validated on
//! construction and never mutated afterwards, so one table can back any
//! number of concurrent scans.

use phpcompat_core::PhpVersion;
use regex::{Regex, RegexSet};
use std::collections::HashMap;

/// Identity of a rule: a lowercase function name or a bare pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleKey {
    /// Literal function name, lowercase
    Name(String),

    /// Regular expression without delimiters or modifiers
    Pattern(String),
}

impl RuleKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Pattern(pattern) => pattern,
        }
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Pattern(pattern) => write!(f, "/{}/", pattern),
        }
    }
}

/// One version threshold of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionStatus {
    /// Version at which the status starts to apply
    pub threshold: PhpVersion,

    /// `true`: must not be used from `threshold` on. `false`: behaves differently.
    pub forbidden: bool,
}

impl VersionStatus {
    /// Whether this status applies to `target`. No target implicates everything.
    pub fn is_implicated_by(&self, target: Option<PhpVersion>) -> bool {
        match target {
            None => true,
            Some(target) => target >= self.threshold,
        }
    }
}

/// A function (or family of functions) with version-dependent behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRule {
    key: RuleKey,
    /// PCRE-style modifiers of a pattern rule, e.g. `x` from `/.../x`
    modifiers: String,
    statuses: Vec<VersionStatus>,
    alternative: Option<String>,
}

impl FunctionRule {
    /// Rule for a literal function name (case-insensitive)
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(RuleKey::Name(name.into().trim().to_lowercase()))
    }

    /// Rule for a regular expression.
    ///
    /// `/.../flags` delimiters are accepted and stripped. The `m`, `s`, `x`
    /// and `u` flags keep their PCRE meaning; any other flag is rejected when
    /// the table is built. Patterns always match case-insensitively.
    pub fn pattern(pattern: impl AsRef<str>) -> Self {
        let (body, modifiers) = split_delimiters(pattern.as_ref());
        let mut rule = Self::new(RuleKey::Pattern(body.to_string()));
        rule.modifiers = modifiers.to_string();
        rule
    }

    pub fn new(key: RuleKey) -> Self {
        Self {
            key,
            modifiers: String::new(),
            statuses: Vec::new(),
            alternative: None,
        }
    }

    /// Append a threshold; statuses are evaluated in declaration order
    pub fn with_status(mut self, threshold: PhpVersion, forbidden: bool) -> Self {
        self.statuses.push(VersionStatus { threshold, forbidden });
        self
    }

    pub fn different_in(self, threshold: PhpVersion) -> Self {
        self.with_status(threshold, false)
    }

    pub fn forbidden_in(self, threshold: PhpVersion) -> Self {
        self.with_status(threshold, true)
    }

    pub fn with_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternative = Some(alternative.into());
        self
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }

    pub fn statuses(&self) -> &[VersionStatus] {
        &self.statuses
    }

    pub fn alternative(&self) -> Option<&str> {
        self.alternative.as_deref()
    }

    /// Statuses that apply to `target`, in declaration order
    pub fn implicated(&self, target: Option<PhpVersion>) -> impl Iterator<Item = &VersionStatus> + '_ {
        self.statuses
            .iter()
            .filter(move |status| status.is_implicated_by(target))
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.key.as_str().is_empty() {
            return Err(TableError::EmptyKey);
        }

        if let Some(modifier) = self.modifiers.chars().find(|c| !"imsux".contains(*c)) {
            return Err(TableError::UnsupportedModifier {
                pattern: self.key.as_str().to_string(),
                modifier,
            });
        }

        if self.statuses.is_empty() {
            return Err(TableError::NoThresholds(self.key.to_string()));
        }

        for (i, status) in self.statuses.iter().enumerate() {
            if self.statuses[..i].iter().any(|s| s.threshold == status.threshold) {
                return Err(TableError::DuplicateThreshold {
                    rule: self.key.to_string(),
                    version: status.threshold.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Regex source used in the combined pattern set.
    ///
    /// Literal names are escaped and unanchored, so in pattern mode they
    /// also match names that contain them.
    fn regex_source(&self) -> String {
        match &self.key {
            RuleKey::Name(name) => format!("(?i){}", regex::escape(name)),
            RuleKey::Pattern(pattern) => {
                // `u` is implied: the regex crate always matches Unicode
                let flags: String = self.modifiers.chars().filter(|c| "msx".contains(*c)).collect();
                format!("(?i{}){}", flags, pattern)
            }
        }
    }
}

/// Split `/body/flags` into body and flags; undelimited patterns have no flags
fn split_delimiters(pattern: &str) -> (&str, &str) {
    let trimmed = pattern.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return (trimmed, "");
    };

    match rest.rfind('/') {
        Some(end) if rest[end + 1..].chars().all(|c| c.is_ascii_alphabetic()) => {
            (&rest[..end], &rest[end + 1..])
        }
        _ => (trimmed, ""),
    }
}

/// Builder that validates rules into an immutable table
#[derive(Debug, Default)]
pub struct TableBuilder {
    rules: Vec<FunctionRule>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: FunctionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = FunctionRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> Result<CompatibilityTable, TableError> {
        let mut index = HashMap::with_capacity(self.rules.len());
        let mut sources = Vec::with_capacity(self.rules.len());

        for (i, rule) in self.rules.iter().enumerate() {
            rule.validate()?;

            if index.insert(rule.key.clone(), i).is_some() {
                return Err(TableError::DuplicateRule(rule.key.to_string()));
            }

            let source = rule.regex_source();
            if matches!(rule.key, RuleKey::Pattern(_)) {
                Regex::new(&source).map_err(|e| TableError::InvalidPattern {
                    pattern: rule.key.as_str().to_string(),
                    message: e.to_string(),
                })?;
            }
            sources.push(source);
        }

        let pattern_set = RegexSet::new(&sources)
            .map_err(|e| TableError::InvalidPattern {
                pattern: sources.join("|"),
                message: e.to_string(),
            })?;

        tracing::debug!(
            rules = self.rules.len(),
            patterns = self.rules.iter().filter(|r| matches!(r.key, RuleKey::Pattern(_))).count(),
            "built compatibility table"
        );

        Ok(CompatibilityTable {
            rules: self.rules,
            index,
            pattern_set,
        })
    }
}

/// Immutable set of function rules
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    /// Rules in declaration order
    rules: Vec<FunctionRule>,

    /// Rule key -> index into `rules`
    index: HashMap<RuleKey, usize>,

    /// One regex per rule, parallel to `rules`
    pattern_set: RegexSet,
}

impl CompatibilityTable {
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// A table that matches nothing
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
            pattern_set: RegexSet::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[FunctionRule] {
        &self.rules
    }

    /// Get a rule by its key
    pub fn get(&self, key: &RuleKey) -> Option<&FunctionRule> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    /// Exact, case-insensitive lookup of a function name
    pub fn find_literal(&self, name: &str) -> Option<&RuleKey> {
        let key = RuleKey::Name(name.to_lowercase());
        self.index.get(&key).map(|&i| &self.rules[i].key)
    }

    /// Test `name` against every rule, as a regex, in one pass
    pub fn matches_pattern(&self, name: &str) -> bool {
        self.pattern_set.is_match(name)
    }

    /// Key of the first rule (declaration order) whose regex matches `name`
    pub fn extract_pattern_key(&self, name: &str) -> Option<&RuleKey> {
        let first = self.pattern_set.matches(name).iter().next()?;
        Some(&self.rules[first].key)
    }
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Strategy resolving a candidate name to a rule key
pub trait RuleLookup {
    fn lookup<'t>(&self, table: &'t CompatibilityTable, name: &str) -> Option<&'t RuleKey>;
}

/// Exact name lookup only
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralLookup;

impl RuleLookup for LiteralLookup {
    fn lookup<'t>(&self, table: &'t CompatibilityTable, name: &str) -> Option<&'t RuleKey> {
        table.find_literal(name)
    }
}

/// Exact name lookup, falling back to matching every rule as a regex
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternLookup;

impl RuleLookup for PatternLookup {
    fn lookup<'t>(&self, table: &'t CompatibilityTable, name: &str) -> Option<&'t RuleKey> {
        if let Some(key) = table.find_literal(name) {
            return Some(key);
        }

        if !table.matches_pattern(name) {
            return None;
        }

        table.extract_pattern_key(name)
    }
}

/// How candidate names are matched against a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Literal names only
    #[default]
    Literal,

    /// Literal names, then every rule as an unanchored regex
    Pattern,
}

impl MatchMode {
    pub fn from_pattern_flag(pattern_match: bool) -> Self {
        if pattern_match {
            Self::Pattern
        } else {
            Self::Literal
        }
    }

    /// The lookup strategy for this mode
    pub fn strategy(&self) -> &'static (dyn RuleLookup + Sync) {
        static LITERAL: LiteralLookup = LiteralLookup;
        static PATTERN: PatternLookup = PatternLookup;

        match self {
            Self::Literal => &LITERAL,
            Self::Pattern => &PATTERN,
        }
    }
}

/// Table construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("rule key is empty")]
    EmptyKey,

    #[error("duplicate rule for {0}")]
    DuplicateRule(String),

    #[error("rule {0} declares no version thresholds")]
    NoThresholds(String),

    #[error("rule {rule} declares version {version} more than once")]
    DuplicateThreshold { rule: String, version: String },

    #[error("unsupported modifier '{modifier}' on pattern '{pattern}'")]
    UnsupportedModifier { pattern: String, modifier: char },

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}
