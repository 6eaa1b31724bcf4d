//! Call-site scanning
//!
//! Decides, for an identifier in a token stream, whether it is a plain call
//! to a function listed in a compatibility table and reports what the rule's
//! version thresholds say about it.

use crate::table::{CompatibilityTable, FunctionRule, MatchMode, RuleLookup};
use crate::token::{TokenKind, TokenStream};
use phpcompat_core::{Config, DiagnosticSink, Location, PhpVersion};

/// Per-scan settings, resolved once before scanning starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Version to check against; `None` implicates every threshold
    pub target_version: Option<PhpVersion>,

    pub match_mode: MatchMode,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_version: config.target_version(),
            match_mode: MatchMode::from_pattern_flag(config.pattern_match),
        }
    }

    pub fn with_target_version(mut self, version: PhpVersion) -> Self {
        self.target_version = Some(version);
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }
}

/// What a rule says about one call-site
#[derive(Debug, Clone, PartialEq, Eq)]
struct Finding {
    forbidden: bool,
    message: String,
}

/// Scans identifier tokens against a compatibility table
pub struct CallSiteScanner<'t> {
    table: &'t CompatibilityTable,
    options: ScanOptions,
    lookup: &'static (dyn RuleLookup + Sync),
}

impl<'t> CallSiteScanner<'t> {
    pub fn new(table: &'t CompatibilityTable, options: ScanOptions) -> Self {
        Self {
            table,
            options,
            lookup: options.match_mode.strategy(),
        }
    }

    /// Evaluate the identifier at `position`.
    ///
    /// Emits at most one diagnostic, at the identifier's position. Positions
    /// that are out of range or do not hold an identifier report nothing.
    pub fn on_identifier_token(
        &self,
        stream: &TokenStream,
        position: usize,
        sink: &mut dyn DiagnosticSink,
    ) {
        let Some(token) = stream.get(position) else {
            return;
        };

        if token.kind != TokenKind::Identifier {
            return;
        }

        if let Some(previous) = stream
            .find_previous_non_whitespace(position)
            .and_then(|i| stream.get(i))
        {
            if previous.kind.excludes_call_site() {
                tracing::trace!(position, previous = ?previous.kind, "not a function call");
                return;
            }
        }

        let function = token.content.to_lowercase();

        let Some(key) = self.lookup.lookup(self.table, &function) else {
            return;
        };

        let Some(rule) = self.table.get(key) else {
            return;
        };

        let Some(finding) = evaluate(rule, &function, self.options.target_version) else {
            tracing::trace!(position, function = %function, "no threshold implicated");
            return;
        };

        let location = match (token.line, token.column) {
            (0, _) => Location::at_token(position),
            (line, 0) => Location::with_line(position, line),
            (line, column) => Location::with_position(position, line, column),
        };

        tracing::debug!(
            position,
            function = %function,
            rule = %key,
            forbidden = finding.forbidden,
            "reporting call-site"
        );

        if finding.forbidden {
            sink.report_error(location, finding.message);
        } else {
            sink.report_warning(location, finding.message);
        }
    }

    /// Evaluate every identifier in `stream`
    pub fn scan(&self, stream: &TokenStream, sink: &mut dyn DiagnosticSink) {
        tracing::debug!(tokens = stream.len(), rules = self.table.len(), "scanning token stream");

        for position in stream.identifier_positions() {
            self.on_identifier_token(stream, position, sink);
        }
    }
}

/// Build the finding for `rule`, or `None` when no threshold applies
fn evaluate(rule: &FunctionRule, function: &str, target: Option<PhpVersion>) -> Option<Finding> {
    let mut forbidden = false;
    let fragments: Vec<String> = rule
        .implicated(target)
        .map(|status| {
            forbidden |= status.forbidden;
            let verdict = if status.forbidden { "forbidden" } else { "different" };
            format!("{} in PHP version {}", verdict, status.threshold)
        })
        .collect();

    if fragments.is_empty() {
        return None;
    }

    let mut message = format!("The use of function {} is {}", function, fragments.join(" and "));
    if let Some(alternative) = rule.alternative() {
        message.push_str(&format!("; use {} instead", alternative));
    }

    Some(Finding { forbidden, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use crate::token::Token;
    use phpcompat_core::{Diagnostic, Severity};
    use pretty_assertions::assert_eq;

    fn rule() -> FunctionRule {
        FunctionRule::function("ob_start")
            .different_in(PhpVersion::new(5, 4))
            .forbidden_in(PhpVersion::new(5, 5))
    }

    #[test]
    fn message_joins_fragments() {
        let finding = evaluate(&rule(), "ob_start", None).unwrap();
        assert_eq!(
            finding.message,
            "The use of function ob_start is different in PHP version 5.4 and forbidden in PHP version 5.5"
        );
        assert!(finding.forbidden);
    }

    #[test]
    fn single_fragment_has_no_separator() {
        let finding = evaluate(&rule(), "ob_start", Some(PhpVersion::new(5, 4))).unwrap();
        assert_eq!(finding.message, "The use of function ob_start is different in PHP version 5.4");
        assert!(!finding.forbidden);
    }

    #[test]
    fn alternative_is_appended() {
        let rule = rule().with_alternative("ob_get_clean");
        let finding = evaluate(&rule, "ob_start", Some(PhpVersion::new(5, 4))).unwrap();
        assert_eq!(
            finding.message,
            "The use of function ob_start is different in PHP version 5.4; use ob_get_clean instead"
        );
    }

    #[test]
    fn nothing_implicated() {
        assert_eq!(evaluate(&rule(), "ob_start", Some(PhpVersion::new(5, 3))), None);
    }

    #[test]
    fn message_uses_lowercase_name() {
        let table = TableBuilder::new().rule(rule()).build().unwrap();
        let scanner = CallSiteScanner::new(&table, ScanOptions::default());
        let stream = TokenStream::new(vec![Token::identifier("OB_START").at(4, 2)]);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        scanner.on_identifier_token(&stream, 0, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("The use of function ob_start is"));
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].location, Some(Location::with_position(0, 4, 2)));
    }

    #[test]
    fn unknown_column_is_omitted() {
        let table = TableBuilder::new().rule(rule()).build().unwrap();
        let scanner = CallSiteScanner::new(&table, ScanOptions::default());
        let stream = TokenStream::new(vec![
            Token::identifier("ob_start").at(3, 0),
            Token::other(";"),
            Token::identifier("ob_start"),
        ]);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        scanner.scan(&stream, &mut diagnostics);

        assert_eq!(diagnostics[0].location, Some(Location::with_line(0, 3)));
        assert_eq!(diagnostics[0].location.as_ref().map(|l| l.to_string()), Some("3".to_string()));
        assert_eq!(diagnostics[1].location, Some(Location::at_token(2)));
    }

    #[test]
    fn non_identifier_positions_are_ignored() {
        let table = TableBuilder::new().rule(rule()).build().unwrap();
        let scanner = CallSiteScanner::new(&table, ScanOptions::default());
        let stream = TokenStream::new(vec![Token::other("ob_start")]);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        scanner.on_identifier_token(&stream, 0, &mut diagnostics);
        scanner.on_identifier_token(&stream, 5, &mut diagnostics);

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn options_from_config() {
        let config = Config::from_toml("test_version = \"5.6\"\npattern_match = true").unwrap();
        let options = ScanOptions::from_config(&config);

        assert_eq!(options.target_version, Some(PhpVersion::new(5, 6)));
        assert_eq!(options.match_mode, MatchMode::Pattern);
    }
}
