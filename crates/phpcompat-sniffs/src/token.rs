//! Token stream model
//!
//! Tokens are produced by an external tokenizer. The sniffs only read them.

use serde::{Deserialize, Serialize};

/// Lexical kinds the sniffs distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Whitespace,
    /// Identifier-shaped token (`T_STRING`)
    Identifier,
    /// `::`
    DoubleColon,
    /// `->`
    ObjectOperator,
    /// `function`
    FunctionKeyword,
    /// `const`
    ConstKeyword,
    /// `use`
    UseKeyword,
    /// `\`
    NamespaceSeparator,
    /// Anything else
    Other,
}

impl TokenKind {
    /// Kinds that, directly before an identifier, mean it is not a plain
    /// function call.
    pub fn excludes_call_site(&self) -> bool {
        matches!(
            self,
            Self::DoubleColon
                | Self::ObjectOperator
                | Self::FunctionKeyword
                | Self::ConstKeyword
                | Self::UseKeyword
                | Self::NamespaceSeparator
        )
    }
}

/// A single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,

    /// Literal source text
    pub content: String,

    /// Line number (1-indexed, 0 when unknown)
    #[serde(default)]
    pub line: usize,

    /// Column number (1-indexed, 0 when unknown)
    #[serde(default)]
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            line: 0,
            column: 0,
        }
    }

    /// Set the source position
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn whitespace(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Whitespace, content)
    }

    pub fn identifier(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Identifier, content)
    }

    pub fn other(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Other, content)
    }
}

/// An ordered, finite token stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Load a JSON token dump (an array of tokens)
    pub fn from_json(json: &str) -> Result<Self, TokenError> {
        serde_json::from_str(json).map_err(|e| TokenError::ParseError(e.to_string()))
    }

    /// Load a JSON token dump from a file
    pub fn from_file(path: &std::path::Path) -> Result<Self, TokenError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TokenError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Token> {
        self.tokens.get(position)
    }

    /// Find the nearest token before `position` that is not whitespace
    pub fn find_previous_non_whitespace(&self, position: usize) -> Option<usize> {
        let end = position.min(self.tokens.len());
        self.tokens[..end]
            .iter()
            .rposition(|token| token.kind != TokenKind::Whitespace)
    }

    /// Positions of all identifier tokens, in stream order
    pub fn identifier_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.kind == TokenKind::Identifier)
            .map(|(i, _)| i)
    }
}

/// Token dump loading errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Token dump parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> TokenStream {
        TokenStream::new(vec![
            Token::new(TokenKind::Other, "$obj"),
            Token::new(TokenKind::ObjectOperator, "->"),
            Token::whitespace(" "),
            Token::whitespace("\n"),
            Token::identifier("array_combine"),
            Token::other("("),
        ])
    }

    #[test]
    fn previous_skips_whitespace() {
        let stream = stream();
        assert_eq!(stream.find_previous_non_whitespace(4), Some(1));
        assert_eq!(stream.find_previous_non_whitespace(1), Some(0));
    }

    #[test]
    fn previous_at_start_is_none() {
        let stream = stream();
        assert_eq!(stream.find_previous_non_whitespace(0), None);

        let leading = TokenStream::new(vec![Token::whitespace(" "), Token::identifier("f")]);
        assert_eq!(leading.find_previous_non_whitespace(1), None);
    }

    #[test]
    fn previous_clamps_out_of_range() {
        let stream = stream();
        assert_eq!(stream.find_previous_non_whitespace(100), Some(5));
    }

    #[test]
    fn identifier_positions_in_order() {
        let positions: Vec<usize> = stream().identifier_positions().collect();
        assert_eq!(positions, vec![4]);
    }

    #[test]
    fn excluded_kinds() {
        assert!(TokenKind::DoubleColon.excludes_call_site());
        assert!(TokenKind::NamespaceSeparator.excludes_call_site());
        assert!(!TokenKind::Other.excludes_call_site());
        assert!(!TokenKind::Identifier.excludes_call_site());
        assert!(!TokenKind::Whitespace.excludes_call_site());
    }

    #[test]
    fn loads_json_dump() {
        let stream = TokenStream::from_json(
            r#"[
                {"kind": "identifier", "content": "ob_start", "line": 3, "column": 1},
                {"kind": "other", "content": "("}
            ]"#,
        )
        .unwrap();

        assert_eq!(stream.len(), 2);
        assert_eq!(stream.get(0).map(|t| t.line), Some(3));
        assert_eq!(stream.get(1).map(|t| t.column), Some(0));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            TokenStream::from_json(r#"[{"kind": "heredoc", "content": "x"}]"#),
            Err(TokenError::ParseError(_))
        ));
    }
}
