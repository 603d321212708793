//! Cursor over a token sequence.
//!
//! The position only moves forward through [`TokenStream::advance`] and the
//! `consume*` family; [`TokenStream::set_position`] is the single way back and is
//! what the parser uses for lookahead and backtracking.

use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    /// Build a stream, guaranteeing a trailing `Eof` token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Look `offset` tokens ahead; past the end this keeps returning `Eof`.
    pub fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)]
    }

    pub fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub fn advance(&mut self, n: usize) {
        self.position = (self.position + n).min(self.tokens.len() - 1);
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.tokens.len() - 1);
    }

    pub fn matches(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub fn matches_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    /// Consume the current token, which must be of `expected` kind.
    pub fn consume(&mut self, expected: TokenKind) -> Result<Token, SyntaxError> {
        self.expect_any(&[expected])
    }

    /// Consume the current token when it is of `kind`.
    pub fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.matches(kind) {
            let token = self.current().clone();
            self.advance(1);
            Some(token)
        } else {
            None
        }
    }

    /// Consume the current token when it is one of `kinds`, failing otherwise.
    pub fn expect_any(&mut self, kinds: &[TokenKind]) -> Result<Token, SyntaxError> {
        if self.matches_any(kinds) {
            let token = self.current().clone();
            self.advance(1);
            return Ok(token);
        }
        let expected = kinds
            .iter()
            .map(|k| k.describe())
            .collect::<Vec<_>>()
            .join(" or ");
        let token = self.current();
        if token.kind == TokenKind::Eof {
            Err(SyntaxError::UnexpectedEof {
                expected,
                line: token.line,
                column: token.column,
            })
        } else {
            Err(SyntaxError::Unexpected {
                expected,
                found: format!("{} `{}`", token.kind.describe(), token.value),
                line: token.line,
                column: token.column,
            })
        }
    }

    /// Skip whitespace and comments, returning whether anything was skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.current().kind.is_trivia() {
            self.advance(1);
        }
        self.position != start
    }

    /// Skip whitespace only, leaving comments in place.
    pub fn skip_blank(&mut self) -> bool {
        let start = self.position;
        while self.matches(TokenKind::Whitespace) {
            self.advance(1);
        }
        self.position != start
    }

    /// Kind of the next non-trivia token, without moving.
    pub fn peek_significant(&self) -> &Token {
        let mut offset = 0;
        while self.peek(offset).kind.is_trivia() {
            offset += 1;
        }
        self.peek(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn consume_reports_expected_and_found() {
        let mut stream = tokenize("a").unwrap();
        let err = stream.consume(TokenKind::LBrace).unwrap_err();
        assert_eq!(
            err,
            SyntaxError::Unexpected {
                expected: "`{`".to_string(),
                found: "identifier `a`".to_string(),
                line: 1,
                column: 1
            }
        );
    }

    #[test]
    fn consume_at_end_is_premature_eof() {
        let mut stream = tokenize("").unwrap();
        assert!(matches!(
            stream.consume(TokenKind::Semicolon),
            Err(SyntaxError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn backtracking_restores_position() {
        let mut stream = tokenize("a b c").unwrap();
        let saved = stream.get_position();
        stream.advance(3);
        assert_eq!(stream.current().kind, TokenKind::Whitespace);
        stream.advance(1);
        assert_eq!(stream.current().value, "c");
        stream.set_position(saved);
        assert_eq!(stream.current().value, "a");
    }

    #[test]
    fn peeking_past_the_end_yields_eof() {
        let stream = tokenize("a").unwrap();
        assert_eq!(stream.peek(10).kind, TokenKind::Eof);
    }

    #[test]
    fn skip_whitespace_skips_comments_too() {
        let mut stream = tokenize("  /* c */ x").unwrap();
        assert!(stream.skip_whitespace());
        assert_eq!(stream.current().value, "x");
        assert!(stream.consume_if(TokenKind::Ident).is_some());
        assert!(stream.is_at_end());
    }
}
