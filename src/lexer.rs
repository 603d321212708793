//! Tokenizer
//!
//! Turns SCSS source text into an ordered sequence of [`Token`]s. Whitespace and
//! comments are kept as tokens so the parser can decide where they matter
//! (descendant combinators, space-separated lists, loud comments).
//!
//! Every token keeps its exact source text in `value`, which lets the parser
//! rebuild selectors and raw at-rule preludes verbatim.

use crate::error::{ColorLiteralError, LexError};
use crate::token_stream::TokenStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    /// `$name`
    Variable,
    /// Digits with an optional fraction, exponent and unit (`10px`, `.5`, `50%`).
    Number,
    /// Quoted string including its quotes; may contain `#{...}`.
    String,
    /// `#abc` — a hex color or an id selector, decided by the parser.
    Hash,
    /// `@name`
    AtKeyword,
    /// `!important`, `!default`, `!global`, `!optional`
    Flag,
    /// `url(...)` with unquoted contents.
    Url,
    /// `#{`
    InterpolationStart,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Tilde,
    Pipe,
    Caret,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    NotEq,
    Assign,
    Whitespace,
    Comment,
    /// Any other single character.
    Delim,
    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Variable => "variable",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Hash => "hash",
            TokenKind::AtKeyword => "at-keyword",
            TokenKind::Flag => "flag",
            TokenKind::Url => "url",
            TokenKind::InterpolationStart => "`#{`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Ampersand => "`&`",
            TokenKind::Tilde => "`~`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::Gt => "`>`",
            TokenKind::Lt => "`<`",
            TokenKind::Ge => "`>=`",
            TokenKind::Le => "`<=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Assign => "`=`",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Delim => "delimiter",
            TokenKind::Eof => "end of input",
        }
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.value.eq_ignore_ascii_case(name)
    }

    /// A `//` comment, which never reaches the output.
    pub fn is_silent_comment(&self) -> bool {
        self.kind == TokenKind::Comment && self.value.starts_with("//")
    }
}

/// Tokenize `source` into a [`TokenStream`].
pub fn tokenize(source: &str) -> Result<TokenStream, LexError> {
    Ok(TokenStream::new(tokenize_at(source, 1, 1)?))
}

/// Tokenize text that starts at `line`/`column` of an enclosing source, used
/// for `#{...}` bodies found inside strings and `url()` tokens.
pub fn tokenize_at(source: &str, line: usize, column: usize) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source, line, column);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tracing::trace!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}

/// Validate a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` literal and return its channels.
pub fn parse_hex_color(
    literal: &str,
    line: usize,
    column: usize,
) -> Result<(u8, u8, u8, f64), ColorLiteralError> {
    let error = || ColorLiteralError {
        literal: literal.to_string(),
        line,
        column,
    };
    let digits = literal.strip_prefix('#').ok_or_else(error)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(error());
    }
    let channel = |text: &str| u8::from_str_radix(text, 16).map_err(|_| error());
    let expand = |c: char| -> String { [c, c].iter().collect() };
    let chars: Vec<char> = digits.chars().collect();
    match chars.len() {
        3 | 4 => {
            let r = channel(&expand(chars[0]))?;
            let g = channel(&expand(chars[1]))?;
            let b = channel(&expand(chars[2]))?;
            let a = if chars.len() == 4 {
                f64::from(channel(&expand(chars[3]))?) / 255.0
            } else {
                1.0
            };
            Ok((r, g, b, a))
        }
        6 | 8 => {
            let r = channel(&digits[0..2])?;
            let g = channel(&digits[2..4])?;
            let b = channel(&digits[4..6])?;
            let a = if chars.len() == 8 {
                f64::from(channel(&digits[6..8])?) / 255.0
            } else {
                1.0
            };
            Ok((r, g, b, a))
        }
        _ => Err(error()),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str, line: usize, column: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
            column,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let (line, column) = (self.line, self.column);
        let start = self.pos;
        let Some(c) = self.peek(0) else {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        };

        let kind = match c {
            c if c.is_whitespace() => {
                while self.peek(0).is_some_and(char::is_whitespace) {
                    self.bump();
                }
                TokenKind::Whitespace
            }
            '/' if self.peek(1) == Some('*') => {
                self.bump();
                self.bump();
                loop {
                    match self.peek(0) {
                        None => return Err(LexError::UnterminatedComment { line, column }),
                        Some('*') if self.peek(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            break;
                        }
                        Some(_) => {
                            self.bump();
                        }
                    }
                }
                TokenKind::Comment
            }
            '/' if self.peek(1) == Some('/') => {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.bump();
                }
                TokenKind::Comment
            }
            '"' | '\'' => {
                self.lex_string(c, line, column)?;
                TokenKind::String
            }
            '#' if self.peek(1) == Some('{') => {
                self.bump();
                self.bump();
                TokenKind::InterpolationStart
            }
            '#' if self.peek(1).is_some_and(is_name_char) => {
                self.bump();
                while self.peek(0).is_some_and(is_name_char) {
                    self.bump();
                }
                TokenKind::Hash
            }
            '$' if self.peek(1).is_some_and(|c| is_name_start(c) || c == '-') => {
                self.bump();
                self.lex_name();
                TokenKind::Variable
            }
            '@' if self.peek(1).is_some_and(|c| is_name_start(c) || c == '-') => {
                self.bump();
                self.lex_name();
                TokenKind::AtKeyword
            }
            '!' if self.peek(1) == Some('=') => {
                self.bump();
                self.bump();
                TokenKind::NotEq
            }
            '!' if self.peek(1).is_some_and(is_name_start) => {
                self.bump();
                self.lex_name();
                TokenKind::Flag
            }
            c if c.is_ascii_digit() => {
                self.lex_number(line, column)?;
                TokenKind::Number
            }
            '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number(line, column)?;
                TokenKind::Number
            }
            '-' if self.starts_identifier() => {
                self.lex_name();
                TokenKind::Ident
            }
            '\\' => {
                self.lex_name();
                TokenKind::Ident
            }
            c if is_name_start(c) => {
                self.lex_name();
                self.lex_url_tail(start)
            }
            _ => {
                self.bump();
                match c {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ':' => TokenKind::Colon,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    '&' => TokenKind::Ampersand,
                    '~' => TokenKind::Tilde,
                    '|' => TokenKind::Pipe,
                    '^' => TokenKind::Caret,
                    '>' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Ge
                    }
                    '<' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Le
                    }
                    '=' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::EqEq
                    }
                    '>' => TokenKind::Gt,
                    '<' => TokenKind::Lt,
                    '=' => TokenKind::Assign,
                    _ => TokenKind::Delim,
                }
            }
        };

        Ok(Token::new(kind, self.text_from(start), line, column))
    }

    /// `-foo`, `--foo` and `-#{...}` start identifiers; `-1` and `- x` do not.
    fn starts_identifier(&self) -> bool {
        match self.peek(1) {
            Some('-') => true,
            Some('\\') => true,
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn lex_name(&mut self) {
        loop {
            match self.peek(0) {
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                // A trailing `-` only belongs to the name when more name follows,
                // so `$a-$b` lexes as a subtraction.
                Some('-') => {
                    let next = self.peek(1);
                    let continues = next.is_some_and(is_name_char)
                        || next == Some('\\')
                        || (next == Some('#') && self.peek(2) == Some('{'));
                    if !continues {
                        break;
                    }
                    self.bump();
                }
                Some(c) if is_name_char(c) => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    /// Swallow the unquoted body of `url(...)` so `//` inside it is not a comment.
    fn lex_url_tail(&mut self, start: usize) -> TokenKind {
        if !self.text_from(start).eq_ignore_ascii_case("url") || self.peek(0) != Some('(') {
            return TokenKind::Ident;
        }
        let mut offset = 1;
        while self.peek(offset).is_some_and(char::is_whitespace) {
            offset += 1;
        }
        if matches!(self.peek(offset), Some('"') | Some('\'') | None) {
            return TokenKind::Ident;
        }
        let mut depth = 0usize;
        while let Some(c) = self.peek(0) {
            self.bump();
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        TokenKind::Url
    }

    fn lex_string(&mut self, quote: char, line: usize, column: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(LexError::UnterminatedString { line, column }),
                Some('\\') => {
                    self.bump();
                    if self.bump().is_none() {
                        return Err(LexError::UnterminatedString { line, column });
                    }
                }
                Some('#') if self.peek(1) == Some('{') => {
                    self.bump();
                    self.bump();
                    self.skip_interpolation_body(line, column)?;
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Skip to the `}` closing an interpolation opened inside a string,
    /// stepping over nested strings and braces.
    fn skip_interpolation_body(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            match c {
                '"' | '\'' => {
                    let (l, col) = (self.line, self.column);
                    self.lex_string(c, l, col)?;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.bump();
        }
        Err(LexError::UnterminatedString { line, column })
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        // `1..2px`: a second decimal point can never start a new token.
        if self.peek(0) == Some('.') && self.peek(1) == Some('.') {
            while self
                .peek(0)
                .is_some_and(|c| c == '.' || c.is_ascii_alphanumeric() || c == '%')
            {
                self.bump();
            }
            return Err(LexError::InvalidNumber {
                literal: self.text_from(start),
                line,
                column,
            });
        }
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(0), Some('e') | Some('E')) {
            let signed = matches!(self.peek(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else if signed {
                self.bump();
                self.bump();
                return Err(LexError::InvalidNumber {
                    literal: self.text_from(start),
                    line,
                    column,
                });
            }
        }
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            return Err(LexError::InvalidNumber {
                literal: self.text_from(start),
                line,
                column,
            });
        }
        if self.peek(0) == Some('%') {
            self.bump();
        } else {
            while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
                self.bump();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize_at(source, 1, 1)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keeps_whitespace_and_comments() {
        let tokens = tokenize_at("a /* x */ b // y\n", 1, 1).unwrap();
        let comments: Vec<_> = tokens.iter().filter(|t| t.is(TokenKind::Comment)).collect();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].value, "/* x */");
        assert!(comments[1].is_silent_comment());
    }

    #[test]
    fn numbers_carry_units() {
        let tokens = tokenize_at("10px .5em 50% 1e3", 1, 1).unwrap();
        let numbers: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(TokenKind::Number))
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(numbers, vec!["10px", ".5em", "50%", "1e3"]);
    }

    #[test]
    fn hyphen_before_variable_is_minus() {
        assert_eq!(
            kinds("$a-$b"),
            vec![
                TokenKind::Variable,
                TokenKind::Minus,
                TokenKind::Variable,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn hyphenated_identifier_before_interpolation() {
        let tokens = tokenize_at("col-#{$i}", 1, 1).unwrap();
        assert_eq!(tokens[0].value, "col-");
        assert_eq!(tokens[1].kind, TokenKind::InterpolationStart);
    }

    #[test]
    fn unquoted_url_is_one_token() {
        let tokens = tokenize_at("url(http://x.com/a.png)", 1, 1).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Url);
        assert_eq!(tokens[0].value, "url(http://x.com/a.png)");
    }

    #[test]
    fn strings_may_contain_interpolated_quotes() {
        let tokens = tokenize_at(r#""a #{"b"} c""#, 1, 1).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize_at("a\n  b", 1, 1).unwrap();
        let b = tokens.iter().find(|t| t.value == "b").unwrap();
        assert_eq!((b.line, b.column), (2, 3));
    }

    #[test]
    fn unterminated_string_reports_location() {
        let err = tokenize_at("a: \"oops", 1, 1).unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 4 });
    }

    #[test]
    fn malformed_exponent_is_rejected() {
        assert!(matches!(
            tokenize_at("1e+", 1, 1),
            Err(LexError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn doubled_decimal_point_is_rejected() {
        match tokenize_at("w: 1..2px;", 1, 1) {
            Err(LexError::InvalidNumber { literal, column, .. }) => {
                assert_eq!(literal, "1..2px");
                assert_eq!(column, 4);
            }
            other => panic!("expected an invalid number, got {:?}", other),
        }
    }

    #[test]
    fn bare_e_is_a_unit() {
        let tokens = tokenize_at("1e", 1, 1).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, "1e");
    }

    #[test]
    fn hex_colors_validate_length_and_digits() {
        assert_eq!(parse_hex_color("#fff", 1, 1).unwrap(), (255, 255, 255, 1.0));
        assert_eq!(parse_hex_color("#102030", 1, 1).unwrap(), (16, 32, 48, 1.0));
        assert!(parse_hex_color("#ggg", 2, 5).is_err());
        let err = parse_hex_color("#12345", 2, 5).unwrap_err();
        assert_eq!((err.line, err.column), (2, 5));
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("a==b!=c<=d>=e"),
            vec![
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::Ident,
                TokenKind::NotEq,
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Ident,
                TokenKind::Ge,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }
}
