//! Recursive-descent parser producing the [`crate::ast`] tree.
//!
//! Statements are parsed straight off the token stream. Declaration values and
//! variable assignments are first cut out as a token slice (up to the next `;`,
//! `{` or `}` at nesting depth 0) and handed to a sub-parser, so a value the
//! expression grammar cannot handle can fall back to raw text.

use crate::ast::*;
use crate::compiler::values::named_color;
use crate::error::{LexError, Result, SassError, SyntaxError};
use crate::lexer::{parse_hex_color, tokenize, tokenize_at, Token, TokenKind};
use crate::token_stream::TokenStream;

/// Parse a complete stylesheet.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet> {
    let stream = tokenize(source)?;
    tracing::debug!("parsing {} tokens", stream.len());
    let stylesheet = Parser::new(stream).parse()?;
    tracing::debug!("parsed {} top-level nodes", stylesheet.nodes.len());
    Ok(stylesheet)
}

/// Parse a standalone expression, e.g. the raw value of an unknown at-rule.
pub fn parse_expression(source: &str) -> Result<Expr> {
    Parser::new(tokenize(source)?).parse_complete_expression()
}

/// Parse a `name($a, $b: default)` signature as written after `@mixin`.
pub fn parse_signature(source: &str) -> Result<(String, ParameterList)> {
    let mut parser = Parser::new(tokenize(source)?);
    parser.stream.skip_whitespace();
    let name = parser.stream.consume(TokenKind::Ident)?.value;
    parser.stream.skip_whitespace();
    let params = if parser.stream.matches(TokenKind::LParen) {
        parser.parse_parameters()?
    } else {
        ParameterList::default()
    };
    parser.stream.skip_whitespace();
    if !parser.stream.is_at_end() {
        return Err(parser.unexpected("end of signature").into());
    }
    Ok((name, params))
}

/// Shape of a statement that starts with neither `@` nor `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementShape {
    Rule,
    Declaration,
}

pub struct Parser {
    stream: TokenStream,
    /// Identifiers that end an expression, e.g. `through`/`to` inside `@for`.
    stop_words: &'static [&'static str],
}

impl Parser {
    pub fn new(stream: TokenStream) -> Self {
        Self {
            stream,
            stop_words: &[],
        }
    }

    fn from_tokens(tokens: Vec<Token>) -> Self {
        Self::new(TokenStream::new(tokens))
    }

    pub fn parse(mut self) -> Result<Stylesheet> {
        let nodes = self.parse_statements(true)?;
        Ok(Stylesheet { nodes })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.stream.current();
        if token.kind == TokenKind::Eof {
            SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                line: token.line,
                column: token.column,
            }
        } else {
            SyntaxError::Unexpected {
                expected: expected.to_string(),
                found: format!("{} `{}`", token.kind.describe(), token.value),
                line: token.line,
                column: token.column,
            }
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        if !self.stream.current().is_ident(word) {
            return Err(self.unexpected(&format!("`{}`", word)).into());
        }
        self.stream.advance(1);
        self.stream.skip_whitespace();
        Ok(())
    }

    /// Offset of the first token in `stops` at nesting depth 0, or of `Eof`.
    fn scan_to(&self, stops: &[TokenKind]) -> usize {
        let mut stack: Vec<TokenKind> = Vec::new();
        let mut offset = 0;
        loop {
            let kind = self.stream.peek(offset).kind;
            match kind {
                TokenKind::Eof => return offset,
                k if stack.is_empty() && stops.contains(&k) => return offset,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::InterpolationStart => {
                    stack.push(kind)
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    stack.pop();
                }
                TokenKind::RBrace if stack.last() == Some(&TokenKind::InterpolationStart) => {
                    stack.pop();
                }
                _ => {}
            }
            offset += 1;
        }
    }

    fn take_tokens(&mut self, count: usize) -> Vec<Token> {
        let tokens = (0..count).map(|i| self.stream.peek(i).clone()).collect();
        self.stream.advance(count);
        tokens
    }

    fn at_ellipsis(&self) -> bool {
        (0..3).all(|i| self.stream.peek(i).kind == TokenKind::Dot)
    }

    /// The first non-trivia token at or after `offset`.
    fn significant_from(&self, mut offset: usize) -> &Token {
        while self.stream.peek(offset).kind.is_trivia() {
            offset += 1;
        }
        self.stream.peek(offset)
    }

    fn with_stop_words<T>(
        &mut self,
        words: &'static [&'static str],
        parse: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.stop_words, words);
        let result = parse(self);
        self.stop_words = saved;
        result
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statements(&mut self, top_level: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.stream.skip_blank();
            let token = self.stream.current().clone();
            match token.kind {
                TokenKind::Eof if top_level => break,
                TokenKind::Eof => return Err(self.unexpected("`}`").into()),
                TokenKind::RBrace if top_level => return Err(self.unexpected("statement").into()),
                TokenKind::RBrace => break,
                TokenKind::Semicolon => self.stream.advance(1),
                TokenKind::Comment => {
                    self.stream.advance(1);
                    if !token.is_silent_comment() {
                        nodes.push(Node::Comment {
                            text: token.value,
                            line: token.line,
                        });
                    }
                }
                TokenKind::AtKeyword => nodes.push(self.parse_at_rule()?),
                TokenKind::Variable => nodes.push(self.parse_variable_decl(None)?),
                TokenKind::Ident
                    if self.stream.peek(1).kind == TokenKind::Dot
                        && self.stream.peek(2).kind == TokenKind::Variable =>
                {
                    self.stream.advance(2);
                    nodes.push(self.parse_variable_decl(Some(token.value))?);
                }
                _ => nodes.push(self.parse_rule_or_declaration()?),
            }
        }
        Ok(nodes)
    }

    fn parse_block(&mut self) -> Result<Vec<Node>> {
        self.stream.skip_whitespace();
        self.stream.consume(TokenKind::LBrace)?;
        let body = self.parse_statements(false)?;
        self.stream.consume(TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_variable_decl(&mut self, namespace: Option<String>) -> Result<Node> {
        let token = self.stream.consume(TokenKind::Variable)?;
        self.stream.skip_whitespace();
        self.stream.consume(TokenKind::Colon)?;
        self.stream.skip_whitespace();
        let end = self.scan_to(&[TokenKind::Semicolon, TokenKind::RBrace, TokenKind::LBrace]);
        let mut tokens = self.take_tokens(end);
        let flags = strip_trailing_flags(&mut tokens);
        let value = Parser::from_tokens(tokens).parse_complete_expression()?;
        self.stream.consume_if(TokenKind::Semicolon);
        Ok(Node::VariableDecl {
            namespace,
            name: token.value[1..].to_string(),
            value,
            default: flags.iter().any(|f| f == "!default"),
            global: flags.iter().any(|f| f == "!global"),
            line: token.line,
        })
    }

    fn statement_shape(&self) -> StatementShape {
        let colon = self.scan_to(&[
            TokenKind::Colon,
            TokenKind::Semicolon,
            TokenKind::LBrace,
            TokenKind::RBrace,
        ]);
        if self.stream.peek(colon).kind != TokenKind::Colon {
            return StatementShape::Rule;
        }
        let end = self.scan_to(&[TokenKind::Semicolon, TokenKind::LBrace, TokenKind::RBrace]);
        if self.stream.peek(end).kind != TokenKind::LBrace {
            return StatementShape::Declaration;
        }
        // `font: { ... }` and `font: 12px { ... }` are nested properties;
        // `a:hover {` is a selector.
        let starts_like_name = matches!(
            self.stream.peek(0).kind,
            TokenKind::Ident | TokenKind::InterpolationStart
        );
        let unspaced_name = (0..colon).all(|i| self.stream.peek(i).kind != TokenKind::Whitespace);
        let spaced_after = matches!(
            self.stream.peek(colon + 1).kind,
            TokenKind::Whitespace | TokenKind::LBrace
        );
        if starts_like_name && unspaced_name && spaced_after {
            StatementShape::Declaration
        } else {
            StatementShape::Rule
        }
    }

    fn parse_rule_or_declaration(&mut self) -> Result<Node> {
        let token = self.stream.current();
        if token.kind == TokenKind::Ident
            && token.value.starts_with("--")
            && self.significant_from(1).kind == TokenKind::Colon
        {
            return self.parse_custom_property();
        }
        match self.statement_shape() {
            StatementShape::Rule => self.parse_rule(),
            StatementShape::Declaration => self.parse_declaration(),
        }
    }

    fn parse_rule(&mut self) -> Result<Node> {
        let line = self.stream.current().line;
        let text = self.parse_raw(
            &[TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace],
            false,
        )?;
        if text.is_empty() {
            return Err(self.unexpected("selector").into());
        }
        let body = self.parse_block()?;
        Ok(Node::Rule {
            selector: Selector { text, line },
            body,
            line,
        })
    }

    fn parse_declaration(&mut self) -> Result<Node> {
        let line = self.stream.current().line;
        let property = self.parse_raw(
            &[
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ],
            false,
        )?;
        self.stream.consume(TokenKind::Colon)?;
        self.stream.skip_whitespace();
        let end = self.scan_to(&[TokenKind::Semicolon, TokenKind::LBrace, TokenKind::RBrace]);
        let tokens = self.take_tokens(end);
        let (value, important) = parse_value_tokens(tokens)?;
        let nested = if self.stream.matches(TokenKind::LBrace) {
            self.parse_block()?
        } else {
            if value.is_none() {
                return Err(self.unexpected("declaration value").into());
            }
            self.stream.consume_if(TokenKind::Semicolon);
            Vec::new()
        };
        Ok(Node::Property(Declaration {
            property,
            value,
            important,
            nested,
            line,
        }))
    }

    fn parse_custom_property(&mut self) -> Result<Node> {
        let name = self.stream.consume(TokenKind::Ident)?;
        self.stream.skip_whitespace();
        self.stream.consume(TokenKind::Colon)?;
        self.stream.skip_whitespace();
        let value = self.parse_raw(&[TokenKind::Semicolon, TokenKind::RBrace], false)?;
        self.stream.consume_if(TokenKind::Semicolon);
        Ok(Node::CustomProperty {
            name: Interpolation::literal(name.value, name.line),
            value,
            line: name.line,
        })
    }

    /// Collect tokens up to a stop token as literal text, parsing `#{...}`
    /// (and, when `embed_variables` is set, bare `$variables`) as expressions.
    /// Whitespace and comments collapse to single spaces.
    fn parse_raw(&mut self, stops: &[TokenKind], embed_variables: bool) -> Result<Interpolation> {
        let mut interp = Interpolation {
            parts: Vec::new(),
            line: self.stream.current().line,
        };
        let mut depth = 0usize;
        loop {
            let token = self.stream.current().clone();
            match token.kind {
                TokenKind::Eof => break,
                kind if depth == 0 && stops.contains(&kind) => break,
                TokenKind::InterpolationStart => {
                    let expr = self.parse_interpolation_expr()?;
                    interp.push_expr(expr);
                    continue;
                }
                TokenKind::Whitespace | TokenKind::Comment => {
                    push_space(&mut interp);
                    self.stream.advance(1);
                    continue;
                }
                TokenKind::String => {
                    let quote = &token.value[..1];
                    interp.push_literal(quote);
                    let content = string_parts(
                        &token.value[1..token.value.len() - 1],
                        token.line,
                        token.column + 1,
                    )?;
                    interp.parts.extend(content.parts);
                    interp.push_literal(quote);
                    self.stream.advance(1);
                    continue;
                }
                TokenKind::Variable if embed_variables => {
                    interp.push_expr(Expr::Variable {
                        name: token.value[1..].to_string(),
                        line: token.line,
                    });
                    self.stream.advance(1);
                    continue;
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            interp.push_literal(&token.value);
            self.stream.advance(1);
        }
        trim_interpolation(&mut interp);
        Ok(interp)
    }

    fn parse_interpolation_expr(&mut self) -> Result<Expr> {
        self.stream.consume(TokenKind::InterpolationStart)?;
        self.stream.skip_whitespace();
        let expr = self.with_stop_words(&[], |p| p.parse_expression())?;
        self.stream.skip_whitespace();
        self.stream.consume(TokenKind::RBrace)?;
        Ok(expr)
    }

    // ========================================================================
    // At-rules
    // ========================================================================

    fn parse_at_rule(&mut self) -> Result<Node> {
        let token = self.stream.consume(TokenKind::AtKeyword)?;
        let name = token.value[1..].to_string();
        let lower = name.to_ascii_lowercase();
        let line = token.line;
        self.stream.skip_whitespace();
        let conditional_stops = [TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace];
        match lower.as_str() {
            "if" => self.parse_if(line),
            "else" => Err(SyntaxError::invalid("@else must follow @if", line, token.column).into()),
            "each" => self.parse_each(line),
            "for" => self.parse_for(line),
            "while" => {
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(Node::While {
                    condition,
                    body,
                    line,
                })
            }
            "mixin" | "function" => {
                let name = self.stream.consume(TokenKind::Ident)?.value;
                self.stream.skip_whitespace();
                let params = if self.stream.matches(TokenKind::LParen) {
                    self.parse_parameters()?
                } else {
                    ParameterList::default()
                };
                let body = self.parse_block()?;
                if lower == "mixin" {
                    Ok(Node::MixinDef {
                        name,
                        params,
                        body,
                        line,
                    })
                } else {
                    Ok(Node::FunctionDef {
                        name,
                        params,
                        body,
                        line,
                    })
                }
            }
            "return" => {
                let value = self.parse_expression()?;
                self.finish_statement();
                Ok(Node::Return { value, line })
            }
            "include" => self.parse_include(line),
            "content" => {
                let args = if self.stream.matches(TokenKind::LParen) {
                    self.parse_call_args()?
                } else {
                    Vec::new()
                };
                self.finish_statement();
                Ok(Node::Content { args, line })
            }
            "use" => self.parse_use(line),
            "forward" => self.parse_forward(line),
            "import" => self.parse_import(line),
            "media" => {
                let query = self.parse_raw(&conditional_stops, true)?;
                let body = self.parse_block()?;
                Ok(Node::Media { query, body, line })
            }
            "supports" => {
                let condition = self.parse_raw(&conditional_stops, true)?;
                let body = self.parse_block()?;
                Ok(Node::Supports {
                    condition,
                    body,
                    line,
                })
            }
            "container" => {
                let query = self.parse_raw(&conditional_stops, true)?;
                let body = self.parse_block()?;
                Ok(Node::Container { query, body, line })
            }
            k if k == "keyframes" || k.ends_with("-keyframes") => {
                self.parse_keyframes(k.to_string(), line)
            }
            "at-root" => self.parse_at_root(line),
            "debug" | "warn" | "error" => {
                let kind = match lower.as_str() {
                    "debug" => MessageKind::Debug,
                    "warn" => MessageKind::Warn,
                    _ => MessageKind::Error,
                };
                let value = self.parse_expression()?;
                self.finish_statement();
                Ok(Node::Message { kind, value, line })
            }
            "extend" => {
                let end = self.scan_to(&[TokenKind::Semicolon, TokenKind::RBrace]);
                let mut tokens = self.take_tokens(end);
                let flags = strip_trailing_flags(&mut tokens);
                let selector = Parser::from_tokens(tokens).parse_raw(&[], false)?;
                self.stream.consume_if(TokenKind::Semicolon);
                Ok(Node::Extend {
                    selector,
                    optional: flags.iter().any(|f| f == "!optional"),
                    line,
                })
            }
            _ => {
                let value = self.parse_raw(&conditional_stops, false)?;
                let body = if self.stream.matches(TokenKind::LBrace) {
                    Some(self.parse_block()?)
                } else {
                    self.stream.consume_if(TokenKind::Semicolon);
                    None
                };
                Ok(Node::AtRule {
                    name,
                    value,
                    body,
                    line,
                })
            }
        }
    }

    fn finish_statement(&mut self) {
        self.stream.skip_whitespace();
        self.stream.consume_if(TokenKind::Semicolon);
    }

    fn parse_if(&mut self, line: usize) -> Result<Node> {
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        let mut conditions = vec![Condition {
            test: Some(test),
            body,
            line,
        }];
        loop {
            let saved = self.stream.get_position();
            self.stream.skip_whitespace();
            let token = self.stream.current().clone();
            if !(token.kind == TokenKind::AtKeyword && token.value.eq_ignore_ascii_case("@else")) {
                self.stream.set_position(saved);
                break;
            }
            self.stream.advance(1);
            self.stream.skip_whitespace();
            if self.stream.current().is_ident("if") {
                self.stream.advance(1);
                self.stream.skip_whitespace();
                let test = self.parse_expression()?;
                let body = self.parse_block()?;
                conditions.push(Condition {
                    test: Some(test),
                    body,
                    line: token.line,
                });
            } else {
                let body = self.parse_block()?;
                conditions.push(Condition {
                    test: None,
                    body,
                    line: token.line,
                });
                break;
            }
        }
        Ok(Node::If { conditions, line })
    }

    fn parse_each(&mut self, line: usize) -> Result<Node> {
        let mut variables = Vec::new();
        loop {
            let token = self.stream.consume(TokenKind::Variable)?;
            variables.push(token.value[1..].to_string());
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::Comma).is_none() {
                break;
            }
            self.stream.skip_whitespace();
        }
        self.expect_word("in")?;
        let list = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Node::Each {
            variables,
            list,
            body,
            line,
        })
    }

    fn parse_for(&mut self, line: usize) -> Result<Node> {
        let variable = self.stream.consume(TokenKind::Variable)?.value[1..].to_string();
        self.stream.skip_whitespace();
        self.expect_word("from")?;
        let from = self.with_stop_words(&["through", "to"], |p| p.parse_expression())?;
        self.stream.skip_whitespace();
        let inclusive = if self.stream.current().is_ident("through") {
            true
        } else if self.stream.current().is_ident("to") {
            false
        } else {
            return Err(self.unexpected("`through` or `to`").into());
        };
        self.stream.advance(1);
        self.stream.skip_whitespace();
        let to = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Node::For {
            variable,
            from,
            to,
            inclusive,
            body,
            line,
        })
    }

    fn parse_include(&mut self, line: usize) -> Result<Node> {
        let first = self.stream.consume(TokenKind::Ident)?.value;
        let (namespace, name) = if self.stream.matches(TokenKind::Dot)
            && self.stream.peek(1).kind == TokenKind::Ident
        {
            self.stream.advance(1);
            let name = self.stream.consume(TokenKind::Ident)?.value;
            (Some(first), name)
        } else {
            (None, first)
        };
        self.stream.skip_whitespace();
        let args = if self.stream.matches(TokenKind::LParen) {
            self.parse_call_args()?
        } else {
            Vec::new()
        };
        self.stream.skip_whitespace();
        let mut params = ParameterList::default();
        if self.stream.current().is_ident("using") {
            self.stream.advance(1);
            self.stream.skip_whitespace();
            params = self.parse_parameters()?;
            self.stream.skip_whitespace();
        }
        let content = if self.stream.matches(TokenKind::LBrace) {
            let body = self.parse_block()?;
            Some(ContentBlock { params, body })
        } else {
            self.stream.consume_if(TokenKind::Semicolon);
            None
        };
        Ok(Node::Include {
            namespace,
            name,
            args,
            content,
            line,
        })
    }

    fn parse_url_string(&mut self) -> Result<String> {
        let token = self.stream.consume(TokenKind::String)?;
        self.stream.skip_whitespace();
        Ok(token.value[1..token.value.len() - 1].to_string())
    }

    fn parse_use(&mut self, line: usize) -> Result<Node> {
        let url = self.parse_url_string()?;
        let mut namespace = None;
        let mut config = Vec::new();
        if self.stream.current().is_ident("as") {
            self.stream.advance(1);
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::Star).is_some() {
                namespace = Some("*".to_string());
            } else {
                namespace = Some(self.stream.consume(TokenKind::Ident)?.value);
            }
            self.stream.skip_whitespace();
        }
        if self.stream.current().is_ident("with") {
            self.stream.advance(1);
            self.stream.skip_whitespace();
            self.stream.consume(TokenKind::LParen)?;
            loop {
                self.stream.skip_whitespace();
                if self.stream.consume_if(TokenKind::RParen).is_some() {
                    break;
                }
                let name = self.stream.consume(TokenKind::Variable)?.value[1..].to_string();
                self.stream.skip_whitespace();
                self.stream.consume(TokenKind::Colon)?;
                self.stream.skip_whitespace();
                let value = self.parse_space_list()?;
                config.push((name, value));
                self.stream.skip_whitespace();
                if self.stream.consume_if(TokenKind::Comma).is_none() {
                    self.stream.consume(TokenKind::RParen)?;
                    break;
                }
            }
        }
        self.finish_statement();
        Ok(Node::Use {
            url,
            namespace,
            config,
            line,
        })
    }

    fn parse_forward(&mut self, line: usize) -> Result<Node> {
        let url = self.parse_url_string()?;
        let mut prefix = None;
        let mut filter = None;
        if self.stream.current().is_ident("as") {
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let mut text = String::new();
            while !self.stream.matches_any(&[TokenKind::Star, TokenKind::Eof]) {
                text.push_str(&self.stream.current().value);
                self.stream.advance(1);
            }
            self.stream.consume(TokenKind::Star)?;
            prefix = Some(text);
            self.stream.skip_whitespace();
        }
        let token = self.stream.current().clone();
        if token.is_ident("show") || token.is_ident("hide") {
            self.stream.advance(1);
            let mut names = Vec::new();
            loop {
                self.stream.skip_whitespace();
                let member = self.stream.expect_any(&[TokenKind::Ident, TokenKind::Variable])?;
                names.push(member.value);
                self.stream.skip_whitespace();
                if self.stream.consume_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
            filter = Some(if token.is_ident("show") {
                ForwardFilter::Show(names)
            } else {
                ForwardFilter::Hide(names)
            });
        }
        self.finish_statement();
        Ok(Node::Forward {
            url,
            prefix,
            filter,
            line,
        })
    }

    fn parse_import(&mut self, line: usize) -> Result<Node> {
        let end = self.scan_to(&[TokenKind::Semicolon, TokenKind::RBrace]);
        let tokens = self.take_tokens(end);
        self.stream.consume_if(TokenKind::Semicolon);

        let significant: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();
        let urls: Vec<String> = significant
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| t.value[1..t.value.len() - 1].to_string())
            .collect();
        let only_strings = !significant.is_empty()
            && significant
                .iter()
                .all(|t| matches!(t.kind, TokenKind::String | TokenKind::Comma));
        if only_strings && !urls.iter().any(|url| is_plain_css_import(url)) {
            return Ok(Node::Import { urls, line });
        }
        let value = Parser::from_tokens(tokens).parse_raw(&[], false)?;
        Ok(Node::AtRule {
            name: "import".to_string(),
            value,
            body: None,
            line,
        })
    }

    fn parse_keyframes(&mut self, keyword: String, line: usize) -> Result<Node> {
        let name = self.parse_raw(
            &[TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace],
            false,
        )?;
        self.stream.consume(TokenKind::LBrace)?;
        let mut blocks = Vec::new();
        loop {
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::RBrace).is_some() {
                break;
            }
            if self.stream.is_at_end() {
                return Err(self.unexpected("`}`").into());
            }
            let token = self.stream.current().clone();
            let selector = self.parse_raw(
                &[TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace],
                false,
            )?;
            let text = selector.as_plain().ok_or_else(|| {
                SyntaxError::invalid(
                    "Interpolation is not supported in keyframe selectors",
                    token.line,
                    token.column,
                )
            })?;
            let selectors = text
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let declarations = self
                .parse_block()?
                .into_iter()
                .filter_map(|node| match node {
                    Node::Property(decl) => Some(decl),
                    _ => None,
                })
                .collect();
            blocks.push(KeyframeBlock {
                selectors,
                declarations,
                line: token.line,
            });
        }
        Ok(Node::Keyframes {
            keyword,
            name,
            blocks,
            line,
        })
    }

    fn parse_at_root(&mut self, line: usize) -> Result<Node> {
        let query = if self.stream.matches(TokenKind::LParen) {
            Some(self.parse_at_root_query()?)
        } else {
            None
        };
        self.stream.skip_whitespace();
        let selector = if self.stream.matches(TokenKind::LBrace) {
            None
        } else {
            let selector_line = self.stream.current().line;
            let text = self.parse_raw(
                &[TokenKind::LBrace, TokenKind::Semicolon, TokenKind::RBrace],
                false,
            )?;
            Some(Selector {
                text,
                line: selector_line,
            })
        };
        let body = self.parse_block()?;
        Ok(Node::AtRoot {
            selector,
            query,
            body,
            line,
        })
    }

    fn parse_at_root_query(&mut self) -> Result<AtRootQuery> {
        self.stream.consume(TokenKind::LParen)?;
        self.stream.skip_whitespace();
        let keyword = self.stream.consume(TokenKind::Ident)?;
        self.stream.skip_whitespace();
        self.stream.consume(TokenKind::Colon)?;
        let mut names = Vec::new();
        loop {
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::RParen).is_some() {
                break;
            }
            names.push(self.stream.consume(TokenKind::Ident)?.value.to_ascii_lowercase());
        }
        match keyword.value.to_ascii_lowercase().as_str() {
            "with" => Ok(AtRootQuery::With(names)),
            "without" => Ok(AtRootQuery::Without(names)),
            _ => Err(SyntaxError::Unexpected {
                expected: "`with` or `without`".to_string(),
                found: format!("identifier `{}`", keyword.value),
                line: keyword.line,
                column: keyword.column,
            }
            .into()),
        }
    }

    fn parse_parameters(&mut self) -> Result<ParameterList> {
        self.stream.consume(TokenKind::LParen)?;
        self.with_stop_words(&[], |p| {
            let mut list = ParameterList::default();
            loop {
                p.stream.skip_whitespace();
                if p.stream.consume_if(TokenKind::RParen).is_some() {
                    break;
                }
                let name = p.stream.consume(TokenKind::Variable)?.value[1..].to_string();
                p.stream.skip_whitespace();
                if p.at_ellipsis() {
                    p.stream.advance(3);
                    list.rest = Some(name);
                    p.stream.skip_whitespace();
                    p.stream.consume_if(TokenKind::Comma);
                    continue;
                }
                let default = if p.stream.consume_if(TokenKind::Colon).is_some() {
                    p.stream.skip_whitespace();
                    Some(p.parse_space_list()?)
                } else {
                    None
                };
                list.params.push(Parameter { name, default });
                p.stream.skip_whitespace();
                if p.stream.consume_if(TokenKind::Comma).is_none() {
                    p.stream.consume(TokenKind::RParen)?;
                    break;
                }
            }
            Ok(list)
        })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Argument>> {
        self.stream.consume(TokenKind::LParen)?;
        self.with_stop_words(&[], |p| {
            let mut args = Vec::new();
            loop {
                p.stream.skip_whitespace();
                if p.stream.consume_if(TokenKind::RParen).is_some() {
                    break;
                }
                let name = if p.stream.matches(TokenKind::Variable)
                    && p.significant_from(1).kind == TokenKind::Colon
                {
                    let name = p.stream.current().value[1..].to_string();
                    p.stream.advance(1);
                    p.stream.skip_whitespace();
                    p.stream.consume(TokenKind::Colon)?;
                    p.stream.skip_whitespace();
                    Some(name)
                } else {
                    None
                };
                let value = p.parse_space_list()?;
                p.stream.skip_whitespace();
                let rest = p.at_ellipsis();
                if rest {
                    p.stream.advance(3);
                    p.stream.skip_whitespace();
                }
                args.push(Argument { name, value, rest });
                if p.stream.consume_if(TokenKind::Comma).is_none() {
                    p.stream.consume(TokenKind::RParen)?;
                    break;
                }
            }
            Ok(args)
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Parse an expression that must span the whole stream.
    fn parse_complete_expression(&mut self) -> Result<Expr> {
        self.stream.skip_whitespace();
        let expr = self.parse_expression()?;
        self.stream.skip_whitespace();
        if !self.stream.is_at_end() {
            return Err(self.unexpected("end of expression").into());
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_comma_list()
    }

    fn parse_comma_list(&mut self) -> Result<Expr> {
        let line = self.stream.current().line;
        let mut items = vec![self.parse_space_list()?];
        let mut saw_comma = false;
        loop {
            let saved = self.stream.get_position();
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::Comma).is_none() {
                self.stream.set_position(saved);
                break;
            }
            saw_comma = true;
            self.stream.skip_whitespace();
            if !self.starts_value() {
                break;
            }
            items.push(self.parse_space_list()?);
        }
        if !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Expr::List {
            items,
            separator: ListSeparator::Comma,
            bracketed: false,
            line,
        })
    }

    fn parse_space_list(&mut self) -> Result<Expr> {
        let line = self.stream.current().line;
        let mut items = vec![self.parse_or()?];
        loop {
            let saved = self.stream.get_position();
            self.stream.skip_whitespace();
            if !self.starts_value() {
                self.stream.set_position(saved);
                break;
            }
            items.push(self.parse_or()?);
        }
        if items.len() == 1 {
            return Ok(items.remove(0));
        }
        Ok(Expr::List {
            items,
            separator: ListSeparator::Space,
            bracketed: false,
            line,
        })
    }

    fn starts_value(&self) -> bool {
        let token = self.stream.current();
        match token.kind {
            TokenKind::Number
            | TokenKind::String
            | TokenKind::Hash
            | TokenKind::Variable
            | TokenKind::InterpolationStart
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Url
            | TokenKind::Ampersand
            | TokenKind::Minus
            | TokenKind::Plus => true,
            TokenKind::Flag => token.value.eq_ignore_ascii_case("!important"),
            TokenKind::Ident => !self.is_operator_word(token),
            _ => false,
        }
    }

    fn is_operator_word(&self, token: &Token) -> bool {
        token.is_ident("and")
            || token.is_ident("or")
            || self.stop_words.iter().any(|word| token.is_ident(word))
    }

    /// The keyword operator `word` at the next significant position.
    fn keyword_operator(&self, word: &str) -> bool {
        let token = self.significant_from(0);
        token.is_ident(word)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.keyword_operator("or") {
            let line = left.line();
            self.stream.skip_whitespace();
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.keyword_operator("and") {
            let line = left.line();
            self.stream.skip_whitespace();
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let saved = self.stream.get_position();
            self.stream.skip_whitespace();
            let op = match self.stream.current().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::LtE,
                TokenKind::Ge => BinOp::GtE,
                _ => {
                    self.stream.set_position(saved);
                    break;
                }
            };
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let right = self.parse_additive()?;
            let line = left.line();
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let saved = self.stream.get_position();
            let spaced = self.stream.skip_whitespace();
            let op = match self.stream.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => {
                    self.stream.set_position(saved);
                    break;
                }
            };
            // `a -b` is a list of `a` and `-b`, not a subtraction.
            if spaced && !self.stream.peek(1).kind.is_trivia() {
                self.stream.set_position(saved);
                break;
            }
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let right = self.parse_multiplicative()?;
            let line = left.line();
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let saved = self.stream.get_position();
            self.stream.skip_whitespace();
            let op = match self.stream.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => {
                    self.stream.set_position(saved);
                    break;
                }
            };
            self.stream.advance(1);
            self.stream.skip_whitespace();
            let right = self.parse_unary()?;
            let line = left.line();
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.stream.current().clone();
        match token.kind {
            TokenKind::Minus | TokenKind::Plus => {
                self.stream.advance(1);
                self.stream.skip_whitespace();
                let operand = self.parse_unary()?;
                let negate = token.kind == TokenKind::Minus;
                Ok(match operand {
                    Expr::Number {
                        value,
                        unit,
                        line,
                        column,
                    } => Expr::Number {
                        value: if negate { -value } else { value },
                        unit,
                        line,
                        column,
                    },
                    operand => Expr::Unary {
                        op: if negate { UnaryOp::Minus } else { UnaryOp::Plus },
                        operand: Box::new(operand),
                        line: token.line,
                    },
                })
            }
            TokenKind::Ident
                if token.is_ident("not")
                    && matches!(
                        self.stream.peek(1).kind,
                        TokenKind::Whitespace | TokenKind::LParen
                    ) =>
            {
                self.stream.advance(1);
                self.stream.skip_whitespace();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    line: token.line,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.stream.current().clone();
        let (line, column) = (token.line, token.column);
        match token.kind {
            TokenKind::Number => {
                self.stream.advance(1);
                let (value, unit) = split_number(&token.value).ok_or_else(|| {
                    LexError::InvalidNumber {
                        literal: token.value.clone(),
                        line,
                        column,
                    }
                })?;
                Ok(Expr::Number {
                    value,
                    unit,
                    line,
                    column,
                })
            }
            TokenKind::String => {
                self.stream.advance(1);
                let value = string_parts(&token.value[1..token.value.len() - 1], line, column + 1)?;
                Ok(Expr::StringLiteral { value, line })
            }
            TokenKind::Hash => {
                parse_hex_color(&token.value, line, column)?;
                self.stream.advance(1);
                Ok(Expr::HexColor {
                    value: token.value,
                    line,
                    column,
                })
            }
            TokenKind::Variable => {
                self.stream.advance(1);
                Ok(Expr::Variable {
                    name: token.value[1..].to_string(),
                    line,
                })
            }
            TokenKind::Url => {
                self.stream.advance(1);
                let inner = &token.value[4..token.value.len() - 1];
                let value = string_parts(inner, line, column + 4)?;
                Ok(Expr::Url { value, line })
            }
            TokenKind::Ampersand => {
                self.stream.advance(1);
                Ok(Expr::ParentSelector { line })
            }
            TokenKind::Flag if token.value.eq_ignore_ascii_case("!important") => {
                self.stream.advance(1);
                Ok(Expr::Important { line })
            }
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_bracketed(),
            TokenKind::InterpolationStart => self.parse_interpolated_identifier(),
            TokenKind::Ident => self.parse_identifier(token),
            _ => Err(self.unexpected("expression").into()),
        }
    }

    fn parse_identifier(&mut self, token: Token) -> Result<Expr> {
        let (line, column) = (token.line, token.column);
        let next = self.stream.peek(1).kind;
        if next == TokenKind::LParen {
            self.stream.advance(1);
            let args = self.parse_call_args()?;
            return Ok(Expr::FunctionCall {
                namespace: None,
                name: token.value,
                args,
                line,
            });
        }
        if next == TokenKind::Dot && self.stream.peek(2).kind == TokenKind::Variable {
            let name = self.stream.peek(2).value[1..].to_string();
            self.stream.advance(3);
            return Ok(Expr::PropertyAccess {
                namespace: token.value,
                name,
                line,
            });
        }
        if next == TokenKind::Dot
            && self.stream.peek(2).kind == TokenKind::Ident
            && self.stream.peek(3).kind == TokenKind::LParen
        {
            let name = self.stream.peek(2).value.clone();
            self.stream.advance(3);
            let args = self.parse_call_args()?;
            return Ok(Expr::FunctionCall {
                namespace: Some(token.value),
                name,
                args,
                line,
            });
        }
        if next == TokenKind::InterpolationStart {
            return self.parse_interpolated_identifier();
        }
        self.stream.advance(1);
        let lower = token.value.to_ascii_lowercase();
        Ok(match lower.as_str() {
            "true" => Expr::Boolean { value: true, line },
            "false" => Expr::Boolean { value: false, line },
            "null" => Expr::Null { line },
            _ if named_color(&lower).is_some() => Expr::ColorLiteral {
                name: token.value,
                line,
                column,
            },
            _ => Expr::Identifier {
                name: token.value,
                line,
                column,
            },
        })
    }

    /// `col-#{$i}`, `#{$a}-#{$b}`, `#{$name}px`: adjacent text and interpolations.
    fn parse_interpolated_identifier(&mut self) -> Result<Expr> {
        let line = self.stream.current().line;
        let mut interp = Interpolation {
            parts: Vec::new(),
            line,
        };
        let mut first = true;
        let mut after_expr = false;
        loop {
            let token = self.stream.current().clone();
            match token.kind {
                TokenKind::Ident if first || after_expr => {
                    interp.push_literal(&token.value);
                    self.stream.advance(1);
                    after_expr = false;
                }
                TokenKind::InterpolationStart => {
                    let expr = self.parse_interpolation_expr()?;
                    interp.push_expr(expr);
                    after_expr = true;
                }
                TokenKind::Minus
                    if after_expr
                        && self.stream.peek(1).kind == TokenKind::InterpolationStart =>
                {
                    interp.push_literal("-");
                    self.stream.advance(1);
                    after_expr = false;
                }
                _ => break,
            }
            first = false;
        }
        Ok(Expr::Interpolation(interp))
    }

    fn parse_parenthesized(&mut self) -> Result<Expr> {
        let line = self.stream.consume(TokenKind::LParen)?.line;
        self.with_stop_words(&[], |p| {
            p.stream.skip_whitespace();
            if p.stream.consume_if(TokenKind::RParen).is_some() {
                return Ok(Expr::List {
                    items: Vec::new(),
                    separator: ListSeparator::Space,
                    bracketed: false,
                    line,
                });
            }
            let first = p.parse_space_list()?;
            p.stream.skip_whitespace();
            if p.stream.consume_if(TokenKind::Colon).is_some() {
                return p.parse_map_rest(first, line);
            }
            let mut items = vec![first];
            let mut saw_comma = false;
            while p.stream.consume_if(TokenKind::Comma).is_some() {
                saw_comma = true;
                p.stream.skip_whitespace();
                if p.stream.matches(TokenKind::RParen) {
                    break;
                }
                items.push(p.parse_space_list()?);
                p.stream.skip_whitespace();
            }
            p.stream.consume(TokenKind::RParen)?;
            let inner = if saw_comma {
                Expr::List {
                    items,
                    separator: ListSeparator::Comma,
                    bracketed: false,
                    line,
                }
            } else {
                items.remove(0)
            };
            Ok(Expr::Paren {
                inner: Box::new(inner),
                line,
            })
        })
    }

    fn parse_map_rest(&mut self, first_key: Expr, line: usize) -> Result<Expr> {
        self.stream.skip_whitespace();
        let first_value = self.parse_space_list()?;
        let mut pairs = vec![(first_key, first_value)];
        loop {
            self.stream.skip_whitespace();
            if self.stream.consume_if(TokenKind::Comma).is_none() {
                break;
            }
            self.stream.skip_whitespace();
            if self.stream.matches(TokenKind::RParen) {
                break;
            }
            let key = self.parse_space_list()?;
            self.stream.skip_whitespace();
            self.stream.consume(TokenKind::Colon)?;
            self.stream.skip_whitespace();
            let value = self.parse_space_list()?;
            pairs.push((key, value));
        }
        self.stream.consume(TokenKind::RParen)?;
        Ok(Expr::Map { pairs, line })
    }

    fn parse_bracketed(&mut self) -> Result<Expr> {
        let line = self.stream.consume(TokenKind::LBracket)?.line;
        self.with_stop_words(&[], |p| {
            p.stream.skip_whitespace();
            if p.stream.consume_if(TokenKind::RBracket).is_some() {
                return Ok(Expr::List {
                    items: Vec::new(),
                    separator: ListSeparator::Space,
                    bracketed: true,
                    line,
                });
            }
            let inner = p.parse_expression()?;
            p.stream.skip_whitespace();
            p.stream.consume(TokenKind::RBracket)?;
            Ok(match inner {
                Expr::List {
                    items,
                    separator,
                    bracketed: false,
                    line,
                } => Expr::List {
                    items,
                    separator,
                    bracketed: true,
                    line,
                },
                single => Expr::List {
                    items: vec![single],
                    separator: ListSeparator::Space,
                    bracketed: true,
                    line,
                },
            })
        })
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// Parse a declaration value slice, peeling off a trailing `!important`.
/// A value the expression grammar rejects is kept as raw text unless it
/// references variables.
fn parse_value_tokens(mut tokens: Vec<Token>) -> Result<(Option<Expr>, bool)> {
    let flags = strip_trailing_flags(&mut tokens);
    let important = flags.iter().any(|f| f == "!important");
    if tokens.iter().all(|t| t.kind.is_trivia()) {
        return Ok((None, important));
    }
    let has_variables = tokens.iter().any(|t| t.kind == TokenKind::Variable);
    match Parser::from_tokens(tokens.clone()).parse_complete_expression() {
        Ok(expr) => Ok((Some(expr), important)),
        Err(SassError::Syntax(err)) if !has_variables => {
            tracing::trace!("keeping value as raw text: {}", err);
            let raw = Parser::from_tokens(tokens).parse_raw(&[], false)?;
            Ok((Some(Expr::Interpolation(raw)), important))
        }
        Err(err) => Err(err),
    }
}

/// Remove trailing `!flag` tokens (and the whitespace around them), returning
/// the flags in lowercase.
fn strip_trailing_flags(tokens: &mut Vec<Token>) -> Vec<String> {
    let mut flags = Vec::new();
    loop {
        while tokens.last().is_some_and(|t| t.kind.is_trivia()) {
            tokens.pop();
        }
        match tokens.last() {
            Some(t) if t.kind == TokenKind::Flag => {
                flags.push(t.value.to_ascii_lowercase());
                tokens.pop();
            }
            _ => break,
        }
    }
    flags
}

fn push_space(interp: &mut Interpolation) {
    match interp.parts.last() {
        None => {}
        Some(InterpolationPart::Literal(text)) if text.ends_with(' ') => {}
        Some(_) => interp.push_literal(" "),
    }
}

fn trim_interpolation(interp: &mut Interpolation) {
    if let Some(InterpolationPart::Literal(text)) = interp.parts.last_mut() {
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
        if text.is_empty() {
            interp.parts.pop();
        }
    }
    if let Some(InterpolationPart::Literal(text)) = interp.parts.first_mut() {
        *text = text.trim_start().to_string();
        if text.is_empty() {
            interp.parts.remove(0);
        }
    }
}

/// Split string contents on `#{...}`, parsing each interpolation body.
fn string_parts(content: &str, line: usize, column: usize) -> Result<Interpolation> {
    let chars: Vec<char> = content.chars().collect();
    let mut interp = Interpolation {
        parts: Vec::new(),
        line,
    };
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            literal.push(chars[i]);
            literal.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if chars[i] == '#' && chars.get(i + 1) == Some(&'{') {
            let close = find_interpolation_end(&chars, i + 2).ok_or_else(|| {
                SyntaxError::invalid("Unterminated interpolation", line, column + i)
            })?;
            if !literal.is_empty() {
                interp.push_literal(&literal);
                literal.clear();
            }
            let inner: String = chars[i + 2..close].iter().collect();
            let tokens = tokenize_at(&inner, line, column + i + 2)?;
            let expr = Parser::from_tokens(tokens).parse_complete_expression()?;
            interp.push_expr(expr);
            i = close + 1;
            continue;
        }
        literal.push(chars[i]);
        i += 1;
    }
    if !literal.is_empty() {
        interp.push_literal(&literal);
    }
    Ok(interp)
}

fn find_interpolation_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) if c == '\\' => i += 1,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// `10px` → `(10.0, Some("px"))`, `1e3` → `(1000.0, None)`.
pub fn split_number(text: &str) -> Option<(f64, Option<String>)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            end = exp;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }
    let value: f64 = text[..end].parse().ok()?;
    let unit = &text[end..];
    Some((value, (!unit.is_empty()).then(|| unit.to_string())))
}

fn is_plain_css_import(url: &str) -> bool {
    url.ends_with(".css")
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Node> {
        parse_stylesheet(source).unwrap().nodes
    }

    fn expr(source: &str) -> Expr {
        parse_expression(source).unwrap()
    }

    #[test]
    fn rule_with_declaration() {
        let nodes = parse(".a { color: red; }");
        let Node::Rule { selector, body, .. } = &nodes[0] else {
            panic!("expected rule, got {:?}", nodes[0]);
        };
        assert_eq!(selector.text.as_plain().unwrap(), ".a");
        assert!(matches!(&body[0], Node::Property(d) if d.property.as_plain().unwrap() == "color"));
    }

    #[test]
    fn pseudo_selector_is_not_a_declaration() {
        let nodes = parse("a:hover { color: red }");
        assert!(matches!(&nodes[0], Node::Rule { .. }));
    }

    #[test]
    fn nested_property_block() {
        let nodes = parse(".a { font: { family: serif; size: 12px; } }");
        let Node::Rule { body, .. } = &nodes[0] else { panic!() };
        let Node::Property(decl) = &body[0] else { panic!() };
        assert!(decl.value.is_none());
        assert_eq!(decl.nested.len(), 2);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expr::Binary { op, right, .. } = expr("1 + 2 * 3") else { panic!() };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let Expr::Binary { op, left, .. } = expr("$a + 1 == 3 and true") else { panic!() };
        assert_eq!(op, BinOp::And);
        assert!(matches!(*left, Expr::Binary { op: BinOp::Eq, .. }));
    }

    #[test]
    fn spaced_minus_before_number_starts_a_list_item() {
        let Expr::List { items, separator, .. } = expr("0 -10px") else { panic!() };
        assert_eq!(separator, ListSeparator::Space);
        assert!(matches!(items[1], Expr::Number { value, .. } if value == -10.0));
    }

    #[test]
    fn spaced_minus_is_subtraction() {
        assert!(matches!(expr("$a - 10px"), Expr::Binary { op: BinOp::Sub, .. }));
    }

    #[test]
    fn maps_and_lists() {
        assert!(matches!(expr("(a: 1, b: 2)"), Expr::Map { pairs, .. } if pairs.len() == 2));
        assert!(matches!(expr("a, b c"), Expr::List { separator: ListSeparator::Comma, .. }));
        assert!(matches!(expr("[a b]"), Expr::List { bracketed: true, .. }));
    }

    #[test]
    fn namespaced_members() {
        assert!(matches!(expr("math.$pi"), Expr::PropertyAccess { .. }));
        assert!(matches!(
            expr("math.div(10px, 2)"),
            Expr::FunctionCall { namespace: Some(ns), .. } if ns == "math"
        ));
    }

    #[test]
    fn for_loop_bounds_stop_at_keyword() {
        let nodes = parse("@for $i from 1 through $n { }");
        assert!(matches!(&nodes[0], Node::For { inclusive: true, .. }));
        let nodes = parse("@for $i from 1 to 3 { }");
        assert!(matches!(&nodes[0], Node::For { inclusive: false, .. }));
    }

    #[test]
    fn if_else_chain() {
        let nodes = parse("@if $a { } @else if $b { } @else { }");
        let Node::If { conditions, .. } = &nodes[0] else { panic!() };
        assert_eq!(conditions.len(), 3);
        assert!(conditions[2].test.is_none());
    }

    #[test]
    fn variable_flags() {
        let nodes = parse("$x: 1 !default;\n$y: 2 !global;");
        assert!(matches!(&nodes[0], Node::VariableDecl { default: true, global: false, .. }));
        assert!(matches!(&nodes[1], Node::VariableDecl { default: false, global: true, .. }));
    }

    #[test]
    fn interpolated_selector_and_property() {
        let nodes = parse(".col-#{$i} { #{$side}-margin: 1px; }");
        let Node::Rule { selector, body, .. } = &nodes[0] else { panic!() };
        assert_eq!(selector.text.parts.len(), 2);
        assert!(matches!(&body[0], Node::Property(_)));
    }

    #[test]
    fn media_query_embeds_variables() {
        let nodes = parse("@media (min-width: $bp) { }");
        let Node::Media { query, .. } = &nodes[0] else { panic!() };
        assert!(query
            .parts
            .iter()
            .any(|p| matches!(p, InterpolationPart::Expr(Expr::Variable { .. }))));
    }

    #[test]
    fn use_and_forward_clauses() {
        let nodes = parse("@use \"sass:math\" as m;\n@forward \"src/list\" as list-* hide reset;");
        assert!(matches!(&nodes[0], Node::Use { namespace: Some(ns), .. } if ns == "m"));
        let Node::Forward { prefix, filter, .. } = &nodes[1] else { panic!() };
        assert_eq!(prefix.as_deref(), Some("list-"));
        assert_eq!(filter, &Some(ForwardFilter::Hide(vec!["reset".to_string()])));
    }

    #[test]
    fn css_imports_stay_at_rules() {
        let nodes = parse("@import \"theme.css\";\n@import \"partial\";");
        assert!(matches!(&nodes[0], Node::AtRule { name, .. } if name == "import"));
        assert!(matches!(&nodes[1], Node::Import { urls, .. } if urls == &["partial"]));
    }

    #[test]
    fn unparseable_value_falls_back_to_raw_text() {
        let nodes = parse(".a { filter: progid:DXImage.Alpha(opacity=50); }");
        let Node::Rule { body, .. } = &nodes[0] else { panic!() };
        let Node::Property(decl) = &body[0] else { panic!() };
        assert!(matches!(&decl.value, Some(Expr::Interpolation(_))));
    }

    #[test]
    fn malformed_color_is_a_lexical_error() {
        let err = parse_stylesheet(".a { color: #ggg; }").unwrap_err();
        assert!(matches!(err, SassError::Lex(LexError::Color(_))));
    }

    #[test]
    fn missing_brace_reports_location() {
        let err = parse_stylesheet(".a { color: red;").unwrap_err();
        assert!(matches!(err, SassError::Syntax(SyntaxError::UnexpectedEof { .. })));
    }

    #[test]
    fn mixin_signature() {
        let (name, params) = parse_signature("button($size: 10px, $args...)").unwrap();
        assert_eq!(name, "button");
        assert_eq!(params.params.len(), 1);
        assert_eq!(params.rest.as_deref(), Some("args"));
    }

    #[test]
    fn number_splitting() {
        assert_eq!(split_number("10px"), Some((10.0, Some("px".to_string()))));
        assert_eq!(split_number("1.5e2"), Some((150.0, None)));
        assert_eq!(split_number("50%"), Some((50.0, Some("%".to_string()))));
    }
}
