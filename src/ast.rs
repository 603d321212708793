//! Abstract syntax tree produced by the parser.
//!
//! Each construct is its own variant carrying only the fields its grammar
//! allows. Nodes own their children; nothing is shared between parents.

/// The set of supported binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtE,
    GtE,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtE => "<=",
            BinOp::GtE => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// The set of supported unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,   // not
    Plus,  // +x
    Minus, // -x
}

/// How list members are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSeparator {
    Space,
    Comma,
    Slash,
}

impl ListSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            ListSeparator::Space => " ",
            ListSeparator::Comma => ", ",
            ListSeparator::Slash => " / ",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListSeparator::Space => "space",
            ListSeparator::Comma => "comma",
            ListSeparator::Slash => "slash",
        }
    }
}

/// Text with embedded `#{...}` expressions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolation {
    pub parts: Vec<InterpolationPart>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

impl Interpolation {
    pub fn literal(text: impl Into<String>, line: usize) -> Self {
        Self {
            parts: vec![InterpolationPart::Literal(text.into())],
            line,
        }
    }

    /// The literal text when no expression is embedded.
    pub fn as_plain(&self) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                InterpolationPart::Literal(text) => out.push_str(text),
                InterpolationPart::Expr(_) => return None,
            }
        }
        Some(out)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|part| match part {
            InterpolationPart::Literal(text) => text.is_empty(),
            InterpolationPart::Expr(_) => false,
        })
    }

    pub fn push_literal(&mut self, text: &str) {
        if let Some(InterpolationPart::Literal(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(InterpolationPart::Literal(text.to_string()));
        }
    }

    pub fn push_expr(&mut self, expr: Expr) {
        self.parts.push(InterpolationPart::Expr(expr));
    }
}

/// One argument at a call site: positional, `$name: value`, or `$list...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
    pub rest: bool,
}

/// One parameter of a mixin or function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterList {
    pub params: Vec<Parameter>,
    /// Name of the trailing `$rest...` parameter.
    pub rest: Option<String>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A number with an optional unit.
    Number {
        value: f64,
        unit: Option<String>,
        line: usize,
        column: usize,
    },
    /// A quoted string, possibly interpolated.
    StringLiteral { value: Interpolation, line: usize },
    /// An unquoted identifier such as `solid` or `auto`.
    Identifier {
        name: String,
        line: usize,
        column: usize,
    },
    /// An unquoted identifier containing `#{...}`.
    Interpolation(Interpolation),
    /// `#fff`, `#336699cc`.
    HexColor {
        value: String,
        line: usize,
        column: usize,
    },
    /// A named CSS color such as `red`.
    ColorLiteral {
        name: String,
        line: usize,
        column: usize,
    },
    Boolean { value: bool, line: usize },
    Null { line: usize },
    Variable { name: String, line: usize },
    /// `module.$name`
    PropertyAccess {
        namespace: String,
        name: String,
        line: usize,
    },
    List {
        items: Vec<Expr>,
        separator: ListSeparator,
        bracketed: bool,
        line: usize,
    },
    Map {
        pairs: Vec<(Expr, Expr)>,
        line: usize,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },
    /// `( expr )`, kept so `/` inside parentheses divides.
    Paren { inner: Box<Expr>, line: usize },
    FunctionCall {
        namespace: Option<String>,
        name: String,
        args: Vec<Argument>,
        line: usize,
    },
    /// `url(...)` with unquoted, possibly interpolated contents.
    Url { value: Interpolation, line: usize },
    /// `&` used as a value.
    ParentSelector { line: usize },
    /// `!important` inside a value.
    Important { line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Number { line, .. }
            | Expr::StringLiteral { line, .. }
            | Expr::Identifier { line, .. }
            | Expr::HexColor { line, .. }
            | Expr::ColorLiteral { line, .. }
            | Expr::Boolean { line, .. }
            | Expr::Null { line }
            | Expr::Variable { line, .. }
            | Expr::PropertyAccess { line, .. }
            | Expr::List { line, .. }
            | Expr::Map { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Paren { line, .. }
            | Expr::FunctionCall { line, .. }
            | Expr::Url { line, .. }
            | Expr::ParentSelector { line }
            | Expr::Important { line } => *line,
            Expr::Interpolation(interp) => interp.line,
        }
    }

    /// Whether `/` touching this operand means division rather than a separator.
    pub fn is_calculated(&self) -> bool {
        matches!(
            self,
            Expr::Variable { .. }
                | Expr::PropertyAccess { .. }
                | Expr::FunctionCall { .. }
                | Expr::Paren { .. }
                | Expr::Unary { .. }
        ) || matches!(self, Expr::Binary { op, .. } if *op != BinOp::Div)
            || matches!(self, Expr::Binary { op: BinOp::Div, left, right, .. }
                if left.is_calculated() || right.is_calculated())
    }
}

/// A selector as written, before parent resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub text: Interpolation,
    pub line: usize,
}

/// One `@if`/`@else if`/`@else` branch; `test` is `None` for the final `@else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub test: Option<Expr>,
    pub body: Vec<Node>,
    pub line: usize,
}

/// A `from`/`50%`/`to` block inside `@keyframes`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeBlock {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub line: usize,
}

/// `property: value` inside a rule, optionally with nested properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: Interpolation,
    pub value: Option<Expr>,
    pub important: bool,
    pub nested: Vec<Node>,
    pub line: usize,
}

/// `with (...)` / `without (...)` clause of `@at-root`.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRootQuery {
    With(Vec<String>),
    Without(Vec<String>),
}

/// Which directive emitted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Debug,
    Warn,
    Error,
}

/// `@content` block passed to `@include`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub params: ParameterList,
    pub body: Vec<Node>,
}

/// `show`/`hide` clause of `@forward`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardFilter {
    Show(Vec<String>),
    Hide(Vec<String>),
}

/// A statement-level node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `selector { ... }`
    Rule {
        selector: Selector,
        body: Vec<Node>,
        line: usize,
    },
    /// `property: value;`
    Property(Declaration),
    /// `--name: raw tokens;`
    CustomProperty {
        name: Interpolation,
        value: Interpolation,
        line: usize,
    },
    /// `$name: value [!default] [!global];`
    VariableDecl {
        namespace: Option<String>,
        name: String,
        value: Expr,
        default: bool,
        global: bool,
        line: usize,
    },
    /// An at-rule the parser has no dedicated grammar for.
    AtRule {
        name: String,
        value: Interpolation,
        body: Option<Vec<Node>>,
        line: usize,
    },
    AtRoot {
        selector: Option<Selector>,
        query: Option<AtRootQuery>,
        body: Vec<Node>,
        line: usize,
    },
    Media {
        query: Interpolation,
        body: Vec<Node>,
        line: usize,
    },
    Supports {
        condition: Interpolation,
        body: Vec<Node>,
        line: usize,
    },
    Container {
        query: Interpolation,
        body: Vec<Node>,
        line: usize,
    },
    Keyframes {
        /// `keyframes`, `-webkit-keyframes`, ...
        keyword: String,
        name: Interpolation,
        blocks: Vec<KeyframeBlock>,
        line: usize,
    },
    /// `/* ... */`
    Comment { text: String, line: usize },
    If {
        conditions: Vec<Condition>,
        line: usize,
    },
    Each {
        variables: Vec<String>,
        list: Expr,
        body: Vec<Node>,
        line: usize,
    },
    For {
        variable: String,
        from: Expr,
        to: Expr,
        inclusive: bool,
        body: Vec<Node>,
        line: usize,
    },
    While {
        condition: Expr,
        body: Vec<Node>,
        line: usize,
    },
    MixinDef {
        name: String,
        params: ParameterList,
        body: Vec<Node>,
        line: usize,
    },
    FunctionDef {
        name: String,
        params: ParameterList,
        body: Vec<Node>,
        line: usize,
    },
    Return { value: Expr, line: usize },
    Include {
        namespace: Option<String>,
        name: String,
        args: Vec<Argument>,
        content: Option<ContentBlock>,
        line: usize,
    },
    Content { args: Vec<Argument>, line: usize },
    Use {
        url: String,
        namespace: Option<String>,
        config: Vec<(String, Expr)>,
        line: usize,
    },
    Forward {
        url: String,
        prefix: Option<String>,
        filter: Option<ForwardFilter>,
        line: usize,
    },
    /// `@import` of Sass files; plain-CSS imports become [`Node::AtRule`].
    Import { urls: Vec<String>, line: usize },
    Message {
        kind: MessageKind,
        value: Expr,
        line: usize,
    },
    Extend {
        selector: Interpolation,
        optional: bool,
        line: usize,
    },
}

impl Node {
    pub fn line(&self) -> usize {
        match self {
            Node::Property(decl) => decl.line,
            Node::Rule { line, .. }
            | Node::CustomProperty { line, .. }
            | Node::VariableDecl { line, .. }
            | Node::AtRule { line, .. }
            | Node::AtRoot { line, .. }
            | Node::Media { line, .. }
            | Node::Supports { line, .. }
            | Node::Container { line, .. }
            | Node::Keyframes { line, .. }
            | Node::Comment { line, .. }
            | Node::If { line, .. }
            | Node::Each { line, .. }
            | Node::For { line, .. }
            | Node::While { line, .. }
            | Node::MixinDef { line, .. }
            | Node::FunctionDef { line, .. }
            | Node::Return { line, .. }
            | Node::Include { line, .. }
            | Node::Content { line, .. }
            | Node::Use { line, .. }
            | Node::Forward { line, .. }
            | Node::Import { line, .. }
            | Node::Message { line, .. }
            | Node::Extend { line, .. } => *line,
        }
    }
}

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}
