use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Result alias used across the compiler pipeline.
pub type Result<T> = std::result::Result<T, SassError>;

/// A malformed color literal such as `#ggg` or `#12345`.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid color literal `{literal}` at {line}:{column}")]
pub struct ColorLiteralError {
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LexError {
    #[error("Unterminated string literal starting at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("Unterminated comment starting at {line}:{column}")]
    UnterminatedComment { line: usize, column: usize },
    #[error("Malformed numeric literal `{literal}` at {line}:{column}")]
    InvalidNumber {
        literal: String,
        line: usize,
        column: usize,
    },
    #[error(transparent)]
    Color(#[from] ColorLiteralError),
}

impl LexError {
    pub fn location(&self) -> (usize, usize) {
        match self {
            LexError::UnterminatedString { line, column }
            | LexError::UnterminatedComment { line, column }
            | LexError::InvalidNumber { line, column, .. } => (*line, *column),
            LexError::Color(err) => (err.line, err.column),
        }
    }
}

/// Errors raised by the parser for malformed constructs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyntaxError {
    #[error("Expected {expected}, found {found} at {line}:{column}")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("Unexpected end of input, expected {expected} at {line}:{column}")]
    UnexpectedEof {
        expected: String,
        line: usize,
        column: usize,
    },
    #[error("{message} at {line}:{column}")]
    Invalid {
        message: String,
        line: usize,
        column: usize,
    },
}

impl SyntaxError {
    pub fn invalid(message: impl Into<String>, line: usize, column: usize) -> Self {
        SyntaxError::Invalid {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn location(&self) -> (usize, usize) {
        match self {
            SyntaxError::Unexpected { line, column, .. }
            | SyntaxError::UnexpectedEof { line, column, .. }
            | SyntaxError::Invalid { line, column, .. } => (*line, *column),
        }
    }
}

/// What went wrong while evaluating a stylesheet.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileErrorKind {
    #[error("File to import not found or unreadable: {0}")]
    FileNotFound(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Incompatible units: {left} and {right}")]
    IncompatibleUnits { left: String, right: String },
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Undefined variable: ${0}")]
    UndefinedVariable(String),
    #[error("Undefined mixin: {0}")]
    UndefinedMixin(String),
    #[error("Unknown module: {0}")]
    UnknownModule(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Undefined operation: {0}")]
    UndefinedOperation(String),
    #[error("@return is only allowed within function bodies")]
    ReturnOutsideFunction,
    #[error("Function {0} finished without @return")]
    MissingReturn(String),
    #[error("Module loop: {0} is already being loaded")]
    ModuleLoop(String),
    #[error("{0}")]
    User(String),
}

/// A semantic error together with the place it was raised.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} ({file}:{line})")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub file: String,
    pub line: usize,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind) -> Self {
        Self {
            kind,
            file: "unknown".to_string(),
            line: 0,
        }
    }

    /// Attach a location unless one was already recorded closer to the fault.
    pub fn at(mut self, file: &str, line: usize) -> Self {
        if self.line == 0 {
            self.file = file.to_string();
            self.line = line;
        }
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::InvalidArgument(message.into()))
    }
}

impl From<CompileErrorKind> for CompileError {
    fn from(kind: CompileErrorKind) -> Self {
        CompileError::new(kind)
    }
}

/// Wiring mistakes between rule strategies and the compilation context.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Strategy `{strategy}` requires the `{capability}` capability, which the context does not provide")]
    MissingCapability {
        strategy: &'static str,
        capability: &'static str,
    },
    #[error("No rule strategy handles `{0}`")]
    NoStrategy(String),
}

/// Every failure the compiler can surface.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SassError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl From<ColorLiteralError> for SassError {
    fn from(err: ColorLiteralError) -> Self {
        SassError::Lex(LexError::Color(err))
    }
}

impl From<CompileErrorKind> for SassError {
    fn from(kind: CompileErrorKind) -> Self {
        SassError::Compile(CompileError::new(kind))
    }
}

impl SassError {
    /// Line and column of the fault, when the error carries them.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SassError::Lex(err) => Some(err.location()),
            SassError::Syntax(err) => Some(err.location()),
            SassError::Compile(err) if err.line > 0 => Some((err.line, 1)),
            _ => None,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            SassError::Lex(_) => "Lexical error",
            SassError::Syntax(_) => "Syntax error",
            SassError::Compile(_) => "Compilation error",
            SassError::Configuration(_) => "Configuration error",
        }
    }
}

/// Convert a 1-based line/column pair into a character offset.
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split('\n').enumerate() {
        if index + 1 == line {
            return offset + column.saturating_sub(1).min(text.chars().count());
        }
        offset += text.chars().count() + 1;
    }
    source.chars().count()
}

/// Display a compiler error with ariadne formatting
pub fn display_error(source: &str, filename: &str, error: &SassError) -> std::io::Result<()> {
    let (line, column) = error.location().unwrap_or((1, 1));
    let offset = offset_of(source, line, column);
    let end_offset = std::cmp::min(offset + 1, source.chars().count().max(1));

    Report::build(ReportKind::Error, filename, offset)
        .with_message(error.title())
        .with_label(
            Label::new((filename, offset..end_offset))
                .with_message(format!("{}:{}: {}", line, column, error))
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)))
}
