//! A Sass/SCSS to CSS compiler.
//!
//! ```no_run
//! use sass_compiler::{Compiler, CompilerOptions};
//!
//! let mut compiler = Compiler::new(CompilerOptions::default());
//! let css = compiler.compile_string("$w: 10px; .a { width: $w * 2; }", None)?;
//! assert!(css.contains("width: 20px;"));
//! # Ok::<(), sass_compiler::SassError>(())
//! ```

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod normalizer;
pub mod options;
pub mod parser;
pub mod source_map;
pub mod text_reflow;
pub mod token_stream;

pub use compiler::values::Value;
pub use compiler::{Compiler, CustomFunction};
pub use error::{
    display_error, CompileError, CompileErrorKind, ConfigurationError, LexError, SassError,
    SyntaxError,
};
pub use loader::{FileLoader, LoadedFile, Loader, MemoryLoader};
pub use normalizer::Syntax;
pub use options::{CompilerOptions, OutputStyle, PartialCompilerOptions};
pub use source_map::{Mapping, SourceMap};
