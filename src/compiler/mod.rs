//! Compiler Module
//!
//! The [`Compiler`] facade ties the pipeline together: normalize the source
//! syntax, parse, generate CSS, then apply the output style and collect
//! source mappings.
//!
//! ## Architecture
//! - `values`: runtime values and their arithmetic/formatting
//! - `runtime`: the builtin function registry
//! - `functions`: builtin function handlers (`math`, `list`, `map`, colors, gradients)
//! - `strategies`: at-rule compilation strategies
//! - `generators`: expression and statement helpers for [`CodeGen`]
//!
//! A `Compiler` can run any number of compilations; per-compilation state
//! (scopes, module cache) lives in a fresh [`CodeGen`] each time.

pub mod functions;
pub mod generators;
pub mod runtime;
pub mod strategies;
pub mod values;

use indexmap::IndexMap;

use crate::codegen::CodeGen;
use crate::error::{CompileError, Result};
use crate::loader::{FileLoader, Loader};
use crate::normalizer::{self, Syntax};
use crate::options::CompilerOptions;
use crate::parser::parse_stylesheet;
use crate::source_map::{self, Mapping, SourceMap};
use crate::text_reflow::compress;

use runtime::{normalize_name, FunctionRegistry};
use strategies::StrategyRegistry;
use values::Value;

/// A global function supplied by the embedding application.
pub type CustomFunction = Box<dyn Fn(&[Value]) -> std::result::Result<Value, CompileError>>;

pub struct Compiler {
    options: CompilerOptions,
    registry: FunctionRegistry,
    strategies: StrategyRegistry,
    functions: IndexMap<String, CustomFunction>,
    loader: Box<dyn Loader>,
    mappings: Vec<Mapping>,
    /// Entry file name and text of the last compilation.
    entry: Option<(String, String)>,
}

impl Compiler {
    /// A compiler reading imports from disk through `options.load_paths`.
    pub fn new(options: CompilerOptions) -> Self {
        let loader = FileLoader::new(options.load_paths.clone());
        Self::with_loader(options, loader)
    }

    pub fn with_loader(options: CompilerOptions, loader: impl Loader + 'static) -> Self {
        Self {
            options,
            registry: FunctionRegistry::with_builtins(),
            strategies: StrategyRegistry::default(),
            functions: IndexMap::new(),
            loader: Box::new(loader),
            mappings: Vec::new(),
            entry: None,
        }
    }

    /// Register a global function callable from stylesheets. User
    /// `@function`s with the same name take precedence.
    pub fn add_function<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, CompileError> + 'static,
    {
        self.functions.insert(normalize_name(name), Box::new(callback));
    }

    /// Compile stylesheet text; `syntax` defaults to SCSS.
    pub fn compile_string(&mut self, source: &str, syntax: Option<Syntax>) -> Result<String> {
        let file = self.options.source_file.clone();
        self.compile_source(source, syntax.unwrap_or_default(), &file)
    }

    /// Compile the stylesheet the loader resolves `path` to.
    pub fn compile_file(&mut self, path: &str) -> Result<String> {
        let file = self.loader.load(path)?;
        self.compile_source(&file.contents, file.syntax, &file.path)
    }

    fn compile_source(&mut self, source: &str, syntax: Syntax, file: &str) -> Result<String> {
        let scss = normalizer::normalize(source, syntax);
        let stylesheet = parse_stylesheet(&scss)?;
        tracing::debug!("parsed {} top-level nodes from {}", stylesheet.nodes.len(), file);

        let (css, pending) = {
            let mut codegen = CodeGen::new(
                &self.options,
                &self.registry,
                &self.functions,
                self.loader.as_ref(),
                &self.strategies,
                file,
            );
            let css = codegen.compile_stylesheet(&stylesheet)?;
            (css, codegen.take_mappings())
        };
        let mut css = if self.options.is_compressed() {
            compress(&css)
        } else {
            css
        };

        self.mappings = if self.options.source_map {
            source_map::resolve(&css, &pending)
        } else {
            Vec::new()
        };
        self.entry = Some((file.to_string(), source.to_string()));
        if let (true, Some(map_file)) = (self.options.source_map, &self.options.source_map_file) {
            if !self.options.is_compressed() {
                css.push('\n');
            }
            css.push_str(&format!("/*# sourceMappingURL={} */", map_file));
        }
        Ok(css)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Mapping entries of the last compilation; empty unless `source_map`
    /// is enabled.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// The last compilation's mappings as a source map document.
    pub fn source_map(&self) -> SourceMap {
        let mut map = SourceMap::new(self.options.output_file.clone());
        for mapping in &self.mappings {
            if map.sources.contains(&mapping.source) {
                continue;
            }
            let content = if !self.options.include_sources {
                None
            } else {
                match &self.entry {
                    Some((name, text)) if *name == mapping.source => Some(text.clone()),
                    _ => self.loader.load(&mapping.source).ok().map(|file| file.contents),
                }
            };
            map.add_source(&mapping.source, content);
        }
        map.mappings = self.mappings.clone();
        map
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}
