//! CSS Code Generator
//!
//! [`CodeGen`] walks a parsed stylesheet and renders CSS text. One instance
//! serves one compilation: it owns the variable scopes, the mixin and
//! function definitions, the module cache and any CSS hoisted to the root.
//!
//! ## Architecture
//! - **Environments**: every module (the entry stylesheet included) owns an
//!   [`Environment`] holding its global variables, mixins, functions and the
//!   modules it pulled in with `@use`/`@forward`. Callables remember the
//!   environment they were defined in.
//! - **Frames**: block-local variables live in a stack of frames above the
//!   environment. Rules and control-flow bodies push a frame; mixin and
//!   function calls swap in a fresh stack on top of the callee's environment.
//! - **Bodies**: a block compiles into a [`Body`]: declarations that belong to
//!   the enclosing selector, and blocks (nested rules, at-rules) rendered at
//!   the body's own level. Nested rules are flattened, so a rule's blocks are
//!   emitted right after the rule itself.
//! - **At-rules** that shape their surroundings are handed to the
//!   [`StrategyRegistry`] with `self` as the [`CompilerServices`] provider.
//!
//! Expression evaluation lives in [`crate::compiler::generators::expression`]
//! and statement helpers in [`crate::compiler::generators::statement`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{
    Argument, ContentBlock, Expr, ForwardFilter, Interpolation, Node, ParameterList, Selector,
    Stylesheet,
};
use crate::compiler::generators::{expression, statement};
use crate::compiler::runtime::{normalize_name, CallArgs, FunctionRegistry};
use crate::compiler::strategies::{at_root, indent, Body, CompilerServices, StrategyRegistry};
use crate::compiler::values::{Value, ValueFormatter};
use crate::compiler::CustomFunction;
use crate::error::{CompileError, CompileErrorKind, Result, SassError};
use crate::loader::{LoadedFile, Loader};
use crate::normalizer;
use crate::options::{CompilerOptions, OutputStyle};
use crate::parser::parse_stylesheet;
use crate::source_map::PendingMapping;
use crate::text_reflow::split_top_level;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `%name` anywhere in a compound selector.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[\w-]").unwrap());

// ============================================================================
// Scopes and callables
// ============================================================================

/// A `@mixin` or `@function` definition.
pub struct Callable {
    pub name: String,
    pub params: ParameterList,
    pub body: Rc<Vec<Node>>,
    env: Weak<RefCell<Environment>>,
}

/// A loaded user module.
pub struct Module {
    pub path: String,
    pub env: Rc<RefCell<Environment>>,
}

/// What a namespace refers to.
#[derive(Clone)]
pub enum ModuleRef {
    /// `sass:math`, `sass:map`, ...
    Builtin(String),
    User(Rc<Module>),
}

/// A module re-exported with `@forward`.
#[derive(Clone)]
pub struct Forward {
    module: ModuleRef,
    prefix: Option<String>,
    filter: Option<ForwardFilter>,
}

impl Forward {
    /// The member's name inside the forwarded module when `name` is visible
    /// through this forward. `sigil` is `$` for variables.
    fn expose<'n>(&self, name: &'n str, sigil: &str) -> Option<&'n str> {
        let visible = format!("{}{}", sigil, name);
        let listed = |names: &[String]| names.iter().any(|n| normalize_name(n) == visible);
        match &self.filter {
            Some(ForwardFilter::Show(names)) if !listed(names) => return None,
            Some(ForwardFilter::Hide(names)) if listed(names) => return None,
            _ => {}
        }
        match &self.prefix {
            Some(prefix) => name.strip_prefix(normalize_name(prefix).as_str()),
            None => Some(name),
        }
    }
}

/// Module-level definitions.
#[derive(Default)]
pub struct Environment {
    pub variables: IndexMap<String, Value>,
    pub mixins: IndexMap<String, Rc<Callable>>,
    pub functions: IndexMap<String, Rc<Callable>>,
    pub namespaces: IndexMap<String, ModuleRef>,
    /// Modules brought in with `@use ... as *`.
    pub star_modules: Vec<ModuleRef>,
    pub forwards: Vec<Forward>,
}

/// Block-local variables.
#[derive(Default)]
pub(crate) struct Frame {
    variables: IndexMap<String, Value>,
    /// Control-flow blocks outside any rule assign straight to module globals.
    semi_global: bool,
}

/// The caller state an `@include` left behind, restored while its
/// `@content` block runs.
struct ContentFrame {
    block: Option<Rc<ContentBlock>>,
    env: Rc<RefCell<Environment>>,
    frames: Vec<Frame>,
}

/// What a function name resolved to.
pub(crate) enum FunctionTarget {
    User(Rc<Callable>),
    /// A builtin module (`math`, `meta`, ...) that knows the name.
    Builtin(String),
}

// ============================================================================
// Code generator
// ============================================================================

pub struct CodeGen<'a> {
    options: &'a CompilerOptions,
    pub(crate) registry: &'a FunctionRegistry,
    pub(crate) callbacks: &'a IndexMap<String, CustomFunction>,
    loader: &'a dyn Loader,
    strategies: &'a StrategyRegistry,
    pub(crate) formatter: ValueFormatter,
    pub(crate) env: Rc<RefCell<Environment>>,
    pub(crate) frames: Vec<Frame>,
    content_stack: Vec<ContentFrame>,
    modules: HashMap<String, Rc<Module>>,
    /// Files currently being loaded, innermost last.
    loading: Vec<String>,
    pub(crate) current_file: String,
    /// Fully resolved selector of the enclosing rule.
    pub(crate) selector: Option<String>,
    media_query: Option<String>,
    hoisted: Vec<String>,
    pending: Vec<PendingMapping>,
}

impl<'a> CodeGen<'a> {
    pub fn new(
        options: &'a CompilerOptions,
        registry: &'a FunctionRegistry,
        callbacks: &'a IndexMap<String, CustomFunction>,
        loader: &'a dyn Loader,
        strategies: &'a StrategyRegistry,
        file: &str,
    ) -> Self {
        Self {
            options,
            registry,
            callbacks,
            loader,
            strategies,
            formatter: ValueFormatter::new(options.style == OutputStyle::Compressed),
            env: Rc::new(RefCell::new(Environment::default())),
            frames: Vec::new(),
            content_stack: Vec::new(),
            modules: HashMap::new(),
            loading: vec![file.to_string()],
            current_file: file.to_string(),
            selector: None,
            media_query: None,
            hoisted: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Compile the entry stylesheet. Top-level statements are separated by a
    /// blank line; CSS hoisted out of `@media` by `@at-root` closes the output.
    pub fn compile_stylesheet(&mut self, stylesheet: &Stylesheet) -> Result<String> {
        let mut chunks = self.compile_root(&stylesheet.nodes)?;
        chunks.append(&mut self.hoisted);
        tracing::debug!("generated {} top-level chunks", chunks.len());
        Ok(chunks.join("\n"))
    }

    /// Style rule headers emitted so far, for source mapping.
    pub fn take_mappings(&mut self) -> Vec<PendingMapping> {
        std::mem::take(&mut self.pending)
    }

    pub fn options(&self) -> &CompilerOptions {
        self.options
    }

    fn compile_root(&mut self, nodes: &[Node]) -> Result<Vec<String>> {
        let mut chunks = Vec::new();
        for node in nodes {
            let body = self.compile_block(std::slice::from_ref(node), None, 0)?;
            if !body.declarations.is_empty() {
                chunks.push(self.format_declarations(&body.declarations, 0));
            }
            chunks.extend(body.blocks.into_iter().filter(|block| !block.is_empty()));
        }
        Ok(chunks)
    }

    /// Compile `nodes` as the body of `selector`, nested rules at `level`.
    pub fn compile_block(
        &mut self,
        nodes: &[Node],
        selector: Option<&str>,
        level: usize,
    ) -> Result<Body> {
        let saved = std::mem::replace(&mut self.selector, selector.map(str::to_string));
        let result = self.compile_nodes(nodes, level);
        self.selector = saved;
        result
    }

    pub(crate) fn compile_nodes(&mut self, nodes: &[Node], level: usize) -> Result<Body> {
        let mut body = Body::default();
        for node in nodes {
            self.compile_node(node, level, &mut body)
                .map_err(|err| self.locate(err, node.line()))?;
        }
        Ok(body)
    }

    /// Attach the current file and `line` to a compile error lacking a location.
    pub(crate) fn locate(&self, err: SassError, line: usize) -> SassError {
        match err {
            SassError::Compile(err) => SassError::Compile(err.at(&self.current_file, line)),
            other => other,
        }
    }

    fn compile_node(&mut self, node: &Node, level: usize, out: &mut Body) -> Result<()> {
        let parent = self.selector.clone();
        match node {
            Node::Rule {
                selector, body, ..
            } => {
                let css = self.compile_rule(selector, body, level)?;
                push_block(out, css);
            }
            Node::Property(declaration) => {
                let lines = statement::compile_declaration(self, declaration, None)?;
                out.declarations.extend(lines);
            }
            Node::CustomProperty { name, value, .. } => {
                let name = self.interpolate(name)?;
                let value = self.interpolate(value)?;
                out.declarations.push(format!("{}: {};", name, value));
            }
            Node::VariableDecl {
                namespace,
                name,
                value,
                default,
                global,
                ..
            } => statement::compile_variable_decl(
                self,
                namespace.as_deref(),
                name,
                value,
                *default,
                *global,
            )?,
            Node::Comment { text, .. } => {
                if parent.is_some() {
                    out.declarations.push(text.clone());
                } else {
                    out.blocks.push(format!("{}{}\n", indent(level), text));
                }
            }
            Node::FunctionDef {
                name, params, body, ..
            } => self.define_function(name, params.clone(), body.clone()),
            Node::Return { .. } => return Err(CompileErrorKind::ReturnOutsideFunction.into()),
            Node::If { .. } | Node::Each { .. } | Node::For { .. } | Node::While { .. } => {
                // This runner never breaks, so the flow is always `Continue`.
                let _flow = statement::compile_control(self, node, &mut |cg, nodes| {
                    out.extend(cg.compile_nodes(nodes, level)?);
                    Ok(ControlFlow::Continue(()))
                })?;
            }
            Node::Include {
                namespace,
                name,
                args,
                content,
                ..
            } => {
                let body =
                    self.include_mixin(namespace.as_deref(), name, args, content.as_ref(), level)?;
                out.extend(body);
            }
            Node::Content { args, .. } => out.extend(self.compile_content(args, level)?),
            Node::Use {
                url,
                namespace,
                config,
                ..
            } => {
                if let Some(css) = self.use_module(url, namespace.as_deref(), config)? {
                    out.blocks.push(css);
                }
            }
            Node::Forward {
                url,
                prefix,
                filter,
                ..
            } => {
                if let Some(css) = self.forward_module(url, prefix.clone(), filter.clone())? {
                    out.blocks.push(css);
                }
            }
            Node::Import { urls, .. } => {
                for url in urls {
                    out.extend(self.import_file(url, level)?);
                }
            }
            Node::Message { kind, value, line } => {
                statement::compile_message(self, *kind, value, *line)?
            }
            Node::Extend { selector, .. } => {
                let target = self.interpolate(selector)?;
                tracing::warn!(
                    "{}:{}: @extend {} is not supported and was ignored",
                    self.current_file,
                    node.line(),
                    target
                );
            }
            Node::AtRule {
                name, body: None, ..
            } if parent.is_some() && name != "mixin" => {
                let css = self.run_strategy(node, parent.as_deref(), 0)?;
                out.declarations.push(css.trim().to_string());
            }
            Node::Media { query, .. } => {
                let query = self.interpolate(query)?;
                let saved = self.media_query.replace(query);
                let result = self.run_strategy(node, parent.as_deref(), level);
                self.media_query = saved;
                push_block(out, result?);
            }
            Node::AtRoot { .. } => {
                let context = self.at_root_context(parent.as_deref());
                let css = self.run_strategy(node, context.as_deref(), level)?;
                push_block(out, css);
            }
            Node::Supports { .. }
            | Node::Container { .. }
            | Node::Keyframes { .. }
            | Node::MixinDef { .. }
            | Node::AtRule { .. } => {
                let css = self.run_strategy(node, parent.as_deref(), level)?;
                push_block(out, css);
            }
        }
        Ok(())
    }

    fn run_strategy(&mut self, node: &Node, parent: Option<&str>, level: usize) -> Result<String> {
        let strategies = self.strategies;
        strategies.compile(node, parent, level, self)
    }

    /// The parent selector as `@at-root` sees it: each group followed by the
    /// enclosing `@media` clause, if any.
    fn at_root_context(&self, parent: Option<&str>) -> Option<String> {
        match (&self.media_query, parent) {
            (Some(query), Some(selector)) => Some(
                split_top_level(selector, ',')
                    .into_iter()
                    .map(|group| format!("{} @media {}", group, query))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            (Some(query), None) => Some(format!("@media {}", query)),
            (None, parent) => parent.map(str::to_string),
        }
    }

    fn compile_rule(&mut self, selector: &Selector, body: &[Node], level: usize) -> Result<String> {
        let own = self.interpolate(&selector.text)?;
        let resolved = resolve_selector(self.selector.as_deref(), &own);
        let visible = visible_selector(&resolved);
        let compiled =
            self.with_frame(false, |cg| cg.compile_block(body, Some(&resolved), level))?;

        let mut css = String::new();
        if !compiled.declarations.is_empty() && !visible.is_empty() {
            let pad = indent(level);
            self.pending.push(PendingMapping {
                selector: visible.clone(),
                source: self.current_file.clone(),
                original_line: selector.line,
            });
            css.push_str(&format!("{}{} {{\n", pad, visible));
            css.push_str(&self.format_declarations(&compiled.declarations, level + 1));
            css.push_str(&format!("{}}}\n", pad));
        }
        for block in compiled.blocks {
            css.push_str(&block);
        }
        Ok(css)
    }

    // ========================================================================
    // Variables
    // ========================================================================

    pub(crate) fn with_frame<T>(
        &mut self,
        semi_global: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.frames.push(Frame {
            variables: IndexMap::new(),
            semi_global,
        });
        let result = f(self);
        self.frames.pop();
        result
    }

    /// Whether no rule, mixin or function separates the current block from
    /// the module scope.
    pub(crate) fn in_semi_global_scope(&self) -> bool {
        self.frames.iter().all(|frame| frame.semi_global)
    }

    pub(crate) fn lookup_variable(&self, name: &str) -> Option<Value> {
        let name = normalize_name(name);
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.variables.get(&name) {
                return Some(value.clone());
            }
        }
        let stars = {
            let env = self.env.borrow();
            if let Some(value) = env.variables.get(&name) {
                return Some(value.clone());
            }
            env.star_modules.clone()
        };
        stars
            .iter()
            .find_map(|module| self.module_variable(module, &name))
    }

    /// Assign to the nearest existing definition, or define in the innermost
    /// scope.
    pub(crate) fn assign_variable(&mut self, name: &str, value: Value, global: bool) {
        let name = normalize_name(name);
        if global || self.frames.is_empty() {
            self.env.borrow_mut().variables.insert(name, value);
            return;
        }
        if let Some(frame) = self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| frame.variables.contains_key(&name))
        {
            frame.variables.insert(name, value);
            return;
        }
        if self.in_semi_global_scope() && self.env.borrow().variables.contains_key(&name) {
            self.env.borrow_mut().variables.insert(name, value);
            return;
        }
        self.define_local(&name, value);
    }

    /// Define `name` in the innermost scope, shadowing outer definitions.
    pub(crate) fn define_local(&mut self, name: &str, value: Value) {
        let name = normalize_name(name);
        match self.frames.last_mut() {
            Some(frame) => {
                frame.variables.insert(name, value);
            }
            None => {
                self.env.borrow_mut().variables.insert(name, value);
            }
        }
    }

    /// `ns.$name`
    pub(crate) fn namespaced_variable(&self, namespace: &str, name: &str) -> Result<Value> {
        let module = self.namespace(namespace)?;
        self.module_variable(&module, &normalize_name(name))
            .ok_or_else(|| CompileErrorKind::UndefinedVariable(format!("{}.${}", namespace, name)).into())
    }

    /// `ns.$name: value`; only existing module variables may be assigned.
    pub(crate) fn assign_namespaced_variable(
        &mut self,
        namespace: &str,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let name = normalize_name(name);
        if let ModuleRef::User(module) = self.namespace(namespace)? {
            let mut env = module.env.borrow_mut();
            if let Some(slot) = env.variables.get_mut(&name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(CompileErrorKind::UndefinedVariable(format!("{}.${}", namespace, name)).into())
    }

    fn namespace(&self, namespace: &str) -> Result<ModuleRef> {
        self.env
            .borrow()
            .namespaces
            .get(namespace)
            .cloned()
            .ok_or_else(|| CompileErrorKind::UnknownModule(namespace.to_string()).into())
    }

    fn module_variable(&self, module: &ModuleRef, name: &str) -> Option<Value> {
        match module {
            ModuleRef::Builtin(namespace) => self
                .registry
                .module_variables(namespace)
                .into_iter()
                .find(|(member, _)| *member == name)
                .map(|(_, value)| value),
            ModuleRef::User(module) => {
                let forwards = {
                    let env = module.env.borrow();
                    if let Some(value) = env.variables.get(name) {
                        return Some(value.clone());
                    }
                    env.forwards.clone()
                };
                forwards.iter().find_map(|forward| {
                    let inner = forward.expose(name, "$")?;
                    self.module_variable(&forward.module, inner)
                })
            }
        }
    }

    // ========================================================================
    // Mixins and functions
    // ========================================================================

    fn callable(&self, name: &str, params: ParameterList, body: Vec<Node>) -> Rc<Callable> {
        Rc::new(Callable {
            name: name.to_string(),
            params,
            body: Rc::new(body),
            env: Rc::downgrade(&self.env),
        })
    }

    pub(crate) fn define_function(&mut self, name: &str, params: ParameterList, body: Vec<Node>) {
        let function = self.callable(name, params, body);
        self.env
            .borrow_mut()
            .functions
            .insert(normalize_name(name), function);
    }

    pub(crate) fn define_mixin(&mut self, name: &str, params: ParameterList, body: Vec<Node>) {
        let mixin = self.callable(name, params, body);
        self.env
            .borrow_mut()
            .mixins
            .insert(normalize_name(name), mixin);
    }

    pub(crate) fn lookup_function(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<FunctionTarget>> {
        let name = normalize_name(name);
        if let Some(namespace) = namespace {
            let module = self.namespace(namespace)?;
            return Ok(self.module_function(&module, &name));
        }
        let stars = {
            let env = self.env.borrow();
            if let Some(function) = env.functions.get(&name) {
                return Ok(Some(FunctionTarget::User(function.clone())));
            }
            env.star_modules.clone()
        };
        Ok(stars
            .iter()
            .find_map(|module| self.module_function(module, &name)))
    }

    fn module_function(&self, module: &ModuleRef, name: &str) -> Option<FunctionTarget> {
        match module {
            ModuleRef::Builtin(namespace) => {
                self.registry
                    .contains(Some(namespace), name)
                    .then(|| FunctionTarget::Builtin(namespace.clone()))
            }
            ModuleRef::User(module) => {
                let forwards = {
                    let env = module.env.borrow();
                    if let Some(function) = env.functions.get(name) {
                        return Some(FunctionTarget::User(function.clone()));
                    }
                    env.forwards.clone()
                };
                forwards.iter().find_map(|forward| {
                    let inner = forward.expose(name, "")?;
                    self.module_function(&forward.module, inner)
                })
            }
        }
    }

    pub(crate) fn lookup_mixin(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<Rc<Callable>>> {
        let name = normalize_name(name);
        if let Some(namespace) = namespace {
            let module = self.namespace(namespace)?;
            return Ok(self.module_mixin(&module, &name));
        }
        let stars = {
            let env = self.env.borrow();
            if let Some(mixin) = env.mixins.get(&name) {
                return Ok(Some(mixin.clone()));
            }
            env.star_modules.clone()
        };
        Ok(stars.iter().find_map(|module| self.module_mixin(module, &name)))
    }

    fn module_mixin(&self, module: &ModuleRef, name: &str) -> Option<Rc<Callable>> {
        let ModuleRef::User(module) = module else {
            return None;
        };
        let forwards = {
            let env = module.env.borrow();
            if let Some(mixin) = env.mixins.get(name) {
                return Some(mixin.clone());
            }
            env.forwards.clone()
        };
        forwards.iter().find_map(|forward| {
            let inner = forward.expose(name, "")?;
            self.module_mixin(&forward.module, inner)
        })
    }

    /// Bind call arguments to `params` in the innermost frame: positional
    /// first, then by name, then defaults evaluated in the callee's scope.
    fn bind_parameters(&mut self, params: &ParameterList, args: CallArgs, callee: &str) -> Result<()> {
        let CallArgs {
            positional,
            mut named,
        } = args;
        let supplied = positional.len();
        let mut positional = positional.into_iter();
        for param in &params.params {
            let key = normalize_name(&param.name);
            let value = match positional.next() {
                Some(value) => value,
                None => match named.shift_remove(&key) {
                    Some(value) => value,
                    None => match &param.default {
                        Some(default) => expression::evaluate(self, default)?,
                        None => {
                            return Err(CompileError::invalid_argument(format!(
                                "Missing argument ${} for {}",
                                param.name, callee
                            ))
                            .into())
                        }
                    },
                },
            };
            self.define_local(&key, value);
        }
        let rest: Vec<Value> = positional.collect();
        match &params.rest {
            Some(rest_name) => {
                self.define_local(rest_name, Value::list(rest, crate::ast::ListSeparator::Comma));
            }
            None if !rest.is_empty() => {
                return Err(CompileError::invalid_argument(format!(
                    "Only {} arguments allowed for {}, but {} were passed",
                    params.params.len(),
                    callee,
                    supplied
                ))
                .into());
            }
            None => {
                if let Some(name) = named.keys().next() {
                    return Err(CompileError::invalid_argument(format!(
                        "No argument named ${} for {}",
                        name, callee
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Run a user `@function` and return its `@return` value.
    pub(crate) fn call_user_function(&mut self, function: &Callable, args: CallArgs) -> Result<Value> {
        let env = function.env.upgrade().unwrap_or_else(|| self.env.clone());
        let caller_env = std::mem::replace(&mut self.env, env);
        let caller_frames = std::mem::take(&mut self.frames);
        self.frames.push(Frame::default());
        let body = function.body.clone();
        let result = self
            .bind_parameters(&function.params, args, &function.name)
            .and_then(|()| statement::run_function_body(self, &body));
        self.env = caller_env;
        self.frames = caller_frames;
        result?.ok_or_else(|| CompileErrorKind::MissingReturn(function.name.clone()).into())
    }

    fn include_mixin(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        args: &[Argument],
        content: Option<&ContentBlock>,
        level: usize,
    ) -> Result<Body> {
        let mixin = self
            .lookup_mixin(namespace, name)?
            .ok_or_else(|| CompileErrorKind::UndefinedMixin(name.to_string()))?;
        let call_args = expression::evaluate_args(self, args)?;
        tracing::trace!("@include {}", mixin.name);

        let env = mixin.env.upgrade().unwrap_or_else(|| self.env.clone());
        let caller_env = std::mem::replace(&mut self.env, env);
        let caller_frames = std::mem::take(&mut self.frames);
        self.content_stack.push(ContentFrame {
            block: content.cloned().map(Rc::new),
            env: caller_env.clone(),
            frames: caller_frames,
        });
        self.frames.push(Frame::default());
        let body = mixin.body.clone();
        let result = self
            .bind_parameters(&mixin.params, call_args, &mixin.name)
            .and_then(|()| self.compile_nodes(&body, level));
        let caller = self.content_stack.pop();
        self.env = caller_env;
        self.frames = caller.map(|frame| frame.frames).unwrap_or_default();
        result
    }

    /// `@content`: run the including block in the includer's scope.
    fn compile_content(&mut self, args: &[Argument], level: usize) -> Result<Body> {
        let block = match self.content_stack.last() {
            Some(ContentFrame {
                block: Some(block), ..
            }) => block.clone(),
            _ => return Ok(Body::default()),
        };
        let call_args = expression::evaluate_args(self, args)?;
        let Some(mut caller) = self.content_stack.pop() else {
            return Ok(Body::default());
        };
        std::mem::swap(&mut self.frames, &mut caller.frames);
        let mixin_env = std::mem::replace(&mut self.env, caller.env.clone());
        self.frames.push(Frame::default());
        let result = self
            .bind_parameters(&block.params, call_args, "@content")
            .and_then(|()| self.compile_nodes(&block.body, level));
        self.frames.pop();
        self.env = mixin_env;
        std::mem::swap(&mut self.frames, &mut caller.frames);
        self.content_stack.push(caller);
        result
    }

    // ========================================================================
    // Modules
    // ========================================================================

    fn load_source(&self, url: &str) -> Result<LoadedFile> {
        let mut candidates = Vec::new();
        if let Some(dir) = Path::new(&self.current_file)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            candidates.push(dir.join(url).to_string_lossy().into_owned());
        }
        candidates.push(url.to_string());
        for candidate in &candidates {
            match self.loader.load(candidate) {
                Ok(file) => return Ok(file),
                Err(err) => tracing::trace!("{} not loaded: {}", candidate, err),
            }
        }
        Err(CompileErrorKind::FileNotFound(url.to_string()).into())
    }

    fn parse_file(&self, file: &LoadedFile) -> Result<Stylesheet> {
        let source = normalizer::normalize(&file.contents, file.syntax);
        parse_stylesheet(&source)
    }

    /// Run `f` with `env` as the module scope and `path` as the current file.
    fn in_module<T>(
        &mut self,
        env: Rc<RefCell<Environment>>,
        path: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_env = std::mem::replace(&mut self.env, env);
        let saved_frames = std::mem::take(&mut self.frames);
        let saved_file = std::mem::replace(&mut self.current_file, path.to_string());
        let saved_selector = self.selector.take();
        let saved_media = self.media_query.take();
        self.loading.push(path.to_string());
        let result = f(self);
        self.loading.pop();
        self.env = saved_env;
        self.frames = saved_frames;
        self.current_file = saved_file;
        self.selector = saved_selector;
        self.media_query = saved_media;
        result
    }

    /// Load (or fetch from cache) the module behind `url`. The CSS is
    /// returned only the first time the module is compiled.
    fn resolve_module(
        &mut self,
        url: &str,
        config: &[(String, Expr)],
    ) -> Result<(ModuleRef, Option<String>)> {
        if let Some(name) = url.strip_prefix("sass:") {
            if self.registry.has_module(name) {
                return Ok((ModuleRef::Builtin(name.to_string()), None));
            }
            return Err(CompileErrorKind::UnknownModule(url.to_string()).into());
        }
        let mut configured = IndexMap::new();
        for (name, expr) in config {
            configured.insert(normalize_name(name), expression::evaluate(self, expr)?);
        }
        let file = self.load_source(url)?;
        if let Some(module) = self.modules.get(&file.path) {
            if !configured.is_empty() {
                tracing::warn!("{} was already loaded, so its configuration is ignored", url);
            }
            return Ok((ModuleRef::User(module.clone()), None));
        }
        if self.loading.contains(&file.path) {
            return Err(CompileErrorKind::ModuleLoop(file.path).into());
        }

        let stylesheet = self.parse_file(&file)?;
        let env = Rc::new(RefCell::new(Environment {
            variables: configured,
            ..Environment::default()
        }));
        let chunks = self.in_module(env.clone(), &file.path, |cg| cg.compile_root(&stylesheet.nodes))?;
        tracing::debug!("loaded module {} from {}", url, file.path);
        let module = Rc::new(Module {
            path: file.path.clone(),
            env,
        });
        self.modules.insert(file.path, module.clone());
        let css = chunks.join("\n");
        Ok((ModuleRef::User(module), Some(css).filter(|css| !css.is_empty())))
    }

    fn use_module(
        &mut self,
        url: &str,
        namespace: Option<&str>,
        config: &[(String, Expr)],
    ) -> Result<Option<String>> {
        let (module, css) = self.resolve_module(url, config)?;
        let alias = namespace
            .map(str::to_string)
            .unwrap_or_else(|| default_namespace(url));
        let mut env = self.env.borrow_mut();
        if alias == "*" {
            env.star_modules.push(module);
        } else {
            env.namespaces.insert(alias, module);
        }
        Ok(css)
    }

    fn forward_module(
        &mut self,
        url: &str,
        prefix: Option<String>,
        filter: Option<ForwardFilter>,
    ) -> Result<Option<String>> {
        let (module, css) = self.resolve_module(url, &[])?;
        self.env.borrow_mut().forwards.push(Forward {
            module,
            prefix,
            filter,
        });
        Ok(css)
    }

    /// `@import`: compile the file in place, sharing the current scope.
    fn import_file(&mut self, url: &str, level: usize) -> Result<Body> {
        let file = self.load_source(url)?;
        if self.loading.contains(&file.path) {
            return Err(CompileErrorKind::ModuleLoop(file.path).into());
        }
        let stylesheet = self.parse_file(&file)?;
        tracing::debug!("importing {}", file.path);
        let saved_file = std::mem::replace(&mut self.current_file, file.path.clone());
        self.loading.push(file.path);
        let result = self.compile_nodes(&stylesheet.nodes, level);
        self.loading.pop();
        self.current_file = saved_file;
        result
    }
}

impl CompilerServices for CodeGen<'_> {
    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        expression::evaluate(self, expr)
    }

    fn format_declarations(&self, declarations: &[String], level: usize) -> String {
        let pad = indent(level);
        declarations
            .iter()
            .map(|line| format!("{}{}\n", pad, line))
            .collect()
    }

    fn compile_body(&mut self, nodes: &[Node], selector: Option<&str>, level: usize) -> Result<Body> {
        self.compile_block(nodes, selector, level)
    }

    fn hoist(&mut self, css: String) {
        self.hoisted.push(css);
    }

    fn interpolate(&mut self, interpolation: &Interpolation) -> Result<String> {
        expression::interpolate(self, interpolation)
    }

    fn format(&self, value: &Value) -> String {
        self.formatter.format(value)
    }

    fn register_mixin(&mut self, name: &str, params: ParameterList, body: Vec<Node>) {
        self.define_mixin(name, params, body);
    }
}

// ============================================================================
// Selectors
// ============================================================================

fn push_block(body: &mut Body, css: String) {
    if !css.is_empty() {
        body.blocks.push(css);
    }
}

/// Resolve `own` against the enclosing selector: every parent group is
/// crossed with every child group and `&` is replaced by the parent.
pub fn resolve_selector(parent: Option<&str>, own: &str) -> String {
    let own = WHITESPACE.replace_all(own.trim(), " ");
    match parent.filter(|parent| !parent.is_empty()) {
        Some(parent) => at_root::nest(parent, &own),
        None => split_top_level(&own, ',').join(", "),
    }
}

/// Groups of `selector` that can match an element; placeholders only exist
/// to be extended.
fn visible_selector(selector: &str) -> String {
    split_top_level(selector, ',')
        .into_iter()
        .filter(|group| !PLACEHOLDER.is_match(group))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `src/_colors.scss` is reachable as `colors`, `sass:math` as `math`.
fn default_namespace(url: &str) -> String {
    let url = url.strip_prefix("sass:").unwrap_or(url);
    let file = url.rsplit('/').next().unwrap_or(url);
    let file = file.strip_prefix('_').unwrap_or(file);
    let stem = file.split('.').next().unwrap_or(file);
    stem.to_string()
}
