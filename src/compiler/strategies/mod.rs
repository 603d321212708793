//! Rule Compilation Strategies
//!
//! At-rules that shape the surrounding CSS (`@media`, `@supports`,
//! `@container`, `@keyframes`, `@at-root`, generic at-rules and mixin
//! definitions) are compiled by pluggable strategies selected from the
//! node's kind.
//!
//! ## Architecture
//! - [`CompilerServices`] is the set of operations the code generator lends
//!   to a strategy (evaluate an expression, compile a body, ...).
//! - [`CompilationContext`] wraps those services for one strategy call and
//!   only hands out the operations the strategy declared through
//!   [`RuleStrategy::required`]. Asking for anything else, or running a
//!   strategy against services that lack a declared capability, is a
//!   [`ConfigurationError`].
//! - [`StrategyRegistry`] holds the strategies in priority order; the first
//!   one whose [`RuleStrategy::can_handle`] accepts the kind wins.

pub mod at_root;
pub mod conditional;
pub mod generic;
pub mod keyframes;

use flagset::{flags, FlagSet};

use crate::ast::{Expr, Interpolation, Node, ParameterList};
use crate::compiler::values::Value;
use crate::error::{ConfigurationError, Result};

pub use at_root::AtRootStrategy;
pub use conditional::ConditionalStrategy;
pub use generic::GenericStrategy;
pub use keyframes::KeyframesStrategy;

flags! {
    /// Operations a strategy may borrow from the code generator.
    pub enum Capability: u8 {
        Evaluate,
        Declarations,
        Ast,
        Interpolation,
        Format,
        MixinRegistrar,
    }
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Evaluate => "expression evaluator",
            Capability::Declarations => "declaration compiler",
            Capability::Ast => "AST compiler",
            Capability::Interpolation => "interpolation evaluator",
            Capability::Format => "value formatter",
            Capability::MixinRegistrar => "mixin registrar",
        }
    }
}

/// A compiled block body, split by where its pieces belong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Declaration and comment lines for the enclosing selector, unindented
    /// and `;`-terminated.
    pub declarations: Vec<String>,
    /// Rules and at-rules rendered at the body's own level.
    pub blocks: Vec<String>,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.blocks.is_empty()
    }

    pub fn extend(&mut self, other: Body) {
        self.declarations.extend(other.declarations);
        self.blocks.extend(other.blocks);
    }
}

/// What the code generator exposes to strategies.
pub trait CompilerServices {
    /// Capabilities this implementation actually provides.
    fn capabilities(&self) -> FlagSet<Capability> {
        FlagSet::full()
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value>;

    /// Indent declaration lines at `level`.
    fn format_declarations(&self, declarations: &[String], level: usize) -> String;

    /// Compile `nodes` under `selector`, with rules rendered at `level`.
    fn compile_body(&mut self, nodes: &[Node], selector: Option<&str>, level: usize)
        -> Result<Body>;

    /// Emit `css` at the root of the stylesheet instead of in place.
    fn hoist(&mut self, css: String);

    fn interpolate(&mut self, interpolation: &Interpolation) -> Result<String>;

    fn format(&self, value: &Value) -> String;

    fn register_mixin(&mut self, name: &str, params: ParameterList, body: Vec<Node>);
}

/// Services lent to one strategy invocation.
pub struct CompilationContext<'a> {
    strategy: &'static str,
    allowed: FlagSet<Capability>,
    services: &'a mut dyn CompilerServices,
}

impl<'a> CompilationContext<'a> {
    /// Fails when `services` lacks something the strategy requires.
    pub fn new(
        strategy: &'static str,
        required: FlagSet<Capability>,
        services: &'a mut dyn CompilerServices,
    ) -> std::result::Result<Self, ConfigurationError> {
        let provided = services.capabilities();
        if let Some(missing) = required.into_iter().find(|cap| !provided.contains(*cap)) {
            return Err(ConfigurationError::MissingCapability {
                strategy,
                capability: missing.name(),
            });
        }
        Ok(Self {
            strategy,
            allowed: required,
            services,
        })
    }

    fn check(&self, capability: Capability) -> std::result::Result<(), ConfigurationError> {
        if self.allowed.contains(capability) {
            Ok(())
        } else {
            Err(ConfigurationError::MissingCapability {
                strategy: self.strategy,
                capability: capability.name(),
            })
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.check(Capability::Evaluate)?;
        self.services.evaluate(expr)
    }

    pub fn format_declarations(&self, declarations: &[String], level: usize) -> Result<String> {
        self.check(Capability::Declarations)?;
        Ok(self.services.format_declarations(declarations, level))
    }

    pub fn compile_body(
        &mut self,
        nodes: &[Node],
        selector: Option<&str>,
        level: usize,
    ) -> Result<Body> {
        self.check(Capability::Ast)?;
        self.services.compile_body(nodes, selector, level)
    }

    pub fn hoist(&mut self, css: String) -> Result<()> {
        self.check(Capability::Ast)?;
        self.services.hoist(css);
        Ok(())
    }

    pub fn interpolate(&mut self, interpolation: &Interpolation) -> Result<String> {
        self.check(Capability::Interpolation)?;
        self.services.interpolate(interpolation)
    }

    pub fn format(&self, value: &Value) -> Result<String> {
        self.check(Capability::Format)?;
        Ok(self.services.format(value))
    }

    pub fn register_mixin(&mut self, name: &str, params: ParameterList, body: Vec<Node>) -> Result<()> {
        self.check(Capability::MixinRegistrar)?;
        self.services.register_mixin(name, params, body);
        Ok(())
    }
}

/// Compiles one kind of at-rule.
pub trait RuleStrategy {
    fn name(&self) -> &'static str;

    /// `kind` is the at-rule name as produced by [`rule_kind`].
    fn can_handle(&self, kind: &str) -> bool;

    fn required(&self) -> FlagSet<Capability>;

    fn compile(
        &self,
        node: &Node,
        parent_selector: Option<&str>,
        level: usize,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String>;
}

/// The strategy kind of `node`, or `None` for nodes no strategy compiles.
pub fn rule_kind(node: &Node) -> Option<&str> {
    match node {
        Node::Media { .. } => Some("media"),
        Node::Supports { .. } => Some("supports"),
        Node::Container { .. } => Some("container"),
        Node::Keyframes { keyword, .. } => Some(keyword.as_str()),
        Node::AtRoot { .. } => Some("at-root"),
        Node::MixinDef { .. } => Some("mixin"),
        Node::AtRule { name, .. } => Some(name.as_str()),
        _ => None,
    }
}

/// `  ` repeated `level` times.
pub fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Shared by block-shaped at-rules: declarations are wrapped in the parent
/// selector one level deeper, or placed directly in the block without one.
pub(crate) fn render_block_contents(
    ctx: &CompilationContext<'_>,
    body: &Body,
    parent_selector: Option<&str>,
    level: usize,
) -> Result<String> {
    let mut inner = String::new();
    if !body.declarations.is_empty() {
        match parent_selector.filter(|s| !s.is_empty()) {
            Some(selector) => {
                let pad = indent(level);
                inner.push_str(&format!("{}{} {{\n", pad, selector));
                inner.push_str(&ctx.format_declarations(&body.declarations, level + 1)?);
                inner.push_str(&format!("{}}}\n", pad));
            }
            None => inner.push_str(&ctx.format_declarations(&body.declarations, level)?),
        }
    }
    for block in &body.blocks {
        inner.push_str(block);
    }
    Ok(inner)
}

/// `{indent}@{header} {` + contents + `{indent}}`, the contents always
/// separated from the braces by a newline.
pub(crate) fn wrap_block(header: &str, contents: &str, level: usize) -> String {
    let pad = indent(level);
    format!(
        "{}{} {{\n{}\n{}}}\n",
        pad,
        header,
        contents.trim_end_matches('\n'),
        pad
    )
}

pub struct StrategyRegistry {
    strategies: Vec<Box<dyn RuleStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(ConditionalStrategy),
                Box::new(KeyframesStrategy),
                Box::new(AtRootStrategy),
                Box::new(GenericStrategy),
            ],
        }
    }
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Box<dyn RuleStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn find(&self, kind: &str) -> Option<&dyn RuleStrategy> {
        self.strategies
            .iter()
            .find(|s| s.can_handle(kind))
            .map(|s| s.as_ref())
    }

    pub fn compile(
        &self,
        node: &Node,
        parent_selector: Option<&str>,
        level: usize,
        services: &mut dyn CompilerServices,
    ) -> Result<String> {
        let kind = rule_kind(node).ok_or_else(|| ConfigurationError::NoStrategy(format!("{:?}", node)))?;
        let strategy = self
            .find(kind)
            .ok_or_else(|| ConfigurationError::NoStrategy(kind.to_string()))?;
        tracing::trace!("@{} -> {} strategy", kind, strategy.name());
        let mut ctx = CompilationContext::new(strategy.name(), strategy.required(), services)?;
        strategy.compile(node, parent_selector, level, &mut ctx)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::compiler::values::ValueFormatter;
    use crate::error::SassError;

    /// Services backed by plain closures over literal text, for exercising
    /// strategies without a code generator.
    pub(crate) struct StubServices {
        pub provided: FlagSet<Capability>,
        pub hoisted: Vec<String>,
        pub mixins: Vec<(String, ParameterList)>,
        pub body: Body,
    }

    impl StubServices {
        pub fn new() -> Self {
            Self {
                provided: FlagSet::full(),
                hoisted: Vec::new(),
                mixins: Vec::new(),
                body: Body::default(),
            }
        }
    }

    impl CompilerServices for StubServices {
        fn capabilities(&self) -> FlagSet<Capability> {
            self.provided
        }

        fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
            match expr {
                Expr::Number { value, unit, .. } => Ok(Value::number(*value, unit.as_deref())),
                Expr::Identifier { name, .. } => Ok(Value::unquoted(name.clone())),
                other => Ok(Value::unquoted(format!("{:?}", other))),
            }
        }

        fn format_declarations(&self, declarations: &[String], level: usize) -> String {
            declarations
                .iter()
                .map(|d| format!("{}{}\n", indent(level), d))
                .collect()
        }

        fn compile_body(&mut self, _: &[Node], _: Option<&str>, _: usize) -> Result<Body> {
            Ok(self.body.clone())
        }

        fn hoist(&mut self, css: String) {
            self.hoisted.push(css);
        }

        fn interpolate(&mut self, interpolation: &Interpolation) -> Result<String> {
            Ok(interpolation.as_plain().unwrap_or_default())
        }

        fn format(&self, value: &Value) -> String {
            ValueFormatter::default().format(value)
        }

        fn register_mixin(&mut self, name: &str, params: ParameterList, _: Vec<Node>) {
            self.mixins.push((name.to_string(), params));
        }
    }

    fn supports_node() -> Node {
        Node::Supports {
            condition: Interpolation::literal("(display: grid)", 1),
            body: Vec::new(),
            line: 1,
        }
    }

    #[test]
    fn registry_dispatches_by_kind() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.find("media").map(|s| s.name()), Some("conditional"));
        assert_eq!(registry.find("-webkit-keyframes").map(|s| s.name()), Some("keyframes"));
        assert_eq!(registry.find("at-root").map(|s| s.name()), Some("at-root"));
        assert_eq!(registry.find("font-face").map(|s| s.name()), Some("generic"));
    }

    #[test]
    fn missing_capability_fails_before_compiling() {
        let mut services = StubServices::new();
        services.provided = Capability::Evaluate | Capability::Format;
        let err = StrategyRegistry::default()
            .compile(&supports_node(), None, 0, &mut services)
            .unwrap_err();
        assert!(matches!(
            err,
            SassError::Configuration(ConfigurationError::MissingCapability {
                strategy: "conditional",
                ..
            })
        ));
    }

    #[test]
    fn undeclared_capability_is_refused() {
        let mut services = StubServices::new();
        let mut ctx =
            CompilationContext::new("probe", FlagSet::from(Capability::Format), &mut services)
                .unwrap();
        assert!(ctx.format(&Value::Bool(true)).is_ok());
        assert!(ctx.hoist(String::new()).is_err());
    }

    #[test]
    fn nodes_without_strategy_are_configuration_errors() {
        let node = Node::Comment {
            text: "/* x */".to_string(),
            line: 1,
        };
        let err = StrategyRegistry::default()
            .compile(&node, None, 0, &mut StubServices::new())
            .unwrap_err();
        assert!(matches!(err, SassError::Configuration(ConfigurationError::NoStrategy(_))));
    }
}
