//! Builtin Function Registry
//!
//! Builtin functions live in handlers implementing [`ModuleFunctions`]. The
//! registry is built once per compiler and indexes every handler twice:
//! by `(namespace, name)` for module calls such as `math.round`, and by bare
//! name for the subset a handler exposes globally (`round`, `map-get`).
//!
//! ## Dispatch
//! 1. Resolve the handler from the namespace/name pair.
//! 2. Map the Sass-facing name to the handler's internal name (`map-get` → `get`).
//! 3. Reorder `$name: value` arguments into positional order per the
//!    handler's declared signature.
//! 4. Render the arguments to strings unless the handler works on raw values.
//!
//! ## Intrinsics
//! `sass:meta` and `sass:string` read the caller's scopes, so the expression
//! evaluator runs them. Their names are still indexed here: [`FunctionRegistry::contains`]
//! and [`FunctionRegistry::has_module`] see them while [`FunctionRegistry::call`]
//! leaves them to the caller.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::compiler::functions::{
    color::{CssColorFunctions, SassColorFunctions},
    gradient::GradientFunctions,
    list::ListFunctions,
    map::MapFunctions,
    math::MathFunctions,
};
use crate::compiler::values::{Value, ValueFormatter};
use crate::error::CompileError;

/// Arguments at a builtin call site.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: IndexMap::new(),
        }
    }

    /// Fold named arguments into positional slots following `signature`.
    /// Unfilled slots before a named one become `null`.
    pub fn normalize(mut self, signature: &[&str]) -> Result<Vec<Value>, CompileError> {
        let mut values = self.positional;
        for (index, param) in signature.iter().enumerate() {
            if let Some(value) = self.named.shift_remove(*param) {
                if index < values.len() {
                    return Err(CompileError::invalid_argument(format!(
                        "Argument ${} was passed both by position and by name",
                        param
                    )));
                }
                values.resize(index, Value::Null);
                values.push(value);
            }
        }
        if let Some(name) = self.named.keys().next() {
            return Err(CompileError::invalid_argument(format!(
                "No argument named ${}",
                name
            )));
        }
        Ok(values)
    }
}

/// A family of builtin functions.
pub trait ModuleFunctions {
    /// Module reachable through `@use "sass:<namespace>"`, if any.
    fn namespace(&self) -> Option<&'static str>;

    /// Internal names callable as `<namespace>.<name>`.
    fn module_functions(&self) -> &'static [&'static str];

    /// Sass-facing names callable without a namespace.
    fn global_functions(&self) -> &'static [&'static str];

    /// Sass-facing name → internal name, for names that differ.
    fn remap(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Parameter names of `name` (internal), used to place keyword arguments.
    fn signature(&self, _name: &str) -> &'static [&'static str] {
        &[]
    }

    /// Whether arguments stay structured values instead of rendered text.
    fn requires_raw_values(&self) -> bool {
        true
    }

    /// Module variables such as `math.$pi`.
    fn variables(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Run `name` (internal, as resolved through [`ModuleFunctions::remap`]).
    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError>;
}

/// `sass:meta` functions, also reachable globally.
const META_FUNCTIONS: &[&str] = &[
    "type-of",
    "inspect",
    "variable-exists",
    "global-variable-exists",
    "function-exists",
    "mixin-exists",
    "get-function",
    "call",
];

/// `sass:string` functions, also reachable globally.
const STRING_FUNCTIONS: &[&str] = &["unquote", "quote", "to-upper-case", "to-lower-case"];

/// `font_size` and `font-size` name the same member.
pub fn normalize_name(name: &str) -> String {
    name.replace('_', "-")
}

pub struct FunctionRegistry {
    handlers: Vec<Box<dyn ModuleFunctions>>,
    by_module: HashMap<(String, String), usize>,
    globals: HashMap<String, usize>,
    intrinsics: HashSet<(String, String)>,
    intrinsic_globals: HashSet<String>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            by_module: HashMap::new(),
            globals: HashMap::new(),
            intrinsics: HashSet::new(),
            intrinsic_globals: HashSet::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MathFunctions));
        registry.register(Box::new(ListFunctions));
        registry.register(Box::new(MapFunctions));
        registry.register(Box::new(SassColorFunctions));
        registry.register(Box::new(CssColorFunctions));
        registry.register(Box::new(GradientFunctions));
        registry.register_intrinsics("meta", META_FUNCTIONS);
        registry.register_intrinsics("string", STRING_FUNCTIONS);
        registry
    }

    pub fn register(&mut self, handler: Box<dyn ModuleFunctions>) {
        let index = self.handlers.len();
        if let Some(namespace) = handler.namespace() {
            for name in handler.module_functions() {
                self.by_module
                    .insert((namespace.to_string(), name.to_string()), index);
            }
        }
        for name in handler.global_functions() {
            self.globals.insert(name.to_string(), index);
        }
        self.handlers.push(handler);
    }

    /// Index functions the caller evaluates itself, under `namespace` and
    /// globally.
    pub fn register_intrinsics(&mut self, namespace: &str, names: &[&str]) {
        for name in names {
            self.intrinsics
                .insert((namespace.to_string(), name.to_string()));
            self.intrinsic_globals.insert(name.to_string());
        }
    }

    pub fn is_intrinsic(&self, namespace: Option<&str>, name: &str) -> bool {
        let name = normalize_name(name);
        match namespace {
            Some(ns) => self.intrinsics.contains(&(ns.to_string(), name)),
            None => self.intrinsic_globals.contains(&name),
        }
    }

    pub fn has_module(&self, namespace: &str) -> bool {
        self.handlers
            .iter()
            .any(|h| h.namespace() == Some(namespace))
            || self.intrinsics.iter().any(|(ns, _)| ns == namespace)
    }

    pub fn module_variables(&self, namespace: &str) -> Vec<(&'static str, Value)> {
        self.handlers
            .iter()
            .filter(|h| h.namespace() == Some(namespace))
            .flat_map(|h| h.variables())
            .collect()
    }

    /// Sass-facing names of a module's functions.
    pub fn module_function_names(&self, namespace: &str) -> Vec<String> {
        self.by_module
            .keys()
            .chain(&self.intrinsics)
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn resolve(&self, namespace: Option<&str>, name: &str) -> Option<(&dyn ModuleFunctions, String)> {
        let name = normalize_name(name);
        let index = match namespace {
            Some(ns) => *self.by_module.get(&(ns.to_string(), name.clone()))?,
            None => *self.globals.get(&name)?,
        };
        let handler = self.handlers[index].as_ref();
        let internal = handler
            .remap()
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, to)| to.to_string())
            .unwrap_or(name);
        Some((handler, internal))
    }

    pub fn contains(&self, namespace: Option<&str>, name: &str) -> bool {
        self.resolve(namespace, name).is_some() || self.is_intrinsic(namespace, name)
    }

    /// Call a builtin, or `None` when no handler knows the name. Intrinsics
    /// also yield `None`.
    pub fn call(
        &self,
        namespace: Option<&str>,
        name: &str,
        args: CallArgs,
        formatter: &ValueFormatter,
    ) -> Option<Result<Value, CompileError>> {
        let (handler, internal) = self.resolve(namespace, name)?;
        tracing::trace!("builtin {:?}.{} -> {}", namespace, name, internal);
        let result = args
            .normalize(handler.signature(&internal))
            .and_then(|values| {
                let values = if handler.requires_raw_values() {
                    values
                } else {
                    values
                        .iter()
                        .map(|v| Value::unquoted(formatter.format(v)))
                        .collect()
                };
                handler.handle(&internal, values)
            });
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListSeparator;

    fn call(namespace: Option<&str>, name: &str, args: Vec<Value>) -> Value {
        FunctionRegistry::with_builtins()
            .call(namespace, name, CallArgs::positional(args), &ValueFormatter::default())
            .expect("function exists")
            .expect("call succeeds")
    }

    #[test]
    fn module_and_global_names_reach_the_same_handler() {
        let list = Value::list(
            vec![Value::unquoted("a"), Value::unquoted("b")],
            ListSeparator::Comma,
        );
        assert_eq!(call(Some("list"), "separator", vec![list.clone()]).to_css(), "comma");
        assert_eq!(call(None, "list-separator", vec![list]).to_css(), "comma");
    }

    #[test]
    fn module_only_names_are_not_global() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.contains(Some("math"), "div"));
        assert!(!registry.contains(None, "div"));
    }

    #[test]
    fn underscores_and_hyphens_are_interchangeable() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.contains(None, "map_get"));
    }

    #[test]
    fn keyword_arguments_follow_the_signature() {
        let mut args = CallArgs::default();
        args.named.insert("number2".to_string(), Value::number(4.0, None));
        args.named.insert("number1".to_string(), Value::number(10.0, Some("px")));
        let result = FunctionRegistry::with_builtins()
            .call(Some("math"), "div", args, &ValueFormatter::default())
            .unwrap()
            .unwrap();
        assert_eq!(result.to_css(), "2.5px");
    }

    #[test]
    fn unknown_keyword_is_an_error() {
        let mut args = CallArgs::positional(vec![Value::number(1.0, None)]);
        args.named.insert("bogus".to_string(), Value::Null);
        assert!(args.normalize(&["number"]).is_err());
    }

    #[test]
    fn meta_and_string_names_are_indexed() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.has_module("meta"));
        assert!(registry.has_module("string"));
        assert!(registry.contains(Some("meta"), "inspect"));
        assert!(registry.contains(None, "to_upper_case"));
        assert!(registry.is_intrinsic(Some("string"), "quote"));
        assert!(!registry.is_intrinsic(Some("math"), "round"));
        assert!(!registry.contains(Some("string"), "inspect"));

        let mut names = registry.module_function_names("string");
        names.sort();
        assert_eq!(names, vec!["quote", "to-lower-case", "to-upper-case", "unquote"]);
        assert!(registry
            .call(Some("meta"), "inspect", CallArgs::default(), &ValueFormatter::default())
            .is_none());
    }

    #[test]
    fn unknown_names_are_not_resolved() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry
            .call(None, "no-such-fn", CallArgs::default(), &ValueFormatter::default())
            .is_none());
    }
}
