//! Generic at-rules and mixin definitions.
//!
//! `@mixin` reaching this strategy is registered rather than emitted; its
//! signature is parsed from the raw at-rule text when the parser left it
//! unstructured. Any other at-rule is re-emitted with its value evaluated
//! where the value is a valid expression and kept verbatim otherwise.

use flagset::FlagSet;

use super::{indent, render_block_contents, wrap_block, Capability, CompilationContext, RuleStrategy};
use crate::ast::Node;
use crate::error::{Result, SassError};
use crate::parser::{parse_expression, parse_signature};

pub struct GenericStrategy;

impl GenericStrategy {
    fn evaluate_value(&self, raw: &str, ctx: &mut CompilationContext<'_>) -> Result<String> {
        if raw.is_empty() {
            return Ok(String::new());
        }
        let evaluated = parse_expression(raw)
            .and_then(|expr| ctx.evaluate(&expr))
            .and_then(|value| ctx.format(&value));
        match evaluated {
            Ok(text) => Ok(text),
            Err(SassError::Configuration(err)) => Err(err.into()),
            Err(err) => {
                tracing::trace!("at-rule value kept verbatim: {}", err);
                Ok(raw.to_string())
            }
        }
    }
}

impl RuleStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn can_handle(&self, _kind: &str) -> bool {
        true
    }

    fn required(&self) -> FlagSet<Capability> {
        Capability::Evaluate
            | Capability::Format
            | Capability::Interpolation
            | Capability::Ast
            | Capability::Declarations
            | Capability::MixinRegistrar
    }

    fn compile(
        &self,
        node: &Node,
        parent_selector: Option<&str>,
        level: usize,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String> {
        match node {
            Node::MixinDef {
                name, params, body, ..
            } => {
                ctx.register_mixin(name, params.clone(), body.clone())?;
                Ok(String::new())
            }
            Node::AtRule {
                name, value, body, ..
            } if name == "mixin" => {
                let signature = ctx.interpolate(value)?;
                let (name, params) = parse_signature(&signature)?;
                ctx.register_mixin(&name, params, body.clone().unwrap_or_default())?;
                Ok(String::new())
            }
            Node::AtRule {
                name, value, body, ..
            } => {
                let raw = ctx.interpolate(value)?;
                let value = self.evaluate_value(&raw, ctx)?;
                let header = if value.is_empty() {
                    format!("@{}", name)
                } else {
                    format!("@{} {}", name, value)
                };
                match body {
                    None => Ok(format!("{}{};\n", indent(level), header)),
                    Some(nodes) => {
                        let compiled = ctx.compile_body(nodes, parent_selector, level + 1)?;
                        let contents =
                            render_block_contents(ctx, &compiled, parent_selector, level + 1)?;
                        Ok(wrap_block(&header, &contents, level))
                    }
                }
            }
            _ => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Interpolation, ParameterList};
    use crate::compiler::strategies::tests::StubServices;
    use crate::compiler::strategies::{Body, StrategyRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_mixin_signature_is_registered() {
        let node = Node::AtRule {
            name: "mixin".to_string(),
            value: Interpolation::literal("button($size: 10px, $color)", 1),
            body: Some(Vec::new()),
            line: 1,
        };
        let mut services = StubServices::new();
        let css = StrategyRegistry::default()
            .compile(&node, None, 0, &mut services)
            .unwrap();
        assert_eq!(css, "");
        let (name, params) = &services.mixins[0];
        assert_eq!(name, "button");
        let names: Vec<&str> = params.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["size", "color"]);
        assert!(params.params[0].default.is_some());
    }

    #[test]
    fn structured_mixin_is_registered() {
        let node = Node::MixinDef {
            name: "reset".to_string(),
            params: ParameterList::default(),
            body: Vec::new(),
            line: 1,
        };
        let mut services = StubServices::new();
        StrategyRegistry::default()
            .compile(&node, None, 0, &mut services)
            .unwrap();
        assert_eq!(services.mixins[0].0, "reset");
    }

    #[test]
    fn bodiless_at_rule_is_a_statement() {
        let node = Node::AtRule {
            name: "layer".to_string(),
            value: Interpolation::literal("base", 1),
            body: None,
            line: 1,
        };
        let css = StrategyRegistry::default()
            .compile(&node, None, 0, &mut StubServices::new())
            .unwrap();
        assert_eq!(css, "@layer base;\n");
    }

    #[test]
    fn block_at_rule_renders_declarations() {
        let node = Node::AtRule {
            name: "font-face".to_string(),
            value: Interpolation::default(),
            body: Some(Vec::new()),
            line: 1,
        };
        let mut services = StubServices::new();
        services.body = Body {
            declarations: vec!["font-family: x;".to_string()],
            blocks: Vec::new(),
        };
        let css = StrategyRegistry::default()
            .compile(&node, None, 0, &mut services)
            .unwrap();
        assert_eq!(css, "@font-face {\n  font-family: x;\n}\n");
    }

    #[test]
    fn unparsable_values_are_kept_verbatim() {
        let node = Node::AtRule {
            name: "page".to_string(),
            value: Interpolation::literal(":first", 1),
            body: Some(Vec::new()),
            line: 1,
        };
        let css = StrategyRegistry::default()
            .compile(&node, None, 0, &mut StubServices::new())
            .unwrap();
        assert_eq!(css, "@page :first {\n\n}\n");
    }
}
