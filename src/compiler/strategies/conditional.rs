//! `@media`, `@supports` and `@container`.

use flagset::FlagSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{render_block_contents, wrap_block, Capability, CompilationContext, RuleStrategy};
use crate::ast::Node;
use crate::error::Result;
use crate::parser::parse_expression;
use crate::text_reflow::split_selector_lists;

/// A `(feature: value)` pair inside a supports condition.
static SUPPORTS_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([\w-]+):\s*([^()]+)\)").unwrap());

pub struct ConditionalStrategy;

impl ConditionalStrategy {
    /// Evaluate the value side of each `(property: value)` test so Sass
    /// expressions there (`(width: 10px * 2)`) reach the CSS computed.
    fn evaluate_supports(&self, condition: &str, ctx: &mut CompilationContext<'_>) -> Result<String> {
        let mut failure = None;
        let result = SUPPORTS_DECLARATION.replace_all(condition, |caps: &Captures| {
            let value = caps[2].trim();
            let rendered = parse_expression(value)
                .and_then(|expr| ctx.evaluate(&expr))
                .and_then(|v| ctx.format(&v));
            match rendered {
                Ok(text) if !text.is_empty() => format!("({}: {})", &caps[1], text),
                Ok(_) => caps[0].to_string(),
                Err(err) => {
                    failure.get_or_insert(err);
                    caps[0].to_string()
                }
            }
        });
        match failure {
            Some(err @ crate::error::SassError::Compile(_)) => Err(err),
            _ => Ok(result.into_owned()),
        }
    }
}

impl RuleStrategy for ConditionalStrategy {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn can_handle(&self, kind: &str) -> bool {
        matches!(kind, "media" | "supports" | "container")
    }

    fn required(&self) -> FlagSet<Capability> {
        Capability::Interpolation
            | Capability::Evaluate
            | Capability::Format
            | Capability::Ast
            | Capability::Declarations
    }

    fn compile(
        &self,
        node: &Node,
        parent_selector: Option<&str>,
        level: usize,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String> {
        let (keyword, query, body) = match node {
            Node::Media { query, body, .. } => ("media", query, body),
            Node::Supports {
                condition, body, ..
            } => ("supports", condition, body),
            Node::Container { query, body, .. } => ("container", query, body),
            _ => return Ok(String::new()),
        };
        let mut query = ctx.interpolate(query)?;
        if keyword == "supports" {
            query = self.evaluate_supports(&query, ctx)?;
        }
        let compiled = ctx.compile_body(body, parent_selector, level + 1)?;
        let mut contents = render_block_contents(ctx, &compiled, parent_selector, level + 1)?;
        if keyword != "supports" {
            contents = split_selector_lists(&contents);
        }
        // A written-out `{}` survives; a body that compiled away does not.
        if !body.is_empty() && contents.trim().is_empty() {
            return Ok(String::new());
        }
        Ok(wrap_block(&format!("@{} {}", keyword, query), &contents, level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Interpolation;
    use crate::compiler::strategies::tests::StubServices;
    use crate::compiler::strategies::{Body, StrategyRegistry};
    use pretty_assertions::assert_eq;

    fn compile(node: &Node, parent: Option<&str>, services: &mut StubServices) -> String {
        StrategyRegistry::default()
            .compile(node, parent, 0, services)
            .unwrap()
    }

    #[test]
    fn empty_supports_keeps_blank_line() {
        let node = Node::Supports {
            condition: Interpolation::literal("(display: grid)", 1),
            body: Vec::new(),
            line: 1,
        };
        assert_eq!(
            compile(&node, None, &mut StubServices::new()),
            "@supports (display: grid) {\n\n}\n"
        );
    }

    #[test]
    fn body_that_compiles_to_nothing_is_dropped() {
        let node = Node::Media {
            query: Interpolation::literal("print", 1),
            body: vec![Node::AtRule {
                name: "debug".to_string(),
                value: Interpolation::literal("x", 1),
                body: None,
                line: 1,
            }],
            line: 1,
        };
        assert_eq!(compile(&node, Some(".p"), &mut StubServices::new()), "");
    }

    #[test]
    fn declarations_wrap_in_parent_selector() {
        let mut services = StubServices::new();
        services.body = Body {
            declarations: vec!["color: red;".to_string()],
            blocks: Vec::new(),
        };
        let node = Node::Media {
            query: Interpolation::literal("print", 1),
            body: Vec::new(),
            line: 1,
        };
        assert_eq!(
            compile(&node, Some(".card"), &mut services),
            "@media print {\n  .card {\n    color: red;\n  }\n}\n"
        );
    }

    #[test]
    fn declarations_without_parent_stay_in_block() {
        let mut services = StubServices::new();
        services.body = Body {
            declarations: vec!["color: red;".to_string()],
            blocks: Vec::new(),
        };
        let node = Node::Container {
            query: Interpolation::literal("(min-width: 400px)", 1),
            body: Vec::new(),
            line: 1,
        };
        assert_eq!(
            compile(&node, None, &mut services),
            "@container (min-width: 400px) {\n  color: red;\n}\n"
        );
    }

    #[test]
    fn media_splits_selector_lists() {
        let mut services = StubServices::new();
        services.body = Body {
            declarations: Vec::new(),
            blocks: vec!["  .class1, .class2 {\n    color: blue;\n  }\n".to_string()],
        };
        let node = Node::Media {
            query: Interpolation::literal("screen and (min-width: 768px)", 1),
            body: Vec::new(),
            line: 1,
        };
        assert_eq!(
            compile(&node, None, &mut services),
            "@media screen and (min-width: 768px) {\n  .class1,\n  .class2 {\n    color: blue;\n  }\n}\n"
        );
    }

    #[test]
    fn supports_values_are_evaluated() {
        let node = Node::Supports {
            condition: Interpolation::literal("(width: 10px)", 1),
            body: Vec::new(),
            line: 1,
        };
        let css = compile(&node, None, &mut StubServices::new());
        assert!(css.starts_with("@supports (width: 10px) {"));
    }
}
