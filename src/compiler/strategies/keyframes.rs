//! `@keyframes` and vendor-prefixed variants.

use flagset::FlagSet;

use super::{indent, Capability, CompilationContext, RuleStrategy};
use crate::ast::Node;
use crate::error::Result;

pub struct KeyframesStrategy;

impl RuleStrategy for KeyframesStrategy {
    fn name(&self) -> &'static str {
        "keyframes"
    }

    fn can_handle(&self, kind: &str) -> bool {
        kind == "keyframes" || kind.ends_with("-keyframes")
    }

    fn required(&self) -> FlagSet<Capability> {
        Capability::Evaluate | Capability::Format | Capability::Interpolation
    }

    fn compile(
        &self,
        node: &Node,
        _parent_selector: Option<&str>,
        level: usize,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String> {
        let Node::Keyframes {
            keyword,
            name,
            blocks,
            ..
        } = node
        else {
            return Ok(String::new());
        };
        let name = ctx.interpolate(name)?;
        let (outer, frame, decl) = (indent(level), indent(level + 1), indent(level + 2));
        let mut css = format!("{}@{} {} {{\n", outer, keyword, name);
        for block in blocks {
            css.push_str(&format!("{}{} {{\n", frame, block.selectors.join(", ")));
            for declaration in &block.declarations {
                let Some(expr) = &declaration.value else {
                    continue;
                };
                let property = ctx.interpolate(&declaration.property)?;
                let value = ctx.evaluate(expr)?;
                let mut text = ctx.format(&value)?;
                if text.is_empty() {
                    continue;
                }
                if declaration.important {
                    text.push_str(" !important");
                }
                css.push_str(&format!("{}{}: {};\n", decl, property, text));
            }
            css.push_str(&format!("{}}}\n", frame));
        }
        css.push_str(&format!("{}}}\n", outer));
        Ok(css)
    }
}
