//! `@at-root`
//!
//! The inherited parent selector may carry the enclosing media context as a
//! trailing `@media <query>` clause (`.parent @media screen`). Each
//! comma-separated group is split into its rule part and its media part,
//! and the `with`/`without` query decides which contexts survive:
//!
//! | query              | rule parts | media context      |
//! |--------------------|------------|--------------------|
//! | none               | dropped    | kept               |
//! | `without: rule`    | dropped    | kept               |
//! | `without: media`   | kept       | left (hoisted)     |
//! | `without: all`     | dropped    | left (hoisted)     |
//! | `with: media`      | kept       | kept               |
//! | `with: rule`       | kept       | left (hoisted)     |

use flagset::FlagSet;

use super::{indent, Capability, CompilationContext, RuleStrategy};
use crate::ast::{AtRootQuery, Node};
use crate::error::Result;
use crate::text_reflow::split_top_level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextType {
    Rule,
    Media,
}

impl ContextType {
    fn keyword(self) -> &'static str {
        match self {
            ContextType::Rule => "rule",
            ContextType::Media => "media",
        }
    }
}

/// One comma group of the parent selector.
#[derive(Debug, Clone, PartialEq)]
struct SelectorGroup {
    rule: String,
    media: Option<String>,
}

fn split_groups(parent: &str) -> Vec<SelectorGroup> {
    split_top_level(parent, ',')
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| match group.find("@media") {
            Some(at) => SelectorGroup {
                rule: group[..at].trim().to_string(),
                media: Some(group[at..].trim().to_string()),
            },
            None => SelectorGroup {
                rule: group.to_string(),
                media: None,
            },
        })
        .collect()
}

/// Whether the query removes `context`.
fn excludes(query: Option<&AtRootQuery>, context: ContextType) -> bool {
    let listed = |names: &[String]| {
        names
            .iter()
            .any(|n| n == "all" || n == context.keyword())
    };
    match query {
        None => context == ContextType::Rule,
        Some(AtRootQuery::Without(names)) => listed(names),
        // Rule parts survive a `with` list unless explicitly excluded.
        Some(AtRootQuery::With(names)) => context == ContextType::Media && !listed(names),
    }
}

pub struct AtRootStrategy;

impl AtRootStrategy {
    /// The selector left after filtering, and whether the media context is
    /// being left behind.
    fn filter(&self, parent: Option<&str>, query: Option<&AtRootQuery>) -> (String, bool) {
        let groups = parent.map(split_groups).unwrap_or_default();
        let in_media = groups.iter().any(|g| g.media.is_some());
        let keep_rules = !excludes(query, ContextType::Rule);
        let leave_media = in_media && excludes(query, ContextType::Media);
        let selector = if keep_rules {
            groups
                .iter()
                .map(|g| g.rule.as_str())
                .filter(|rule| !rule.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            String::new()
        };
        (selector, leave_media)
    }
}

impl RuleStrategy for AtRootStrategy {
    fn name(&self) -> &'static str {
        "at-root"
    }

    fn can_handle(&self, kind: &str) -> bool {
        kind == "at-root"
    }

    fn required(&self) -> FlagSet<Capability> {
        Capability::Ast | Capability::Interpolation | Capability::Declarations
    }

    fn compile(
        &self,
        node: &Node,
        parent_selector: Option<&str>,
        level: usize,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String> {
        let Node::AtRoot {
            selector,
            query,
            body,
            ..
        } = node
        else {
            return Ok(String::new());
        };
        let (filtered, leave_media) = self.filter(parent_selector, query.as_ref());
        let own = match selector {
            Some(selector) => Some(ctx.interpolate(&selector.text)?),
            None => None,
        };
        // An explicit selector resolves against whatever rule context is left.
        let effective = match (own, filtered.is_empty()) {
            (Some(own), true) => own,
            (Some(own), false) => nest(&filtered, &own),
            (None, _) => filtered,
        };
        let level = if leave_media { 0 } else { level };

        let compiled = ctx.compile_body(
            body,
            Some(effective.as_str()).filter(|s| !s.is_empty()),
            level,
        )?;
        let mut css = String::new();
        if !compiled.declarations.is_empty() {
            if effective.is_empty() {
                css.push_str(&ctx.format_declarations(&compiled.declarations, level)?);
            } else {
                let pad = indent(level);
                css.push_str(&format!("{}{} {{\n", pad, effective));
                css.push_str(&ctx.format_declarations(&compiled.declarations, level + 1)?);
                css.push_str(&format!("{}}}\n", pad));
            }
        }
        for block in compiled.blocks {
            css.push_str(&block);
        }
        if leave_media {
            ctx.hoist(css)?;
            return Ok(String::new());
        }
        Ok(css)
    }
}

/// Cross `child` with every `parent` group, honouring `&`.
pub(crate) fn nest(parent: &str, child: &str) -> String {
    let mut out = Vec::new();
    for p in split_top_level(parent, ',') {
        for c in split_top_level(child, ',') {
            if c.contains('&') {
                out.push(c.replace('&', p));
            } else {
                out.push(format!("{} {}", p, c));
            }
        }
    }
    out.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Interpolation, Selector};
    use crate::compiler::strategies::tests::StubServices;
    use crate::compiler::strategies::{Body, StrategyRegistry};
    use pretty_assertions::assert_eq;

    fn at_root(query: Option<AtRootQuery>, selector: Option<&str>) -> Node {
        Node::AtRoot {
            selector: selector.map(|s| Selector {
                text: Interpolation::literal(s, 1),
                line: 1,
            }),
            query,
            body: Vec::new(),
            line: 1,
        }
    }

    fn services_with_color() -> StubServices {
        let mut services = StubServices::new();
        services.body = Body {
            declarations: vec!["color: red;".to_string()],
            blocks: Vec::new(),
        };
        services
    }

    #[test]
    fn with_media_keeps_rule_part_only() {
        let mut services = services_with_color();
        let node = at_root(Some(AtRootQuery::With(vec!["media".to_string()])), None);
        let css = StrategyRegistry::default()
            .compile(&node, Some(".parent @media screen"), 1, &mut services)
            .unwrap();
        assert_eq!(css, "  .parent {\n    color: red;\n  }\n");
        assert!(services.hoisted.is_empty());
    }

    #[test]
    fn default_query_drops_the_parent_rule() {
        let mut services = services_with_color();
        let node = at_root(None, Some(".child"));
        let css = StrategyRegistry::default()
            .compile(&node, Some(".parent"), 0, &mut services)
            .unwrap();
        assert_eq!(css, ".child {\n  color: red;\n}\n");
    }

    #[test]
    fn empty_selector_leaves_declarations_unwrapped() {
        let mut services = services_with_color();
        let node = at_root(Some(AtRootQuery::Without(vec!["all".to_string()])), None);
        let css = StrategyRegistry::default()
            .compile(&node, Some(".a"), 1, &mut services)
            .unwrap();
        assert_eq!(css, "  color: red;\n");
    }

    #[test]
    fn without_media_hoists_to_root() {
        let mut services = services_with_color();
        let node = at_root(Some(AtRootQuery::Without(vec!["media".to_string()])), None);
        let css = StrategyRegistry::default()
            .compile(&node, Some(".a @media print"), 1, &mut services)
            .unwrap();
        assert_eq!(css, "");
        assert_eq!(services.hoisted, vec![".a {\n  color: red;\n}\n".to_string()]);
    }

    #[test]
    fn groups_split_rule_and_media_parts() {
        assert_eq!(
            split_groups(".a @media screen, .b"),
            vec![
                SelectorGroup {
                    rule: ".a".to_string(),
                    media: Some("@media screen".to_string()),
                },
                SelectorGroup {
                    rule: ".b".to_string(),
                    media: None,
                },
            ]
        );
    }
}
