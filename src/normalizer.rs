//! Syntax normalizers.
//!
//! Everything after this stage speaks SCSS. The indented syntax is turned
//! into SCSS line by line before tokenization; SCSS and plain CSS pass
//! through untouched.
//!
//! ## Indented syntax
//! - The indent unit is the smallest non-zero leading whitespace run.
//! - A line followed by a deeper line opens a block (` {`); the matching
//!   `}` is emitted when indentation drops back.
//! - Other lines become statements and gain a `;`, except selector lines
//!   ending in `,`, which continue onto the next line.
//! - `=name` and `+name` are the `@mixin` and `@include` shorthands.
//! - `/*` comments swallow their deeper-indented continuation lines and are
//!   closed if the source left them open; `//` comments are kept as-is.
//! - Blank lines survive, and the output keeps the source's line endings
//!   and trailing newline.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Scss,
    /// The whitespace-sensitive `.sass` dialect.
    Indented,
    Css,
}

impl Syntax {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("sass") => Syntax::Indented,
            Some("css") => Syntax::Css,
            _ => Syntax::Scss,
        }
    }
}

pub trait SyntaxNormalizer {
    fn supports(&self, syntax: Syntax) -> bool;

    /// Rewrite `source` as SCSS.
    fn normalize(&self, source: &str) -> String;
}

pub struct ScssNormalizer;

impl SyntaxNormalizer for ScssNormalizer {
    fn supports(&self, syntax: Syntax) -> bool {
        matches!(syntax, Syntax::Scss | Syntax::Css)
    }

    fn normalize(&self, source: &str) -> String {
        source.to_string()
    }
}

pub struct IndentedNormalizer;

/// Leading whitespace width, counting a tab as one column.
fn leading_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// The smallest indentation step used in `source`, or 2 when nothing is
/// indented.
pub fn indent_unit(source: &str) -> usize {
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_width)
        .filter(|width| *width > 0)
        .min()
        .unwrap_or(2)
}

impl IndentedNormalizer {
    fn statement(text: &str) -> String {
        if let Some(rest) = text.strip_prefix('=') {
            format!("@mixin {}", rest.trim_start())
        } else if let Some(rest) = text.strip_prefix('+') {
            format!("@include {}", rest.trim_start())
        } else {
            text.to_string()
        }
    }
}

impl SyntaxNormalizer for IndentedNormalizer {
    fn supports(&self, syntax: Syntax) -> bool {
        syntax == Syntax::Indented
    }

    fn normalize(&self, source: &str) -> String {
        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let unit = indent_unit(source);
        let lines: Vec<&str> = source.lines().collect();
        let depth_of = |line: &str| leading_width(line) / unit;
        let pad = |depth: usize| "  ".repeat(depth);

        let mut out: Vec<String> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut blank_lines = 0;
        let mut index = 0;
        while index < lines.len() {
            let line = lines[index];
            index += 1;
            let text = line.trim();
            if text.is_empty() {
                blank_lines += 1;
                continue;
            }
            let depth = depth_of(line);
            while let Some(&top) = open.last() {
                if top < depth {
                    break;
                }
                open.pop();
                out.push(format!("{}}}", pad(top)));
            }
            out.extend(std::iter::repeat(String::new()).take(blank_lines));
            blank_lines = 0;

            if text.starts_with("/*") {
                let width = leading_width(line);
                let mut comment = vec![format!("{}{}", pad(depth), text)];
                while index < lines.len()
                    && (lines[index].trim().is_empty() || leading_width(lines[index]) > width)
                    && !comment.last().is_some_and(|last| last.contains("*/"))
                {
                    if !lines[index].trim().is_empty() {
                        comment.push(lines[index].trim_end().to_string());
                    }
                    index += 1;
                }
                if let Some(last) = comment.last_mut() {
                    if !last.contains("*/") {
                        last.push_str(" */");
                    }
                }
                out.extend(comment);
                continue;
            }
            if text.starts_with("//") || text.ends_with(',') {
                out.push(format!("{}{}", pad(depth), text));
                continue;
            }

            let opens_block = lines[index..]
                .iter()
                .find(|next| !next.trim().is_empty())
                .is_some_and(|next| depth_of(next) > depth);
            let statement = Self::statement(text);
            if opens_block {
                out.push(format!("{}{} {{", pad(depth), statement));
                open.push(depth);
            } else if statement.ends_with([';', '{', '}']) {
                out.push(format!("{}{}", pad(depth), statement));
            } else {
                out.push(format!("{}{};", pad(depth), statement));
            }
        }
        while let Some(top) = open.pop() {
            out.push(format!("{}}}", pad(top)));
        }

        let mut scss = out.join(newline);
        if source.ends_with('\n') {
            scss.push_str(newline);
        }
        tracing::debug!("normalized {} indented lines (indent unit {})", lines.len(), unit);
        scss
    }
}

/// Normalize `source` with the first normalizer supporting `syntax`.
pub fn normalize(source: &str, syntax: Syntax) -> String {
    let normalizers: [&dyn SyntaxNormalizer; 2] = [&IndentedNormalizer, &ScssNormalizer];
    normalizers
        .iter()
        .find(|normalizer| normalizer.supports(syntax))
        .map(|normalizer| normalizer.normalize(source))
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scss_passes_through() {
        let source = ".a {\n  color: red;\n}\n";
        assert_eq!(ScssNormalizer.normalize(source), source);
        assert!(!ScssNormalizer.supports(Syntax::Indented));
    }

    #[test]
    fn nested_rules_get_braces() {
        let scss = IndentedNormalizer.normalize(".nav\n  color: red\n  &:hover\n    color: blue");
        assert_eq!(
            scss,
            ".nav {\n  color: red;\n  &:hover {\n    color: blue;\n  }\n}"
        );
    }

    #[test]
    fn line_endings_are_preserved() {
        let scss = IndentedNormalizer.normalize(".a\r\n  color: red\r\n");
        assert_eq!(scss, ".a {\r\n  color: red;\r\n}\r\n");
    }

    #[test]
    fn indent_unit_is_the_smallest_step() {
        assert_eq!(indent_unit(".a\n    color: red\n    .b\n        x: y\n"), 4);
        assert_eq!(indent_unit(".a {}"), 2);
    }

    #[test]
    fn mixin_shorthands_expand() {
        let scss = IndentedNormalizer.normalize("=bordered($w)\n  border: $w solid\n.box\n  +bordered(1px)\n");
        assert_eq!(
            scss,
            "@mixin bordered($w) {\n  border: $w solid;\n}\n.box {\n  @include bordered(1px);\n}\n"
        );
    }

    #[test]
    fn blank_lines_and_selector_continuations() {
        let scss = IndentedNormalizer.normalize(".a,\n.b\n  x: 1\n\n.c\n  y: 2\n");
        assert_eq!(scss, ".a,\n.b {\n  x: 1;\n}\n\n.c {\n  y: 2;\n}\n");
    }

    #[test]
    fn open_block_comments_are_closed() {
        let scss = IndentedNormalizer.normalize("/* note\n   more\n.a\n  x: 1\n");
        assert_eq!(scss, "/* note\n   more */\n.a {\n  x: 1;\n}\n");
    }
}
