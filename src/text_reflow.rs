//! Text reflow
//!
//! Cosmetic and recombination passes over text that has already been
//! rendered. Nothing here looks at values; every decision is lexical.
//!
//! - [`split_selector_lists`] puts each member of a `.a, .b {` header on its
//!   own line inside media and container blocks.
//! - [`reflow_gradient_args`] glues back together gradient arguments that
//!   reached the gradient functions as separate words (`to` + `right`,
//!   `45` + `deg`, `red` + `10%`).
//! - [`compress`] rewrites expanded output in the compressed style.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single-line rule header containing a comma, e.g. `  .a, .b {`.
static SELECTOR_LIST_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([^@{}\s][^{}]*,[^{}]*?)\s*\{$").unwrap());

static SIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(top|bottom|left|right)$").unwrap());

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").unwrap());

static ANGLE_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(deg|rad|grad|turn)$").unwrap());

static STOP_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d+\.?\d*|\.\d+)(%|px|em|rem|vw|vh|vmin|vmax|ch|ex|cm|mm|in|pt|pc)?$")
        .unwrap()
});

static COLOR_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9a-fA-F]{3,8}|[a-zA-Z]+|(rgba?|hsla?|hwb|lab|lch|oklab|oklch|color|var)\(.*\))$")
        .unwrap()
});

/// A comment not marked `/*!` for preservation.
static LOUD_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*([^!].*?)?\*/").unwrap());

static DECLARATION_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:\s]+):\s+").unwrap());

/// Split `text` on `separator` outside parentheses, brackets and quotes.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth -= 1,
            (None, _) if c == separator && depth == 0 => {
                parts.push(text[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// Rewrite every `{indent}.a, .b {` header line as one selector per line.
pub fn split_selector_lists(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    for line in css.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        match SELECTOR_LIST_HEADER.captures(body) {
            Some(caps) => {
                let indent = &caps[1];
                let selectors = split_top_level(&caps[2], ',');
                out.push_str(indent);
                out.push_str(&selectors.join(&format!(",\n{}", indent)));
                out.push_str(" {");
                out.push_str(newline);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Drop indentation, newlines, unpreserved comments, the space after each
/// property colon and the last `;` of every block.
pub fn compress(css: &str) -> String {
    let stripped = LOUD_COMMENT.replace_all(css, "");
    let mut out = String::with_capacity(stripped.len());
    for line in stripped.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.ends_with('{') {
            out.push_str(&line.replace(", ", ",").replace(" {", "{"));
        } else if line.starts_with('}') || line.starts_with("/*") {
            out.push_str(line);
        } else {
            out.push_str(&DECLARATION_COLON.replace(line, "$1:"));
        }
    }
    out.replace(";}", "}")
}

/// Recombine gradient arguments into comma-separated gradient segments.
pub fn reflow_gradient_args(args: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let segments = args
        .iter()
        .flat_map(|arg| split_top_level(arg, ','))
        .filter(|segment| !segment.is_empty());
    for segment in segments {
        if let Some(last) = out.last_mut() {
            if continues_direction(last, segment) || continues_stop(last, segment) {
                last.push(' ');
                last.push_str(segment);
                continue;
            }
            if BARE_NUMBER.is_match(last) && ANGLE_UNIT.is_match(segment) {
                last.push_str(segment);
                continue;
            }
        }
        out.push(segment.to_string());
    }
    out
}

/// `to` followed by up to two side keywords.
fn continues_direction(last: &str, segment: &str) -> bool {
    let words: Vec<&str> = last.split_whitespace().collect();
    SIDE.is_match(segment) && words.first() == Some(&"to") && words.len() < 3
}

/// A lone color followed by its stop position.
fn continues_stop(last: &str, segment: &str) -> bool {
    last != "to" && COLOR_WORD.is_match(last) && STOP_POSITION.is_match(segment)
}
