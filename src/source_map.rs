//! Source mapping.
//!
//! The code generator records a [`PendingMapping`] for every style rule
//! header it emits. Once the final CSS text exists (after compression, if
//! any) [`resolve`] walks it once, in emission order, to find where each
//! header landed.

use serde::Serialize;

use crate::text_reflow::split_top_level;

/// One generated position and the source position it came from. Lines are
/// 1-based, columns 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_column: usize,
    pub original_line: usize,
    pub original_column: usize,
    pub source: String,
}

/// A rule header whose output position is not known yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMapping {
    pub selector: String,
    pub source: String,
    pub original_line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<String>,
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new(file: Option<String>) -> Self {
        Self {
            version: 3,
            file,
            sources: Vec::new(),
            sources_content: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Register `name`, with its text when sources are embedded. Returns its
    /// index in `sources`.
    pub fn add_source(&mut self, name: &str, content: Option<String>) -> usize {
        if let Some(index) = self.sources.iter().position(|source| source == name) {
            return index;
        }
        self.sources.push(name.to_string());
        if let Some(content) = content {
            self.sources_content.push(content);
        }
        self.sources.len() - 1
    }
}

/// 1-based line and 0-based column of byte `offset`.
fn position(css: &str, offset: usize) -> (usize, usize) {
    let before = &css[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |newline| offset - newline - 1);
    (line, column)
}

/// Locate each pending header in `css`. Headers are searched in order, each
/// after the previous one; a header that cannot be found is skipped.
pub fn resolve(css: &str, pending: &[PendingMapping]) -> Vec<Mapping> {
    let mut mappings = Vec::new();
    let mut cursor = 0;
    for entry in pending {
        let first = split_top_level(&entry.selector, ',')
            .into_iter()
            .next()
            .unwrap_or_default();
        if first.is_empty() {
            continue;
        }
        let mut search = cursor;
        let found = loop {
            let Some(relative) = css[search..].find(first) else {
                break None;
            };
            let start = search + relative;
            let end = start + first.len();
            let next = css[end..].trim_start().chars().next();
            if matches!(next, Some('{') | Some(',')) {
                break Some((start, end));
            }
            search = end;
        };
        match found {
            Some((start, end)) => {
                let (line, column) = position(css, start);
                mappings.push(Mapping {
                    generated_line: line,
                    generated_column: column,
                    original_line: entry.original_line,
                    original_column: 0,
                    source: entry.source.clone(),
                });
                cursor = end;
            }
            None => tracing::trace!("no output position for {}", entry.selector),
        }
    }
    mappings
}
