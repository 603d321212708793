//! Compiler configuration.
//!
//! [`CompilerOptions`] deserializes from any serde format with every key
//! optional, so a partial map such as `{"style": "compressed"}` yields the
//! defaults for everything else. [`PartialCompilerOptions`] overlays a
//! partial map onto options that are already resolved.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub style: OutputStyle,
    /// Record a mapping entry for every emitted style rule.
    pub source_map: bool,
    /// Embed the source text in the generated source map.
    pub include_sources: bool,
    /// Directories searched by the file loader, in order.
    pub load_paths: Vec<PathBuf>,
    /// Name used for the entry stylesheet in diagnostics and mappings.
    pub source_file: String,
    /// When set, a `sourceMappingURL` comment pointing here ends the CSS.
    pub source_map_file: Option<String>,
    pub output_file: Option<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            style: OutputStyle::Expanded,
            source_map: false,
            include_sources: false,
            load_paths: Vec::new(),
            source_file: "input.scss".to_string(),
            source_map_file: None,
            output_file: None,
        }
    }
}

/// Options where every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialCompilerOptions {
    pub style: Option<OutputStyle>,
    pub source_map: Option<bool>,
    pub include_sources: Option<bool>,
    pub load_paths: Option<Vec<PathBuf>>,
    pub source_file: Option<String>,
    pub source_map_file: Option<String>,
    pub output_file: Option<String>,
}

impl CompilerOptions {
    /// Overlay the fields present in `partial`.
    pub fn merge(self, partial: PartialCompilerOptions) -> Self {
        Self {
            style: partial.style.unwrap_or(self.style),
            source_map: partial.source_map.unwrap_or(self.source_map),
            include_sources: partial.include_sources.unwrap_or(self.include_sources),
            load_paths: partial.load_paths.unwrap_or(self.load_paths),
            source_file: partial.source_file.unwrap_or(self.source_file),
            source_map_file: partial.source_map_file.or(self.source_map_file),
            output_file: partial.output_file.or(self.output_file),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.style == OutputStyle::Compressed
    }
}
