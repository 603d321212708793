//! Stylesheet loaders.
//!
//! The code generator asks a [`Loader`] for the text behind every `@use`,
//! `@forward` and `@import` URL. Resolution tries, for each base location:
//!
//! 1. the path as written,
//! 2. the path with `.scss`, `.sass` and `.css` appended (when it has no
//!    extension of its own),
//! 3. the same again for the partial `_name` variant.
//!
//! [`FileLoader`] reads from disk relative to the working directory and then
//! each load path. [`MemoryLoader`] serves a fixed set of in-memory files.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{CompileError, CompileErrorKind};
use crate::normalizer::Syntax;

const EXTENSIONS: &[&str] = &["scss", "sass", "css"];

/// A resolved stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    /// Canonical location; modules are cached by it.
    pub path: String,
    pub contents: String,
    pub syntax: Syntax,
}

impl LoadedFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let path = path.into();
        let syntax = Syntax::from_path(&path);
        Self {
            path,
            contents: contents.into(),
            syntax,
        }
    }
}

pub trait Loader {
    /// Resolve `path` and return its contents, or a not-found error.
    fn load(&self, path: &str) -> Result<LoadedFile, CompileError>;
}

fn not_found(path: &str) -> CompileError {
    CompileError::new(CompileErrorKind::FileNotFound(path.to_string()))
}

/// Paths to try for `path`, most specific first.
pub fn candidates(path: &str) -> Vec<String> {
    let as_path = Path::new(path);
    let file_name = as_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    let partial = match as_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => dir
            .join(format!("_{}", file_name))
            .to_string_lossy()
            .into_owned(),
        None => format!("_{}", file_name),
    };
    let has_extension = as_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext));

    let mut out = vec![path.to_string()];
    if !has_extension {
        out.extend(EXTENSIONS.iter().map(|ext| format!("{}.{}", path, ext)));
    }
    if !file_name.starts_with('_') {
        out.push(partial.clone());
        if !has_extension {
            out.extend(EXTENSIONS.iter().map(|ext| format!("{}.{}", partial, ext)));
        }
    }
    out
}

// ============================================================================
// File system
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    load_paths: Vec<PathBuf>,
}

impl FileLoader {
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self { load_paths }
    }

    fn bases(&self, path: &str) -> Vec<String> {
        let mut bases = vec![path.to_string()];
        if Path::new(path).is_relative() {
            bases.extend(
                self.load_paths
                    .iter()
                    .map(|dir| dir.join(path).to_string_lossy().into_owned()),
            );
        }
        bases
    }
}

impl Loader for FileLoader {
    fn load(&self, path: &str) -> Result<LoadedFile, CompileError> {
        for base in self.bases(path) {
            for candidate in candidates(&base) {
                if !Path::new(&candidate).is_file() {
                    continue;
                }
                let contents = fs::read_to_string(&candidate).map_err(|err| {
                    tracing::debug!("reading {} failed: {}", candidate, err);
                    not_found(path)
                })?;
                tracing::debug!("loaded {} as {}", path, candidate);
                return Ok(LoadedFile::new(candidate, contents));
            }
        }
        Err(not_found(path))
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Serves stylesheets registered up front; nothing touches the disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &str) -> Result<LoadedFile, CompileError> {
        let path = path.strip_prefix("./").unwrap_or(path);
        candidates(path)
            .into_iter()
            .find_map(|candidate| {
                let contents = self.files.get(&candidate)?;
                Some(LoadedFile::new(candidate, contents.clone()))
            })
            .ok_or_else(|| not_found(path))
    }
}
