//! Source files read from below the source root

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A source file split into lines. Invalid UTF-8 is replaced, never rejected.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    lines: Vec<String>,
}

impl SourceFile {
    /// Read `rel` relative to `root`. Absolute paths are read as-is.
    pub fn read(root: &Path, rel: &Path) -> Result<Self> {
        let path = root.join(rel);
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_text(path, &String::from_utf8_lossy(&bytes)))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        SourceFile {
            path: path.into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Line count of `rel` below `root`, or `None` when it cannot be read.
pub fn line_count(root: &Path, rel: &Path) -> Option<u32> {
    match SourceFile::read(root, rel) {
        Ok(file) => Some(file.line_count() as u32),
        Err(e) => {
            tracing::debug!("{e:#}");
            None
        }
    }
}
