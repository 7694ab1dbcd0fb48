//! Artifact metadata and title derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for one artifact file in the watched directory.
///
/// Only returned to callers while `exists` is true at listing time;
/// stale entries pointing at deleted files are filtered out before
/// return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// File name component of the path.
    pub filename: String,

    /// Human-readable title derived from the filename.
    pub title: String,

    /// Creation instant (falls back to modification time on platforms
    /// without a creation timestamp).
    pub created_at: DateTime<Utc>,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Whether the backing file existed when the info was read.
    pub exists: bool,
}

impl ArtifactInfo {
    /// Reads metadata for a file, returning `None` if it cannot be
    /// read (the caller treats that as "not an artifact").
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        let filename = path.file_name()?.to_str()?.to_string();
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .ok()?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(path)
        };

        Some(Self {
            path: absolute,
            title: derive_title(&filename),
            filename,
            created_at: DateTime::<Utc>::from(created),
            size_bytes: metadata.len(),
            exists: true,
        })
    }

    /// Re-checks whether the backing file still exists.
    #[must_use]
    pub fn revalidate(mut self) -> Self {
        self.exists = self.path.is_file();
        self
    }
}

/// Derives a human-readable title from a filename.
///
/// Strips the extension, replaces underscores and hyphens with spaces,
/// capitalizes each word, and appends " Diagram" unless the name
/// already mentions a diagram or architecture.
#[must_use]
pub fn derive_title(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let spaced = stem.replace(['_', '-'], " ");
    let mut title = spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    let lower = title.to_lowercase();
    if !lower.contains("diagram") && !lower.contains("architecture") {
        title.push_str(" Diagram");
    }

    title
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
