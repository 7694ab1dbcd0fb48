//! Artifact file detection over a watched directory.

pub mod info;
pub mod watcher;

pub use info::ArtifactInfo;
pub use watcher::{
    ArtifactWatcher, FolderInfo, DEFAULT_ARTIFACT_DIR, DEFAULT_CACHE_TTL, SUPPORTED_EXTENSIONS,
};
