//! Directory watching, snapshot diffing, and artifact cleanup.

use super::info::ArtifactInfo;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File extensions recognized as artifacts, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp"];

/// Default watched directory name.
pub const DEFAULT_ARTIFACT_DIR: &str = "generated-diagrams";

/// Default time-to-live for the cached listing.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Diagnostic summary of the watched directory.
#[derive(Debug, Clone, Serialize)]
pub struct FolderInfo {
    /// Absolute (best-effort) path of the watched directory.
    pub path: PathBuf,
    /// Whether the directory currently exists.
    pub exists: bool,
    /// Number of artifacts currently listed.
    pub artifact_count: usize,
    /// Combined size of the listed artifacts, in bytes.
    pub total_size_bytes: u64,
}

#[derive(Default)]
struct WatcherCache {
    entries: Vec<ArtifactInfo>,
    scanned_at: Option<Instant>,
    last_snapshot: HashSet<PathBuf>,
}

/// Watches a single flat directory for artifact files.
///
/// Answers "what artifacts exist" and "what is new since a reference
/// snapshot". All filesystem failures degrade softly: a failed scan
/// falls back to the previous cached state rather than propagating.
/// The watcher exclusively owns its cache; callers must serialize
/// snapshot/diff pairs themselves (the executor's single worker does).
pub struct ArtifactWatcher {
    dir: PathBuf,
    ttl: Duration,
    cache: Mutex<WatcherCache>,
}

impl ArtifactWatcher {
    /// Creates a watcher over `dir`, creating the directory if absent.
    ///
    /// Directory creation is best-effort: on failure the watcher still
    /// works and every listing degrades to empty until the directory
    /// appears.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(error) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), %error, "failed to create artifact directory");
        }
        Self {
            dir,
            ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(WatcherCache::default()),
        }
    }

    /// Creates a watcher over the default `generated-diagrams` directory.
    #[must_use]
    pub fn with_default_dir() -> Self {
        Self::new(DEFAULT_ARTIFACT_DIR)
    }

    /// Overrides the listing cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The watched directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Enumerates matching files in the watched directory right now.
    ///
    /// Fails soft: on I/O error the previous successful snapshot is
    /// returned if available, else an empty set.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        match self.scan_paths() {
            Ok(paths) => {
                self.cache.lock().last_snapshot = paths.clone();
                paths
            }
            Err(error) => {
                warn!(dir = %self.dir.display(), %error, "snapshot failed; using previous");
                self.cache.lock().last_snapshot.clone()
            }
        }
    }

    /// Returns all artifacts, newest first.
    ///
    /// Serves from cache while it is younger than the TTL unless
    /// `force_refresh` is set. Regardless of cache state, entries whose
    /// backing file no longer exists are filtered out before return.
    #[must_use]
    pub fn list_all(&self, force_refresh: bool) -> Vec<ArtifactInfo> {
        let mut cache = self.cache.lock();

        let fresh = cache
            .scanned_at
            .is_some_and(|at| at.elapsed() < self.ttl);

        if force_refresh || !fresh {
            match self.scan_entries() {
                Ok(mut entries) => {
                    entries.sort_by(|a, b| {
                        (b.created_at, &b.filename).cmp(&(a.created_at, &a.filename))
                    });
                    cache.entries = entries;
                    cache.scanned_at = Some(Instant::now());
                    debug!(count = cache.entries.len(), "artifact directory scanned");
                }
                Err(error) => {
                    warn!(dir = %self.dir.display(), %error, "scan failed; serving cached listing");
                }
            }
        } else {
            debug!("artifact listing served from cache");
        }

        cache
            .entries
            .iter()
            .cloned()
            .map(ArtifactInfo::revalidate)
            .filter(|entry| entry.exists)
            .collect()
    }

    /// Returns artifact paths present now but absent from `before`,
    /// newest first by modification time (ties broken by path).
    ///
    /// Always takes a fresh snapshot; the listing cache TTL does not
    /// apply here. Task isolation is the caller's responsibility: the
    /// reference snapshot must be taken before the work whose outputs
    /// are being detected.
    #[must_use]
    pub fn detect_new(&self, before: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let current = self.snapshot();
        let mut new_files: Vec<PathBuf> = current.difference(before).cloned().collect();

        new_files.sort_by_key(|path| {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC);
            (std::cmp::Reverse(modified), path.clone())
        });

        new_files
    }

    /// Returns the artifact with the maximum `created_at`.
    ///
    /// Ties are broken deterministically: the lexicographically
    /// greatest filename wins.
    #[must_use]
    pub fn latest(&self) -> Option<ArtifactInfo> {
        self.list_all(false)
            .into_iter()
            .max_by(|a, b| (a.created_at, &a.filename).cmp(&(b.created_at, &b.filename)))
    }

    /// Deletes artifacts older than `max_age`, then the oldest excess
    /// beyond `max_count`. Returns the number successfully deleted.
    ///
    /// Individual deletion failures are logged and skipped. The cache
    /// is invalidated if anything was deleted.
    pub fn cleanup(&self, max_age: chrono::Duration, max_count: usize) -> usize {
        self.cleanup_at(Utc::now(), max_age, max_count)
    }

    pub(crate) fn cleanup_at(
        &self,
        now: DateTime<Utc>,
        max_age: chrono::Duration,
        max_count: usize,
    ) -> usize {
        let mut entries = self.list_all(true);
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut deleted = 0;

        entries.retain(|entry| {
            if now.signed_duration_since(entry.created_at) > max_age {
                if self.delete_file(&entry.path) {
                    deleted += 1;
                    info!(file = %entry.filename, "deleted aged artifact");
                    return false;
                }
            }
            true
        });

        if entries.len() > max_count {
            let excess = entries.len() - max_count;
            for entry in entries.iter().take(excess) {
                if self.delete_file(&entry.path) {
                    deleted += 1;
                    info!(file = %entry.filename, "deleted excess artifact");
                }
            }
        }

        if deleted > 0 {
            let mut cache = self.cache.lock();
            cache.entries.clear();
            cache.scanned_at = None;
        }

        deleted
    }

    /// Summarizes the watched directory for diagnostics.
    #[must_use]
    pub fn folder_info(&self) -> FolderInfo {
        let entries = self.list_all(false);
        FolderInfo {
            path: fs::canonicalize(&self.dir).unwrap_or_else(|_| self.dir.clone()),
            exists: self.dir.is_dir(),
            artifact_count: entries.len(),
            total_size_bytes: entries.iter().map(|e| e.size_bytes).sum(),
        }
    }

    fn scan_paths(&self) -> std::io::Result<HashSet<PathBuf>> {
        let mut paths = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_supported(&path) {
                paths.insert(absolute(&path));
            }
        }
        Ok(paths)
    }

    fn scan_entries(&self) -> std::io::Result<Vec<ArtifactInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_supported(&path) {
                if let Some(info) = ArtifactInfo::from_path(&path) {
                    entries.push(info);
                }
            }
        }
        Ok(entries)
    }

    fn delete_file(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(error) => {
                warn!(file = %path.display(), %error, "failed to delete artifact; skipping");
                false
            }
        }
    }
}

impl std::fmt::Debug for ArtifactWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactWatcher")
            .field("dir", &self.dir)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
