//! Discovery cache
//!
//! Memoizes per-file scan results across runs of one process (watch mode,
//! repeated build-script calls in tests). Keys are file paths; entries are
//! valid only while the content digest matches.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::model::FileScan;
use crate::source::SourceFile;

/// Hex SHA-256 over a file's module path and text
pub fn digest(file: &SourceFile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.module_path.join("::").as_bytes());
    hasher.update([0u8]);
    hasher.update(file.text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug)]
struct Entry {
    digest: String,
    scan: Arc<FileScan>,
}

/// Content-addressed cache of file scans.
///
/// Cheap to clone; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryCache {
    entries: Arc<DashMap<PathBuf, Entry>>,
}

impl DiscoveryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached scan of `file`, if its content is unchanged
    pub fn get(&self, file: &SourceFile, digest: &str) -> Option<Arc<FileScan>> {
        self.entries
            .get(&file.path)
            .filter(|entry| entry.digest == digest)
            .map(|entry| Arc::clone(&entry.scan))
    }

    /// Store the scan of `file`
    pub fn insert(&self, file: &SourceFile, digest: String, scan: Arc<FileScan>) {
        self.entries.insert(file.path.clone(), Entry { digest, scan });
    }

    /// Drop entries for files not in `keep`
    pub fn retain_paths(&self, keep: &[PathBuf]) {
        self.entries.retain(|path, _| keep.contains(path));
    }

    /// Get number of cached files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_tracks_content_and_module() {
        let a = SourceFile::root("lib.rs", "struct A;");
        let b = SourceFile::root("lib.rs", "struct B;");
        let c = SourceFile::new("lib.rs", vec!["crate".into(), "x".into()], "struct A;");
        assert_eq!(digest(&a), digest(&a.clone()));
        assert_ne!(digest(&a), digest(&b));
        assert_ne!(digest(&a), digest(&c));
        assert_eq!(digest(&a).len(), 64);
    }

    #[test]
    fn test_stale_entries_miss() {
        let cache = DiscoveryCache::new();
        let old = SourceFile::root("lib.rs", "struct A;");
        let new = SourceFile::root("lib.rs", "struct B;");

        cache.insert(&old, digest(&old), Arc::new(FileScan::default()));
        assert!(cache.get(&old, &digest(&old)).is_some());
        assert!(cache.get(&new, &digest(&new)).is_none());

        cache.retain_paths(&[]);
        assert!(cache.is_empty());
    }
}
