//! A filesystem-backed `FileRegistry`: resolves an opaque
//! `file_id` to an absolute path under a per-caller upload directory.
//! Real multi-tenant identity and persisted file metadata live at the
//! HTTP boundary, out of scope for this crate; this implementation only
//! needs to satisfy the contract the engine calls through.

use dataflow_engine::FileRegistry;
use std::path::{Path, PathBuf};

/// Looks up `file_id` as a directory entry under
/// `{upload_dir}/{caller_identity}/` whose filename begins with the id —
/// this tolerates the host storing uploads as `{file_id}_{original_name}`
/// or `{file_id}.xlsx` without the engine needing to know which.
pub struct FilesystemFileRegistry {
    upload_dir: PathBuf,
}

impl FilesystemFileRegistry {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    fn caller_dir(&self, caller_identity: &str) -> PathBuf {
        self.upload_dir.join(caller_identity)
    }
}

impl FileRegistry for FilesystemFileRegistry {
    fn resolve(&self, file_id: &str, caller_identity: &str) -> Option<PathBuf> {
        let dir = self.caller_dir(caller_identity);
        let entries = std::fs::read_dir(&dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(file_id) {
                return Some(entry.path());
            }
        }
        None
    }
}

/// A registry over a flat `file_id -> path` map, useful for tests and for
/// embedding callers that already resolve uploads themselves.
pub struct StaticFileRegistry {
    entries: std::collections::HashMap<String, PathBuf>,
}

impl StaticFileRegistry {
    pub fn new() -> Self {
        Self {
            entries: std::collections::HashMap::new(),
        }
    }

    pub fn insert(&mut self, file_id: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        self.entries.insert(file_id.into(), path.into());
        self
    }
}

impl Default for StaticFileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRegistry for StaticFileRegistry {
    fn resolve(&self, file_id: &str, _caller_identity: &str) -> Option<PathBuf> {
        self.entries.get(file_id).cloned()
    }
}

#[allow(dead_code)]
fn _assert_path_is_opaque(_: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_prefix_match_within_the_caller_scope() {
        let dir = tempfile::tempdir().unwrap();
        let caller_dir = dir.path().join("alice");
        std::fs::create_dir_all(&caller_dir).unwrap();
        std::fs::write(caller_dir.join("abc123_sales.xlsx"), b"").unwrap();

        let registry = FilesystemFileRegistry::new(dir.path());
        let resolved = registry.resolve("abc123", "alice").unwrap();
        assert_eq!(resolved.file_name().unwrap().to_string_lossy(), "abc123_sales.xlsx");
    }

    #[test]
    fn returns_none_for_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FilesystemFileRegistry::new(dir.path());
        assert!(registry.resolve("missing", "alice").is_none());
    }

    #[test]
    fn static_registry_is_exact_match() {
        let mut registry = StaticFileRegistry::new();
        registry.insert("f1", "/tmp/f1.csv");
        assert_eq!(registry.resolve("f1", "anyone").unwrap(), PathBuf::from("/tmp/f1.csv"));
        assert!(registry.resolve("f2", "anyone").is_none());
    }
}
