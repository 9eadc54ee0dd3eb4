use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Component, Path, PathBuf};

/// Identifies one cached diff: an absolute file path and whether the staged
/// or the working-tree diff was requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub staged: bool,
}

impl CacheKey {
    pub fn new(path: PathBuf, staged: bool) -> Self {
        Self { path, staged }
    }
}

/// Diff text memoized by [`CacheKey`].
///
/// Entries never expire. An empty diff (unchanged file) is a real entry and
/// is returned like any other.
#[derive(Debug, Default)]
pub struct DiffCache {
    entries: HashMap<CacheKey, String>,
}

impl DiffCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store `diff` under `key`, returning the previous entry if any
    pub fn insert(&mut self, key: CacheKey, diff: String) -> Option<String> {
        self.entries.insert(key, diff)
    }

    /// Drop a single entry so the next request fetches it again
    pub fn remove(&mut self, key: &CacheKey) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&mut self, key: CacheKey) -> Entry<'_, CacheKey, String> {
        self.entries.entry(key)
    }
}

/// Make `path` absolute against `base` and drop `.` and `..` components.
///
/// Purely lexical: the file does not need to exist and symlinks are kept.
pub fn resolve_path(base: &Path, path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(base.join(path))?;

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}
