use crate::cache::{CacheKey, DiffCache, resolve_path};
use crate::hunk::ranges_for_diff;
use crate::range::Range;
use crate::{GitCommandError, GitRangesError};
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Something that can produce the unified diff of one file against `HEAD`.
pub trait DiffSource {
    /// Directory that relative file paths are resolved against
    fn work_dir(&self) -> &Path;

    /// Diff of the file at the absolute `path`, staged or working tree
    fn diff(&self, path: &Path, staged: bool) -> Result<String, GitCommandError>;
}

/// [`DiffSource`] backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    /// Run git from inside `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }
}

impl DiffSource for GitCli {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs `git diff --diff-filter=ACM --unified=0 [--staged] HEAD -- <path>`
    fn diff(&self, path: &Path, staged: bool) -> Result<String, GitCommandError> {
        let mut command = Command::new("git");
        command.arg("-C").arg(&self.work_dir).args([
            "diff",
            "--no-ext-diff",
            "--no-color",
            "--diff-filter=ACM",
            "--unified=0",
        ]);
        if staged {
            command.arg("--staged");
        }
        command.arg("HEAD").arg("--").arg(path);

        debug!(?command, "running git diff");
        let output = command.output().map_err(|e| GitCommandError::DiffFailed {
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::DiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}

/// Fetches per-file diffs, remembering each one for the provider's lifetime.
///
/// # Examples
/// ```no_run
/// # use git_ranges::{DiffProvider, GitCli};
/// let mut provider = DiffProvider::new(GitCli::new("."));
/// let diff = provider.get_diff("src/lib.rs", false).unwrap();
/// println!("{diff}");
/// let ranges = provider.get_ranges("src/lib.rs", true).unwrap();
/// ```
#[derive(Debug)]
pub struct DiffProvider<S = GitCli> {
    source: S,
    cache: DiffCache,
}

impl<S: DiffSource> DiffProvider<S> {
    /// Create a provider with an empty cache
    pub fn new(source: S) -> Self {
        Self::with_cache(source, DiffCache::new())
    }

    /// Create a provider that reads and fills an existing cache
    pub fn with_cache(source: S, cache: DiffCache) -> Self {
        Self { source, cache }
    }

    /// Unified diff of `file_path` against `HEAD`.
    ///
    /// Only the first request for a given file and `staged` flag runs the
    /// source; later ones return the remembered text, even when it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GitCommandError`] if the path cannot be made absolute or the
    /// source fails. Failures are not cached.
    pub fn get_diff(
        &mut self,
        file_path: impl AsRef<Path>,
        staged: bool,
    ) -> Result<&str, GitCommandError> {
        let key = self.key(file_path.as_ref(), staged)?;

        match self.cache.entry(key) {
            Entry::Occupied(entry) => {
                debug!(path = %entry.key().path.display(), staged, "diff cache hit");
                Ok(entry.into_mut().as_str())
            }
            Entry::Vacant(entry) => {
                debug!(path = %entry.key().path.display(), staged, "diff cache miss");
                let diff = self.source.diff(&entry.key().path, staged)?;
                Ok(entry.insert(diff).as_str())
            }
        }
    }

    /// Added-line ranges of `file_path` against `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns [`GitRangesError`] if the diff cannot be fetched or one of its
    /// hunk headers is malformed.
    pub fn get_ranges(
        &mut self,
        file_path: impl AsRef<Path>,
        staged: bool,
    ) -> Result<Vec<Range>, GitRangesError> {
        Ok(ranges_for_diff(self.get_diff(file_path, staged)?)?)
    }

    /// Forget the remembered diff for `file_path`, returning it if present
    ///
    /// # Errors
    ///
    /// Returns [`GitCommandError::ResolvePath`] if the path cannot be made absolute.
    pub fn invalidate(
        &mut self,
        file_path: impl AsRef<Path>,
        staged: bool,
    ) -> Result<Option<String>, GitCommandError> {
        let key = self.key(file_path.as_ref(), staged)?;
        Ok(self.cache.remove(&key))
    }

    pub fn cache(&self) -> &DiffCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DiffCache {
        &mut self.cache
    }

    /// Take the cache back, e.g. to hand it to another provider
    pub fn into_cache(self) -> DiffCache {
        self.cache
    }

    fn key(&self, file_path: &Path, staged: bool) -> Result<CacheKey, GitCommandError> {
        let path = resolve_path(self.source.work_dir(), file_path).map_err(|e| {
            GitCommandError::ResolvePath {
                path: file_path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(CacheKey::new(path, staged))
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use std::cell::{Cell, RefCell};

    const HUNKS: &str = "diff --git a/mockfile.js b/mockfile.js
index 1d2a6d3..8f4c2b1 100644
--- a/mockfile.js
+++ b/mockfile.js
@@ -3,0 +4 @@ import * as path from \"path\";
+import { Range } from \"./Range\";
@@ -11,2 +12,3 @@ const diffCacheKey = (filePath, staged) =>
-a
-b
+c
+d
+e
";

    /// Counts invocations and records the paths it was asked about
    struct FakeGit {
        output: String,
        calls: Cell<usize>,
        requests: RefCell<Vec<(PathBuf, bool)>>,
        fail_next: Cell<bool>,
    }

    impl FakeGit {
        fn returning(output: &str) -> Self {
            Self {
                output: output.to_string(),
                calls: Cell::new(0),
                requests: RefCell::new(Vec::new()),
                fail_next: Cell::new(false),
            }
        }
    }

    impl DiffSource for &FakeGit {
        fn work_dir(&self) -> &Path {
            Path::new("/repo")
        }

        fn diff(&self, path: &Path, staged: bool) -> Result<String, GitCommandError> {
            self.calls.set(self.calls.get() + 1);
            self.requests.borrow_mut().push((path.to_path_buf(), staged));
            if self.fail_next.replace(false) {
                return Err(GitCommandError::DiffExitError {
                    stderr: "fatal: bad revision 'HEAD'".to_string(),
                });
            }
            Ok(self.output.clone())
        }
    }

    #[test]
    fn get_diff_returns_source_output() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        let diff = provider.get_diff("./mockfile.js", false).unwrap();

        assert!(diff.contains("diff --git"));
        assert!(diff.contains("@@"));
        assert_eq!(git.calls.get(), 1);
    }

    #[test]
    fn second_request_hits_the_cache() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        let first = provider.get_diff("./mockfileCache.js", false).unwrap().to_owned();
        let second = provider.get_diff("./mockfileCache.js", false).unwrap().to_owned();
        assert_eq!(git.calls.get(), 1);
        assert_eq!(first, second);

        provider.get_diff("./mockfileMiss.js", false).unwrap();
        assert_eq!(git.calls.get(), 2);
    }

    #[test]
    fn relative_spellings_share_an_entry() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        for path in ["a.js", "./a.js", "lib/../a.js", "/repo/a.js"] {
            provider.get_diff(path, false).unwrap();
        }

        assert_eq!(git.calls.get(), 1);
        assert_eq!(provider.cache().len(), 1);
    }

    #[test]
    fn source_receives_absolute_path() {
        let git = FakeGit::returning("");
        let mut provider = DiffProvider::new(&git);

        provider.get_diff("src/./with space.js", true).unwrap();

        assert_eq!(
            *git.requests.borrow(),
            vec![(PathBuf::from("/repo/src/with space.js"), true)]
        );
    }

    #[test]
    fn staged_and_unstaged_are_separate_entries() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        provider.get_diff("a.js", false).unwrap();
        provider.get_diff("a.js", true).unwrap();
        provider.get_diff("a.js", true).unwrap();

        assert_eq!(git.calls.get(), 2);
    }

    #[test]
    fn empty_diff_is_cached() {
        let git = FakeGit::returning("");
        let mut provider = DiffProvider::new(&git);

        assert_eq!(provider.get_diff("unchanged.js", false).unwrap(), "");
        assert_eq!(provider.get_diff("unchanged.js", false).unwrap(), "");
        assert_eq!(git.calls.get(), 1);
    }

    #[test]
    fn failures_surface_and_are_not_cached() {
        let git = FakeGit::returning(HUNKS);
        git.fail_next.set(true);
        let mut provider = DiffProvider::new(&git);

        let err = provider.get_diff("a.js", false).unwrap_err();
        assert!(matches!(err, GitCommandError::DiffExitError { .. }));
        assert!(provider.cache().is_empty());

        provider.get_diff("a.js", false).unwrap();
        assert_eq!(git.calls.get(), 2);
    }

    #[test]
    fn invalidate_forces_a_refetch() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        provider.get_diff("a.js", false).unwrap();
        let removed = provider.invalidate("./a.js", false).unwrap();
        assert_eq!(removed.as_deref(), Some(HUNKS));

        provider.get_diff("a.js", false).unwrap();
        assert_eq!(git.calls.get(), 2);
    }

    #[test]
    fn injected_cache_is_used_and_returned() {
        let mut cache = DiffCache::new();
        cache.insert(CacheKey::new("/repo/a.js".into(), false), "@@ -1 +1 @@".into());

        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::with_cache(&git, cache);

        assert_eq!(provider.get_diff("a.js", false).unwrap(), "@@ -1 +1 @@");
        assert_eq!(git.calls.get(), 0);

        provider.get_diff("b.js", false).unwrap();
        assert_eq!(provider.into_cache().len(), 2);
    }

    #[test]
    fn get_ranges_parses_the_cached_diff() {
        let git = FakeGit::returning(HUNKS);
        let mut provider = DiffProvider::new(&git);

        let ranges = provider.get_ranges("mockfile.js", false).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(4, 5).unwrap(), Range::new(12, 15).unwrap()]
        );

        provider.get_ranges("mockfile.js", false).unwrap();
        assert_eq!(git.calls.get(), 1);
    }

    #[test]
    fn get_ranges_reports_malformed_headers() {
        let git = FakeGit::returning("@@ not-a-real-header @@\n");
        let mut provider = DiffProvider::new(&git);

        let err = provider.get_ranges("a.js", false).unwrap_err();
        assert!(matches!(err, GitRangesError::HunkError(_)));
    }
}
