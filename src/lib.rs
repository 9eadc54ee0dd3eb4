//! Changed line ranges of a file, read from `git diff` hunk headers.
//!
//! [`DiffProvider`] fetches (and remembers) the zero-context diff of a file
//! against `HEAD`; [`ranges_for_diff`] turns diff text into the [`Range`]s of
//! lines that were added or modified.
//!
//! ```no_run
//! # use git_ranges::{DiffProvider, GitCli};
//! let mut provider = DiffProvider::new(GitCli::new("."));
//! for range in provider.get_ranges("src/main.rs", false).unwrap() {
//!     println!("lines {range} changed");
//! }
//! ```

use error_set::error_set;

mod cache;
pub mod cli;
mod hunk;
mod provider;
mod range;

pub use cache::{CacheKey, DiffCache, resolve_path};
pub use hunk::{HunkError, HunkHeader, is_hunk_header, parse_hunk_header, ranges_for_diff};
pub use provider::{DiffProvider, DiffSource, GitCli};
pub use range::Range;

error_set! {
    /// Top-level error for git-ranges operations
    GitRangesError := {
        HunkError(HunkError),
    } || GitCommandError

    /// Errors from resolving a file path and running git on it
    GitCommandError := {
        #[display("Failed to run git diff: {message}")]
        DiffFailed { message: String },
        #[display("git diff failed: {stderr}")]
        DiffExitError { stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
        #[display("Cannot resolve path '{path}': {message}")]
        ResolvePath { path: String, message: String },
    }
}
