//! Hunk header parsing.
//!
//! Turns the `@@ -old[,count] +new[,count] @@` headers of a unified diff into
//! the [`Range`]s of lines that were added in the new version of the file.
//!
//! Parsing happens in two stages. [`is_hunk_header`] is a cheap shape check
//! that decides whether a line is a header at all; [`parse_hunk_header`] then
//! extracts the new-file side. A line that passes the first stage but fails
//! the second is an error: the diff is not in a format we understand and
//! ranges derived from it cannot be trusted.
//!
//! # Examples
//!
//! ```
//! use git_ranges::{Range, ranges_for_diff};
//!
//! let diff = "\
//! @@ -136,0 +137 @@
//! +      debug = true;
//! @@ -15 +15,0 @@
//! -      enableAutosuggestions = true;
//! @@ -38,0 +39,5 @@ line 38
//! ";
//! let ranges = ranges_for_diff(diff).unwrap();
//! assert_eq!(ranges, vec![
//!     Range::new(137, 138).unwrap(),
//!     Range::new(39, 44).unwrap(),
//! ]);
//! ```

use crate::range::Range;
use error_set::error_set;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::opt,
    sequence::preceded,
};
use tracing::trace;

error_set! {
    /// Errors from parsing hunk headers
    HunkError := {
        /// Line looks like a hunk header but has no usable new-file range
        #[display("Malformed hunk header '{line}'")]
        MalformedHunkHeader { line: String },
        /// New-file range starts at line 0 but claims added lines
        #[display("Hunk header '{line}' adds lines starting at line 0")]
        ZeroStart { line: String },
        /// New-file range ends past the largest representable line number
        #[display("Hunk range +{start},{count} overflows")]
        RangeOverflow { start: u32, count: u32 },
    }
}

/// The new-file side of a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    /// First line of the hunk in the new file
    pub new_start: u32,
    /// Number of new-file lines covered; 1 when the header omits it
    pub new_count: u32,
}

impl HunkHeader {
    /// Lines added by this hunk, or `None` for a pure deletion.
    #[must_use]
    pub fn added_range(&self) -> Option<Range> {
        if self.new_count == 0 {
            return None;
        }
        let end = self.new_start.checked_add(self.new_count)?;
        Range::new(self.new_start, end)
    }
}

/// Whether `line` has the shape of a hunk header (`@@ ... @@`).
#[must_use]
pub fn is_hunk_header(line: &str) -> bool {
    line.strip_prefix("@@ ")
        .is_some_and(|rest| rest.contains(" @@"))
}

/// Extract the new-file range from a hunk header line.
///
/// The new-file side is the last ` +<start>[,<count>] @@` in the header, so
/// function context that happens to end in ` +N @@` takes precedence over
/// the range before it. An omitted count means exactly one line.
///
/// # Errors
///
/// Returns [`HunkError`] if:
/// - No well-formed new-file range is present
/// - The range starts at line 0 while adding lines
/// - `start + count` does not fit in a `u32`
pub fn parse_hunk_header(line: &str) -> Result<HunkHeader, HunkError> {
    let malformed = || HunkError::MalformedHunkHeader {
        line: line.to_string(),
    };

    let rest = line.strip_prefix("@@ ").ok_or_else(malformed)?;
    let (new_start, new_count) = rest
        .rmatch_indices(" +")
        .find_map(|(idx, _)| new_side(&rest[idx + 1..]).ok())
        .map(|(_, side)| side)
        .ok_or_else(malformed)?;
    let new_count = new_count.unwrap_or(1);

    if new_count != 0 {
        if new_start == 0 {
            return Err(HunkError::ZeroStart {
                line: line.to_string(),
            });
        }
        if new_start.checked_add(new_count).is_none() {
            return Err(HunkError::RangeOverflow {
                start: new_start,
                count: new_count,
            });
        }
    }

    trace!(new_start, new_count, "parsed hunk header");
    Ok(HunkHeader {
        new_start,
        new_count,
    })
}

/// `+<start>[,<count>] @@`
fn new_side(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    (
        preceded(char('+'), line_number),
        opt(preceded(char(','), line_number)),
        tag(" @@"),
    )
        .map(|(start, count, _)| (start, count))
        .parse(input)
}

/// Collect the added-line ranges of every hunk in `diff`, in diff order.
///
/// Pure deletions contribute nothing. Ranges are not sorted or merged.
///
/// # Errors
///
/// Returns the first [`HunkError`] hit; no partial result is produced.
pub fn ranges_for_diff(diff: &str) -> Result<Vec<Range>, HunkError> {
    diff.lines()
        .filter(|line| is_hunk_header(line))
        .map(parse_hunk_header)
        .filter_map(|header| header.map(|h| h.added_range()).transpose())
        .collect()
}
