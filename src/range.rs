use std::fmt;
use std::num::NonZeroU32;

/// A half-open interval `[start, end)` of 1-indexed line numbers in the
/// post-diff file.
///
/// Ranges are plain values: two ranges with the same bounds are equal.
///
/// # Examples
///
/// ```
/// use git_ranges::Range;
///
/// let range = Range::new(10, 15).unwrap();
/// assert_eq!(range.len(), 5);
/// assert!(range.contains(14));
/// assert!(!range.contains(15));
/// assert_eq!(range.to_string(), "10..15");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    start: NonZeroU32,
    end: u32,
}

impl Range {
    /// Create a range, returning `None` unless `1 <= start <= end`.
    #[must_use]
    pub fn new(start: u32, end: u32) -> Option<Self> {
        let start = NonZeroU32::new(start)?;
        (end >= start.get()).then_some(Self { start, end })
    }

    /// First line in the range
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start.get()
    }

    /// One past the last line in the range
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start.get()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `line` falls inside the range
    #[must_use]
    pub fn contains(&self, line: u32) -> bool {
        (self.start.get()..self.end).contains(&line)
    }

    /// Iterate over every line number in the range
    pub fn lines(&self) -> std::ops::Range<u32> {
        self.start.get()..self.end
    }
}

impl From<Range> for std::ops::Range<u32> {
    fn from(range: Range) -> Self {
        range.lines()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
