//! Closed integer intervals.
//!
//! An [`Interval`] is the unit of selection and of page bookkeeping. Interval
//! lists stored by a [`Selection`](crate::selection::Selection) always pass
//! through [`Interval::compact`], which keeps them sorted, disjoint and
//! non-abutting.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use crate::error::IntervalError;

/// An immutable closed range of row indices, inclusive on both ends.
///
/// # Example
///
/// ```
/// use explorer_lib::interval::Interval;
///
/// let range = Interval::new(3, 10).unwrap();
/// assert!(range.contains(3));
/// assert!(range.contains(10));
/// assert_eq!(range.count(), 8);
///
/// // Inverted bounds are rejected
/// assert!(Interval::new(10, 3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: usize,
    end: usize,
}

/// Wire form of an interval before validation.
#[derive(Deserialize)]
struct RawInterval {
    start: i64,
    end: i64,
}

impl TryFrom<RawInterval> for Interval {
    type Error = IntervalError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::try_from((raw.start, raw.end))
    }
}

impl TryFrom<(i64, i64)> for Interval {
    type Error = IntervalError;

    fn try_from((start, end): (i64, i64)) -> Result<Self, Self::Error> {
        let start = usize::try_from(start).map_err(|_| IntervalError::Negative { value: start })?;
        let end = usize::try_from(end).map_err(|_| IntervalError::Negative { value: end })?;
        Interval::new(start, end)
    }
}

impl Interval {
    /// Creates an interval covering `start..=end`.
    ///
    /// Fails if `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self, IntervalError> {
        if start > end {
            return Err(IntervalError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates an interval covering the single index `index`.
    pub fn point(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Creates the minimal interval covering both `a` and `b`, in either order.
    pub fn spanning(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Returns the first index.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the last index.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of indices covered, saturating at `usize::MAX`.
    pub fn count(&self) -> usize {
        (self.end - self.start).saturating_add(1)
    }

    /// Returns `true` if `index` lies within the interval.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Returns `true` if the two intervals share at least one index.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns `true` if the intervals are disjoint with no gap between them.
    pub fn abuts(&self, other: &Interval) -> bool {
        self.end.checked_add(1) == Some(other.start) || other.end.checked_add(1) == Some(self.start)
    }

    /// Returns the minimal interval covering both intervals.
    ///
    /// Only defined when the intervals overlap or abut.
    pub fn union(&self, other: &Interval) -> Result<Interval, IntervalError> {
        if !self.overlaps(other) && !self.abuts(other) {
            return Err(IntervalError::Separated {
                left_start: self.start,
                left_end: self.end,
                right_start: other.start,
                right_end: other.end,
            });
        }
        Ok(Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Returns the minimal interval covering this interval and `index`.
    ///
    /// `index` must be inside the interval or directly next to one of its ends.
    pub fn expand_to(&self, index: usize) -> Result<Interval, IntervalError> {
        self.union(&Interval::point(index))
            .map_err(|_| IntervalError::NotAdjacent {
                start: self.start,
                end: self.end,
                index,
            })
    }

    /// Removes `index`, returning whatever is left.
    ///
    /// Yields nothing for a single point equal to `index`, one interval when
    /// `index` is an endpoint and two when it is strictly interior. An index
    /// outside the interval leaves it untouched.
    pub fn partition_at(&self, index: usize) -> Vec<Interval> {
        if !self.contains(index) {
            return vec![*self];
        }

        let mut parts = Vec::with_capacity(2);
        if index > self.start {
            parts.push(Interval {
                start: self.start,
                end: index - 1,
            });
        }
        if index < self.end {
            parts.push(Interval {
                start: index + 1,
                end: self.end,
            });
        }
        parts
    }

    /// Returns the part of this interval that also lies within `other`.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interval {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Returns what remains of this interval after removing every index in `other`.
    pub fn difference(&self, other: &Interval) -> Vec<Interval> {
        let Some(cut) = self.intersection(other) else {
            return vec![*self];
        };

        let mut parts = Vec::with_capacity(2);
        if cut.start > self.start {
            parts.push(Interval {
                start: self.start,
                end: cut.start - 1,
            });
        }
        if cut.end < self.end {
            parts.push(Interval {
                start: cut.end + 1,
                end: self.end,
            });
        }
        parts
    }

    /// Iterates over every covered index in ascending order.
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Sorts and merges intervals into the minimal disjoint, non-abutting set.
    ///
    /// Compacting an already compact list returns it unchanged.
    pub fn compact(intervals: impl IntoIterator<Item = Interval>) -> Vec<Interval> {
        let mut sorted: Vec<Interval> = intervals.into_iter().collect();
        sorted.sort_unstable();

        let mut compacted: Vec<Interval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            match compacted.last_mut().map(|last| (last.union(&interval), last)) {
                Some((Ok(merged), last)) => *last = merged,
                _ => compacted.push(interval),
            }
        }
        compacted
    }
}

impl IntoIterator for Interval {
    type Item = usize;
    type IntoIter = RangeInclusive<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
