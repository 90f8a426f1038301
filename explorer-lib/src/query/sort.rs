//! Sort specification for views.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::model::FileRecord;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the wire name of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Orders a view by one column.
///
/// # Example
///
/// ```
/// use explorer_lib::query::{Direction, FileSort};
///
/// let sort = FileSort::desc("uploaded");
/// assert_eq!(sort.direction(), Direction::Desc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSort {
    column: String,
    direction: Direction,
}

impl FileSort {
    /// Creates a sort on `column` in the given direction.
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Creates an ascending sort on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    /// Creates a descending sort on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    /// Returns the sorted column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Compares two records by this sort.
    ///
    /// Records missing the column sort after those that have it, whatever the
    /// direction. Sizes compare numerically, everything else as text.
    pub fn compare(&self, a: &FileRecord, b: &FileRecord) -> Ordering {
        let ordering = match self.column.as_str() {
            "file_size" => match (a.file_size, b.file_size) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => None,
            },
            "uploaded" => match (a.uploaded, b.uploaded) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => None,
            },
            column => {
                let x = a.values_of(column);
                let y = b.values_of(column);
                match (x.first(), y.first()) {
                    (Some(x), Some(y)) => Some(x.cmp(y)),
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => None,
                }
            }
        };

        match (ordering, self.direction) {
            (Some(ordering), Direction::Asc) => ordering,
            (Some(ordering), Direction::Desc) => ordering.reverse(),
            (None, _) => Ordering::Equal,
        }
    }
}
