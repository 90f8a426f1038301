//! Interval error types

/// Errors raised when constructing or combining intervals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// The start bound lies after the end bound.
    #[error("Interval start {start} is greater than end {end}")]
    Inverted { start: usize, end: usize },

    /// A bound was negative.
    #[error("Interval bound {value} is negative")]
    Negative { value: i64 },

    /// Two intervals neither overlap nor abut, so they have no single union.
    #[error("Cannot union [{left_start}, {left_end}] with [{right_start}, {right_end}]: they are separated")]
    Separated {
        left_start: usize,
        left_end: usize,
        right_start: usize,
        right_end: usize,
    },

    /// The index is neither inside nor directly adjacent to the interval.
    #[error("Cannot expand [{start}, {end}] to non-adjacent index {index}")]
    NotAdjacent { start: usize, end: usize, index: usize },
}
