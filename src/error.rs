use thiserror::Error;

/// Error returned when an index, range, or shift count lies outside the
/// bounds a sequence operation requires.
///
/// Out-of-range arguments are contract violations, not transient failures:
/// they are reported at the violating call and the sequence is left
/// untouched. Operations whose contract makes them no-ops on an empty
/// sequence (range delete, add, reverse, and cyclic shift) return `Ok`
/// without inspecting their bounds in that case.
///
/// # Examples
///
/// ```
/// use implicit_treap::{ImplicitTreap, OutOfRange};
///
/// let mut seq: ImplicitTreap<i64> = (0..4).collect();
///
/// assert_eq!(seq.insert(9, 0), Err(OutOfRange::Index { index: 9, len: 4 }));
/// assert_eq!(seq.reverse(3, 1), Err(OutOfRange::Range { left: 3, right: 1, len: 4 }));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum OutOfRange {
    /// A single position was outside the valid index range.
    #[error("index {index} out of bounds for sequence of length {len}")]
    Index {
        /// The offending position.
        index: usize,
        /// The sequence length at the time of the call.
        len: usize,
    },

    /// A closed range `[left, right]` was not contained in the sequence.
    #[error("range [{left}, {right}] invalid for sequence of length {len}")]
    Range {
        /// The requested left bound.
        left: usize,
        /// The requested right bound.
        right: usize,
        /// The sequence length at the time of the call.
        len: usize,
    },

    /// A cyclic shift count exceeded the width of its range.
    #[error("shift count {count} exceeds maximum {max} for the given range")]
    Shift {
        /// The requested shift count.
        count: usize,
        /// The largest count the range admits, `right - left`.
        max: usize,
    },
}
