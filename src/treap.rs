use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::element::Element;
use crate::error::OutOfRange;
use crate::raw::{Handle, RawTreap};

/// A sequence indexed by position, backed by an implicit treap.
///
/// `ImplicitTreap` stores elements in a logical order maintained purely by
/// position: there is no key and no comparison between elements. Inserting,
/// deleting, bulk-updating, reversing, or rotating any range takes expected
/// O(log n) time, because every operation reduces to splitting the tree at a
/// position and merging the pieces back together.
///
/// Positions are zero-based. Range operations take *closed* ranges
/// `[left, right]`, matching the underlying split arithmetic.
///
/// Out-of-range arguments return [`OutOfRange`] and leave the sequence
/// untouched; the range operations `delete`, `add`, `reverse`, and
/// `cyclic_shift` are defined as no-ops on an empty sequence.
///
/// # Examples
///
/// ```
/// use implicit_treap::ImplicitTreap;
///
/// let mut text: ImplicitTreap<char> = "hello world".chars().collect();
///
/// text.reverse(0, 4)?;          // "olleh world"
/// text.delete(5, 5)?;           // "ollehworld"
/// text.cyclic_shift(0, 9, 5)?;  // "worldolleh"
///
/// let rendered: String = text.iter().collect();
/// assert_eq!(rendered, "worldolleh");
/// # Ok::<(), implicit_treap::OutOfRange>(())
/// ```
///
/// # Randomness
///
/// The treap's balance comes from a random priority drawn for every inserted
/// node. Each tree owns its own generator: [`new`](ImplicitTreap::new) seeds
/// it from the operating system, while [`with_seed`](ImplicitTreap::with_seed)
/// produces a tree whose internal shape is reproducible run to run. The
/// visible sequence never depends on the seed, only the tree's shape does.
pub struct ImplicitTreap<T: Element> {
    raw: RawTreap<T>,
}

impl<T: Element> ImplicitTreap<T> {
    /// Creates a new, empty sequence with an OS-seeded priority generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let seq: ImplicitTreap<i64> = ImplicitTreap::new();
    /// assert!(seq.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self { raw: RawTreap::new() }
    }

    /// Creates a new, empty sequence whose priority generator is seeded with
    /// `seed`, making the tree's internal shape reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            raw: RawTreap::with_seed(seed),
        }
    }

    /// Creates a new, empty sequence with node storage preallocated for at
    /// least `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: RawTreap::with_capacity(capacity),
        }
    }

    /// Returns the number of elements in the sequence.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the sequence contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of elements the node arena can hold without
    /// reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Inserts `value` at `position`, shifting every element at or after it
    /// one place to the right. `position` may equal [`len`](Self::len), which
    /// appends.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Index`] if `position > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq = ImplicitTreap::new();
    /// seq.insert(0, 'g')?;
    /// seq.insert(1, 'v')?;
    /// seq.insert(1, 'q')?;
    /// assert_eq!(seq.to_vec(), ['g', 'q', 'v']);
    /// # Ok::<(), implicit_treap::OutOfRange>(())
    /// ```
    pub fn insert(&mut self, position: usize, value: T) -> Result<(), OutOfRange> {
        let len = self.len();
        if position > len {
            return Err(OutOfRange::Index { index: position, len });
        }
        self.raw.insert(position, value);
        Ok(())
    }

    /// Appends `value` to the end of the sequence.
    pub fn push_back(&mut self, value: T) {
        let len = self.len();
        self.raw.insert(len, value);
    }

    /// Removes the closed range `[left, right]`. The removed nodes' arena
    /// slots are recycled for future insertions.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Range`] unless `left <= right < len`. A no-op
    /// `Ok` on an empty sequence.
    pub fn delete(&mut self, left: usize, right: usize) -> Result<(), OutOfRange> {
        if self.is_empty() {
            return Ok(());
        }
        self.check_range(left, right)?;
        self.raw.delete(left, right);
        Ok(())
    }

    /// Adds `delta` to every element in the closed range `[left, right]`.
    ///
    /// The update is deferred: it is recorded at the root of the range's
    /// subtree in O(log n) and pushed down lazily as later operations visit
    /// the affected nodes. Element count and order are unchanged.
    ///
    /// This operation is only available for payload types whose
    /// [`Element::Delta`] is constructible; for types such as `char` it is
    /// excluded at the type level.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Range`] unless `left <= right < len`. A no-op
    /// `Ok` on an empty sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq: ImplicitTreap<i64> = (0..5).collect();
    /// seq.add(1, 3, 10)?;
    /// assert_eq!(seq.to_vec(), [0, 11, 12, 13, 4]);
    /// # Ok::<(), implicit_treap::OutOfRange>(())
    /// ```
    pub fn add(&mut self, left: usize, right: usize, delta: T::Delta) -> Result<(), OutOfRange> {
        if self.is_empty() {
            return Ok(());
        }
        self.check_range(left, right)?;
        self.raw.add(left, right, &delta);
        Ok(())
    }

    /// Reverses the closed range `[left, right]` in place, lazily.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Range`] unless `left <= right < len`. A no-op
    /// `Ok` on an empty sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq: ImplicitTreap<char> = "abcdef".chars().collect();
    /// seq.reverse(1, 4)?;
    /// assert_eq!(seq.to_vec(), ['a', 'e', 'd', 'c', 'b', 'f']);
    /// # Ok::<(), implicit_treap::OutOfRange>(())
    /// ```
    pub fn reverse(&mut self, left: usize, right: usize) -> Result<(), OutOfRange> {
        if self.is_empty() {
            return Ok(());
        }
        self.check_range(left, right)?;
        self.raw.reverse(left, right);
        Ok(())
    }

    /// Rotates the closed range `[left, right]` left by `count` positions:
    /// the sub-range `[left + count, right]` moves in front of
    /// `[left, left + count)`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Range`] unless `left <= right < len`, and
    /// [`OutOfRange::Shift`] if `count > right - left`. A no-op `Ok` on an
    /// empty sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq: ImplicitTreap<char> = "abcdef".chars().collect();
    /// seq.cyclic_shift(1, 4, 2)?; // rotate "bcde" left by 2
    /// assert_eq!(seq.to_vec(), ['a', 'd', 'e', 'b', 'c', 'f']);
    /// # Ok::<(), implicit_treap::OutOfRange>(())
    /// ```
    pub fn cyclic_shift(&mut self, left: usize, right: usize, count: usize) -> Result<(), OutOfRange> {
        if self.is_empty() {
            return Ok(());
        }
        self.check_range(left, right)?;
        if count > right - left {
            return Err(OutOfRange::Shift {
                count,
                max: right - left,
            });
        }
        self.raw.cyclic_shift(left, right, count);
        Ok(())
    }

    /// Returns a [`Cursor`] positioned at the element currently at
    /// `position`.
    ///
    /// Resolving the position costs O(log n): the node is isolated with two
    /// splits and the tree is merged back together, leaving the visible
    /// sequence unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange::Index`] if `position >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq: ImplicitTreap<i64> = (10..15).collect();
    /// let mut cursor = seq.get(2)?;
    /// assert_eq!(cursor.current(), Some(&12));
    /// cursor.move_next();
    /// assert_eq!(cursor.current(), Some(&13));
    /// # Ok::<(), implicit_treap::OutOfRange>(())
    /// ```
    pub fn get(&mut self, position: usize) -> Result<Cursor<'_, T>, OutOfRange> {
        let len = self.len();
        if position >= len {
            return Err(OutOfRange::Index { index: position, len });
        }
        let node = self.raw.handle_at(position);
        Ok(Cursor {
            raw: &mut self.raw,
            node,
        })
    }

    /// Returns a [`Cursor`] at the first element, or at the end position if
    /// the sequence is empty.
    pub fn cursor_front(&mut self) -> Cursor<'_, T> {
        let node = self.raw.first();
        Cursor {
            raw: &mut self.raw,
            node,
        }
    }

    /// Returns a [`Cursor`] at the last element, or at the end position if
    /// the sequence is empty.
    pub fn cursor_back(&mut self) -> Cursor<'_, T> {
        let node = self.raw.last();
        Cursor {
            raw: &mut self.raw,
            node,
        }
    }

    /// Returns an iterator over the sequence in logical order.
    ///
    /// The iterator yields clones: advancing settles pending lazy updates
    /// through the same mutable borrow, so handing out long-lived references
    /// is not possible.
    pub fn iter(&mut self) -> Iter<'_, T> {
        let remaining = self.len();
        Iter {
            cursor: self.cursor_front(),
            remaining,
        }
    }

    /// Materializes the whole sequence into a `Vec` in logical order.
    ///
    /// # Examples
    ///
    /// ```
    /// use implicit_treap::ImplicitTreap;
    ///
    /// let mut seq: ImplicitTreap<i64> = (0..3).collect();
    /// assert_eq!(seq.to_vec(), [0, 1, 2]);
    /// ```
    pub fn to_vec(&mut self) -> Vec<T> {
        self.iter().collect()
    }

    fn check_range(&self, left: usize, right: usize) -> Result<(), OutOfRange> {
        let len = self.len();
        if left <= right && right < len {
            Ok(())
        } else {
            Err(OutOfRange::Range { left, right, len })
        }
    }
}

impl<T: Element> Default for ImplicitTreap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> FromIterator<T> for ImplicitTreap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut treap = Self::new();
        treap.extend(iter);
        treap
    }
}

impl<T: Element> Extend<T> for ImplicitTreap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

/// A bidirectional cursor over an [`ImplicitTreap`].
///
/// A cursor sits either on an element or on the *end position* past the last
/// element, where [`current`](Cursor::current) returns `None`. Stepping walks
/// in-order through the tree using parent back-references, with no auxiliary
/// stack; each step costs amortized O(1) and applies any lazy updates still
/// pending on the nodes it descends into.
///
/// A cursor borrows the tree mutably, so the structural mutations that would
/// invalidate it cannot be performed while it exists.
///
/// # Examples
///
/// ```
/// use implicit_treap::ImplicitTreap;
///
/// let mut seq: ImplicitTreap<char> = "abc".chars().collect();
///
/// let mut cursor = seq.cursor_front();
/// assert_eq!(cursor.current(), Some(&'a'));
/// cursor.move_next();
/// cursor.move_next();
/// assert_eq!(cursor.current(), Some(&'c'));
/// cursor.move_next();
/// assert_eq!(cursor.current(), None); // end position
/// cursor.move_prev();
/// assert_eq!(cursor.current(), Some(&'c'));
/// ```
pub struct Cursor<'a, T: Element> {
    raw: &'a mut RawTreap<T>,
    node: Option<Handle>,
}

impl<T: Element> Cursor<'_, T> {
    /// Returns the element under the cursor, or `None` at the end position.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.node.map(|handle| self.raw.value(handle))
    }

    /// Moves to the next element in logical order. At the last element the
    /// cursor moves to the end position; at the end position it stays put.
    pub fn move_next(&mut self) {
        if let Some(handle) = self.node {
            self.node = self.raw.successor(handle);
        }
    }

    /// Moves to the previous element in logical order. At the end position
    /// the cursor moves to the last element; at the first element it moves
    /// to the end position.
    pub fn move_prev(&mut self) {
        self.node = match self.node {
            Some(handle) => self.raw.predecessor(handle),
            None => self.raw.last(),
        };
    }
}

/// An iterator over the elements of an [`ImplicitTreap`] in logical order.
///
/// Created by [`iter`](ImplicitTreap::iter). Yields cloned elements; see
/// `iter` for why.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: Element> {
    cursor: Cursor<'a, T>,
    remaining: usize,
}

impl<T: Element> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = self.cursor.current()?.clone();
        self.cursor.move_next();
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Element> ExactSizeIterator for Iter<'_, T> {}

impl<T: Element> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn empty_sequence_range_ops_are_noops() {
        let mut seq: ImplicitTreap<i64> = ImplicitTreap::with_seed(1);
        assert_eq!(seq.delete(3, 9), Ok(()));
        assert_eq!(seq.add(0, 5, 1), Ok(()));
        assert_eq!(seq.reverse(2, 1), Ok(()));
        assert_eq!(seq.cyclic_shift(0, 4, 2), Ok(()));
        assert!(seq.is_empty());
    }

    #[test]
    fn out_of_range_reports_and_preserves() {
        let mut seq: ImplicitTreap<i64> = (0..4).collect();

        assert_eq!(seq.insert(5, 9), Err(OutOfRange::Index { index: 5, len: 4 }));
        assert_eq!(seq.delete(2, 4), Err(OutOfRange::Range { left: 2, right: 4, len: 4 }));
        assert_eq!(seq.reverse(3, 1), Err(OutOfRange::Range { left: 3, right: 1, len: 4 }));
        assert_eq!(seq.cyclic_shift(1, 3, 3), Err(OutOfRange::Shift { count: 3, max: 2 }));
        assert!(seq.get(4).is_err());

        assert_eq!(seq.to_vec(), [0, 1, 2, 3]);
    }

    #[test]
    fn cursor_front_on_empty_is_end() {
        let mut seq: ImplicitTreap<i64> = ImplicitTreap::with_seed(2);
        let mut cursor = seq.cursor_front();
        assert_eq!(cursor.current(), None);
        cursor.move_next();
        assert_eq!(cursor.current(), None);
        cursor.move_prev();
        assert_eq!(cursor.current(), None);
    }

    #[test]
    fn iterator_is_exact_and_fused() {
        let mut seq: ImplicitTreap<i64> = (0..5).collect();
        let mut iter = seq.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.len(), 4);
        let rest: Vec<i64> = iter.by_ref().collect();
        assert_eq!(rest, [1, 2, 3, 4]);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn seeded_trees_replay_identically() {
        let build = || {
            let mut seq: ImplicitTreap<i64> = ImplicitTreap::with_seed(42);
            for value in 0..50 {
                seq.insert((value as usize * 7) % (seq.len() + 1), value).unwrap();
            }
            seq
        };
        let mut a = build();
        let mut b = build();
        assert_eq!(a.to_vec(), b.to_vec());
    }
}
