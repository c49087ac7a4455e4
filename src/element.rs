use core::convert::Infallible;

/// The contract a payload type must satisfy to be stored in an
/// [`ImplicitTreap`](crate::ImplicitTreap).
///
/// Every element type names a [`Delta`](Element::Delta) type describing the
/// bulk updates that [`add`](crate::ImplicitTreap::add) may apply to a range.
/// Deltas must compose associatively so that two pending updates can be
/// folded into one while they are still deferred on a subtree root.
///
/// All primitive integers implement `Element` with `Delta = Self` and
/// wrapping addition. Types with no meaningful addition (such as `char`) use
/// [`Infallible`] as their delta: no value of that type can ever be
/// constructed, so `add` is uncallable for them and the remaining operations
/// are unaffected.
///
/// # Examples
///
/// ```
/// use implicit_treap::ImplicitTreap;
///
/// // `i64` is additive, `char` is not; both are valid payloads.
/// let mut numbers: ImplicitTreap<i64> = (1..=3).collect();
/// numbers.add(0, 2, 10)?;
/// assert_eq!(numbers.to_vec(), [11, 12, 13]);
///
/// let mut letters: ImplicitTreap<char> = "abc".chars().collect();
/// letters.reverse(0, 2)?;
/// assert_eq!(letters.to_vec(), ['c', 'b', 'a']);
/// # Ok::<(), implicit_treap::OutOfRange>(())
/// ```
pub trait Element: Clone {
    /// The type of additive deltas applied by range updates.
    type Delta: Clone;

    /// Applies a delta to this element.
    fn apply_delta(&mut self, delta: &Self::Delta);

    /// Folds `next` into an already-pending delta, so that applying the
    /// result equals applying `pending` and then `next`.
    fn merge_delta(pending: &mut Self::Delta, next: &Self::Delta);
}

macro_rules! additive_element {
    ($($int:ty)*) => {$(
        impl Element for $int {
            type Delta = $int;

            #[inline]
            fn apply_delta(&mut self, delta: &$int) {
                *self = self.wrapping_add(*delta);
            }

            #[inline]
            fn merge_delta(pending: &mut $int, next: &$int) {
                *pending = pending.wrapping_add(*next);
            }
        }
    )*};
}

additive_element! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize }

macro_rules! inert_element {
    ($($plain:ty),*) => {$(
        impl Element for $plain {
            type Delta = Infallible;

            #[inline]
            fn apply_delta(&mut self, delta: &Infallible) {
                match *delta {}
            }

            #[inline]
            fn merge_delta(pending: &mut Infallible, _next: &Infallible) {
                match *pending {}
            }
        }
    )*};
}

inert_element! { char, bool, () }
