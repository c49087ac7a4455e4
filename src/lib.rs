//! A positionally-indexed sequence backed by an implicit treap.
//!
//! This crate provides [`ImplicitTreap`], a sequence container that is indexed
//! by *position* rather than by key. Internally it is a treap whose binary
//! search order is the in-order rank of each node, which gives expected
//! O(log n) time for every positional operation regardless of where in the
//! sequence it lands:
//!
//! - [`insert`](ImplicitTreap::insert) / [`delete`](ImplicitTreap::delete) -
//!   insert one element, or remove a closed range of elements
//! - [`add`](ImplicitTreap::add) - add a delta to every element in a range
//! - [`reverse`](ImplicitTreap::reverse) - reverse a range in place
//! - [`cyclic_shift`](ImplicitTreap::cyclic_shift) - rotate a range left
//! - [`get`](ImplicitTreap::get) - obtain a bidirectional [`Cursor`] at a
//!   position
//!
//! # Example
//!
//! ```
//! use implicit_treap::ImplicitTreap;
//!
//! let mut seq: ImplicitTreap<i64> = (0..6).collect(); // [0, 1, 2, 3, 4, 5]
//!
//! seq.reverse(1, 4)?;           // [0, 4, 3, 2, 1, 5]
//! seq.add(2, 4, 100)?;          // [0, 4, 103, 102, 101, 5]
//! seq.cyclic_shift(0, 5, 2)?;   // [103, 102, 101, 5, 0, 4]
//! seq.delete(0, 1)?;            // [101, 5, 0, 4]
//!
//! assert_eq!(seq.to_vec(), [101, 5, 0, 4]);
//! # Ok::<(), implicit_treap::OutOfRange>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library
//!   dependency
//! - **O(log n) positional updates** - Range add, range reverse, and range
//!   rotation via two independently-composable lazy tags
//! - **Bidirectional cursors** - In-order traversal over parent pointers,
//!   without an auxiliary stack
//! - **Slot recycling** - Nodes live in a flat arena with a free list, so
//!   deletions never return memory to the allocator just to ask for it back
//!
//! # Implementation
//!
//! A treap stores an independently drawn random priority in every node and
//! keeps the tree heap-ordered on those priorities. Because priorities are
//! random, the tree height is O(log n) in expectation no matter what order
//! elements arrive in. Instead of a stored key, each node tracks the size of
//! its subtree; descending left or right while comparing a target position
//! against the left subtree's size resolves any index in logarithmic time,
//! and every mutation reduces to the two fundamental operations `split` and
//! `merge`.
//!
//! Range updates are deferred: `add` and `reverse` tag the root of the split
//! out range, and a tag is pushed one level down only when a later operation
//! visits that subtree. The two tags compose independently, so a reversed
//! range can be shifted, re-reversed, and bulk-updated without ever
//! materializing an intermediate state.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod element;
mod error;
mod raw;

pub mod treap;

pub use element::Element;
pub use error::OutOfRange;
pub use treap::{Cursor, ImplicitTreap, Iter};
