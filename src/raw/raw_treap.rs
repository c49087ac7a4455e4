use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::element::Element;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// The core implicit treap backing `ImplicitTreap`.
///
/// Every mutation enters through `root`, reduces to `split` and `merge`, and
/// leaves the tree with exact subtree sizes and parent back-references. Lazy
/// tags are settled at the top of every recursive descent, so a node's
/// `value`, `left`, and `right` are only ever read after both pushes ran.
///
/// Bounds are the caller's contract: the public wrapper validates them, and
/// the raw operations only `debug_assert` them.
pub(crate) struct RawTreap<T: Element> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the sequence is non-empty.
    root: Option<Handle>,
    /// Generator for node priorities, owned by this tree so independent
    /// trees share no hidden state and seeded trees replay exactly.
    rng: SmallRng,
}

impl<T: Element> RawTreap<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            rng: SmallRng::from_os_rng(),
        }
    }

    pub(crate) fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Returns the number of elements in the sequence.
    ///
    /// Every live arena slot is exactly one sequence element, so the arena's
    /// live count is the sequence length.
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Returns the element stored at `handle`.
    ///
    /// The handle must refer to a settled node, which holds for any handle
    /// produced by `handle_at`, `first`, `last`, `successor`, or
    /// `predecessor` that no structural mutation has since invalidated.
    pub(crate) fn value(&self, handle: Handle) -> &T {
        &self.nodes.get(handle).value
    }

    // ─── Lazy propagation ────────────────────────────────────────────────

    /// Applies both pending tags at `handle`: the additive delta first, then
    /// the reversal. Must run before another operation reads this node's
    /// `value`, `left`, or `right`.
    fn settle(&mut self, handle: Handle) {
        if let Some(delta) = self.nodes.get_mut(handle).pending_add.take() {
            let node = self.nodes.get_mut(handle);
            node.value.apply_delta(&delta);
            let (left, right) = (node.left, node.right);
            if let Some(left) = left {
                self.nodes.get_mut(left).defer_add(&delta);
            }
            if let Some(right) = right {
                self.nodes.get_mut(right).defer_add(&delta);
            }
        }

        let node = self.nodes.get_mut(handle);
        if node.pending_reverse {
            node.pending_reverse = false;
            core::mem::swap(&mut node.left, &mut node.right);
            let (left, right) = (node.left, node.right);
            if let Some(left) = left {
                self.nodes.get_mut(left).defer_reverse();
            }
            if let Some(right) = right {
                self.nodes.get_mut(right).defer_reverse();
            }
        }
    }

    // ─── Split/merge engine ──────────────────────────────────────────────

    /// Attaches `child` as `parent`'s left subtree, keeping the back-reference
    /// exact.
    fn set_left(&mut self, parent: Handle, child: Option<Handle>) {
        self.nodes.get_mut(parent).left = child;
        if let Some(child) = child {
            self.nodes.get_mut(child).parent = Some(parent);
        }
    }

    fn set_right(&mut self, parent: Handle, child: Option<Handle>) {
        self.nodes.get_mut(parent).right = child;
        if let Some(child) = child {
            self.nodes.get_mut(child).parent = Some(parent);
        }
    }

    /// Detaches `handle` from its parent, clearing both the stale child link
    /// and the back-reference. A detached subtree whose old parent still
    /// points at it would alias two tree positions, so this runs before any
    /// detached piece is handed upward out of `split`.
    fn unlink_from_parent(&mut self, handle: Handle) {
        let Some(parent) = self.nodes.get(handle).parent else {
            return;
        };
        let parent_node = self.nodes.get_mut(parent);
        if parent_node.left == Some(handle) {
            parent_node.left = None;
        } else if parent_node.right == Some(handle) {
            parent_node.right = None;
        }
        self.nodes.get_mut(handle).parent = None;
    }

    fn subtree_size(&self, root: Option<Handle>) -> usize {
        root.map_or(0, |handle| self.nodes.get(handle).size)
    }

    /// Recomputes `size` at `handle` from its (current) children.
    fn refresh_size(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let size = 1 + self.subtree_size(node.left) + self.subtree_size(node.right);
        self.nodes.get_mut(handle).size = size;
    }

    /// Partitions the subtree at `root` into the first `count` in-order
    /// positions and the remainder.
    fn split(&mut self, root: Option<Handle>, count: usize) -> (Option<Handle>, Option<Handle>) {
        let Some(handle) = root else {
            return (None, None);
        };
        self.settle(handle);

        let left_child = self.nodes.get(handle).left;
        let left_size = self.subtree_size(left_child);

        if count <= left_size {
            let (detached, kept) = self.split(left_child, count);
            if let Some(piece) = detached {
                self.unlink_from_parent(piece);
            }
            self.set_left(handle, kept);
            self.refresh_size(handle);
            (detached, Some(handle))
        } else {
            let right_child = self.nodes.get(handle).right;
            let (kept, detached) = self.split(right_child, count - left_size - 1);
            if let Some(piece) = detached {
                self.unlink_from_parent(piece);
            }
            self.set_right(handle, kept);
            self.refresh_size(handle);
            (Some(handle), detached)
        }
    }

    /// Concatenates two subtrees; every position in `left` precedes every
    /// position in `right`. The root with the higher priority wins, `left`
    /// winning ties, which keeps the heap shape that bounds expected height.
    fn merge(&mut self, left: Option<Handle>, right: Option<Handle>) -> Option<Handle> {
        if let Some(handle) = left {
            self.settle(handle);
        }
        if let Some(handle) = right {
            self.settle(handle);
        }
        let (l, r) = match (left, right) {
            (Some(l), Some(r)) => (l, r),
            _ => return left.or(right),
        };

        let root = if self.nodes.get(l).priority >= self.nodes.get(r).priority {
            let tail = self.nodes.get(l).right;
            let merged = self.merge(tail, Some(r));
            self.set_right(l, merged);
            l
        } else {
            let head = self.nodes.get(r).left;
            let merged = self.merge(Some(l), head);
            self.set_left(r, merged);
            r
        };
        self.refresh_size(root);
        Some(root)
    }

    // ─── Positional operations ───────────────────────────────────────────

    /// Inserts `value` at `position`, shifting everything at or after it one
    /// place right. `position` may equal the current length.
    pub(crate) fn insert(&mut self, position: usize, value: T) {
        debug_assert!(position <= self.len());

        let (head, tail) = self.split(self.root, position);
        let priority = self.rng.random();
        let fresh = self.nodes.alloc(Node::new(priority, value));
        let head = self.merge(head, Some(fresh));
        self.root = self.merge(head, tail);
    }

    /// Removes the closed range `[left, right]`, recycling every node in it.
    pub(crate) fn delete(&mut self, left: usize, right: usize) {
        debug_assert!(left <= right && right < self.len());

        let (head, tail) = self.split(self.root, right + 1);
        let (head, cut) = self.split(head, left);
        self.root = self.merge(head, tail);
        self.recycle(cut);
    }

    /// Adds `delta` to every element in the closed range `[left, right]`.
    pub(crate) fn add(&mut self, left: usize, right: usize, delta: &T::Delta) {
        debug_assert!(left <= right && right < self.len());

        let (head, tail) = self.split(self.root, right + 1);
        let (head, middle) = self.split(head, left);
        if let Some(handle) = middle {
            self.nodes.get_mut(handle).defer_add(delta);
        }
        let head = self.merge(head, middle);
        self.root = self.merge(head, tail);
    }

    /// Reverses the closed range `[left, right]` in place.
    pub(crate) fn reverse(&mut self, left: usize, right: usize) {
        debug_assert!(left <= right && right < self.len());

        let (head, tail) = self.split(self.root, right + 1);
        let (head, middle) = self.split(head, left);
        if let Some(handle) = middle {
            self.nodes.get_mut(handle).defer_reverse();
        }
        let head = self.merge(head, middle);
        self.root = self.merge(head, tail);
    }

    /// Rotates the closed range `[left, right]` left by `count` positions:
    /// `[left + count, right]` moves in front of `[left, left + count)`.
    pub(crate) fn cyclic_shift(&mut self, left: usize, right: usize, count: usize) {
        debug_assert!(left <= right && right < self.len() && count <= right - left);
        if count == 0 {
            return;
        }

        let (head, tail) = self.split(self.root, right + 1);
        let (head, back) = self.split(head, left + count);
        let (head, front) = self.split(head, left);
        let middle = self.merge(back, front);
        let head = self.merge(head, middle);
        self.root = self.merge(head, tail);
    }

    /// Resolves `position` to a concrete node handle by isolating it with
    /// two splits and merging the tree back together. Structurally a no-op
    /// on the sequence.
    pub(crate) fn handle_at(&mut self, position: usize) -> Option<Handle> {
        debug_assert!(position < self.len());

        let (head, tail) = self.split(self.root, position + 1);
        let (head, isolated) = self.split(head, position);
        let head = self.merge(head, isolated);
        self.root = self.merge(head, tail);
        isolated
    }

    /// Recursively returns a detached subtree's slots to the free list.
    fn recycle(&mut self, root: Option<Handle>) {
        let Some(handle) = root else {
            return;
        };
        let node = self.nodes.free(handle);
        self.recycle(node.left);
        self.recycle(node.right);
    }

    // ─── Cursor steps ────────────────────────────────────────────────────

    /// Descends to the leftmost node of the subtree at `handle`, settling
    /// every node on the way down.
    fn leftmost(&mut self, mut handle: Handle) -> Handle {
        self.settle(handle);
        while let Some(left) = self.nodes.get(handle).left {
            handle = left;
            self.settle(handle);
        }
        handle
    }

    fn rightmost(&mut self, mut handle: Handle) -> Handle {
        self.settle(handle);
        while let Some(right) = self.nodes.get(handle).right {
            handle = right;
            self.settle(handle);
        }
        handle
    }

    /// First node in sequence order, if any.
    pub(crate) fn first(&mut self) -> Option<Handle> {
        self.root.map(|root| self.leftmost(root))
    }

    /// Last node in sequence order, if any.
    pub(crate) fn last(&mut self) -> Option<Handle> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor of `handle`: the leftmost node of the right
    /// subtree if one exists, otherwise the first ancestor reached via a
    /// left-child edge. `None` once the sequence is exhausted.
    pub(crate) fn successor(&mut self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.nodes.get(handle).right {
            return Some(self.leftmost(right));
        }

        let mut current = handle;
        let mut above = self.nodes.get(current).parent;
        while let Some(parent) = above {
            if self.nodes.get(parent).right != Some(current) {
                break;
            }
            current = parent;
            above = self.nodes.get(parent).parent;
        }
        above
    }

    /// In-order predecessor of `handle`; the mirror image of `successor`.
    pub(crate) fn predecessor(&mut self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.nodes.get(handle).left {
            return Some(self.rightmost(left));
        }

        let mut current = handle;
        let mut above = self.nodes.get(current).parent;
        while let Some(parent) = above {
            if self.nodes.get(parent).left != Some(current) {
                break;
            }
            current = parent;
            above = self.nodes.get(parent).parent;
        }
        above
    }

    // ─── Test support ────────────────────────────────────────────────────

    /// Walks the whole tree checking the structural invariants: exact
    /// subtree sizes, exact parent back-references, and agreement between
    /// the tree's node count and the arena's live-slot count. Pending lazy
    /// tags do not disturb either invariant, so no settling is needed.
    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        match self.root {
            None => assert!(self.nodes.is_empty(), "empty tree but live arena slots remain"),
            Some(root) => {
                assert!(self.nodes.get(root).parent.is_none(), "root must not have a parent");
                let counted = self.check_subtree(root);
                assert_eq!(counted, self.nodes.len(), "tree node count != arena live count");
            }
        }
    }

    #[cfg(test)]
    fn check_subtree(&self, handle: Handle) -> usize {
        let node = self.nodes.get(handle);
        let mut counted = 1;
        for child in [node.left, node.right] {
            if let Some(child) = child {
                assert_eq!(self.nodes.get(child).parent, Some(handle), "child's parent link is stale");
                counted += self.check_subtree(child);
            }
        }
        assert_eq!(node.size, counted, "subtree_size out of date");
        counted
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::*;

    /// Materializes the sequence by walking successor links from the first
    /// node, validating invariants before and after.
    fn collect<T: Element>(tree: &mut RawTreap<T>) -> Vec<T> {
        tree.validate_invariants();
        let mut out = Vec::with_capacity(tree.len());
        let mut cursor = tree.first();
        while let Some(handle) = cursor {
            out.push(tree.value(handle).clone());
            cursor = tree.successor(handle);
        }
        tree.validate_invariants();
        assert_eq!(out.len(), tree.len());
        out
    }

    fn collect_backward<T: Element>(tree: &mut RawTreap<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(tree.len());
        let mut cursor = tree.last();
        while let Some(handle) = cursor {
            out.push(tree.value(handle).clone());
            cursor = tree.predecessor(handle);
        }
        out
    }

    fn from_slice(seed: u64, values: &[i32]) -> RawTreap<i32> {
        let mut tree = RawTreap::with_seed(seed);
        for (position, &value) in values.iter().enumerate() {
            tree.insert(position, value);
        }
        tree
    }

    #[test]
    fn insert_at_positions() {
        let mut tree: RawTreap<i32> = RawTreap::with_seed(1);
        tree.insert(0, 10);
        tree.insert(1, 30);
        tree.insert(1, 20);
        assert_eq!(collect(&mut tree), [10, 20, 30]);
    }

    #[test]
    fn delete_recycles_and_insert_reuses() {
        let mut tree = from_slice(2, &[0, 1, 2, 3, 4, 5]);
        let slots_before = tree.capacity();

        tree.delete(1, 3);
        assert_eq!(collect(&mut tree), [0, 4, 5]);

        // Reinserting should reuse recycled slots, not grow the arena.
        tree.insert(1, 7);
        tree.insert(2, 8);
        tree.insert(3, 9);
        assert_eq!(collect(&mut tree), [0, 7, 8, 9, 4, 5]);
        assert!(tree.capacity() <= slots_before.max(6));
    }

    #[test]
    fn add_is_deferred_but_observable() {
        let mut tree = from_slice(3, &[1, 2, 3, 4]);
        tree.add(1, 2, &10);
        assert_eq!(collect(&mut tree), [1, 12, 13, 4]);

        // Deltas on overlapping ranges compose.
        tree.add(0, 3, &-1);
        tree.add(2, 3, &100);
        assert_eq!(collect(&mut tree), [0, 11, 112, 103]);
    }

    #[test]
    fn reverse_swaps_lazily() {
        let mut tree = from_slice(4, &[1, 2, 3, 4, 5, 6]);
        tree.reverse(1, 4);
        assert_eq!(collect(&mut tree), [1, 5, 4, 3, 2, 6]);

        // Nested reversal composes through the pending flags.
        tree.reverse(0, 5);
        tree.reverse(2, 3);
        assert_eq!(collect(&mut tree), [6, 2, 4, 3, 5, 1]);
    }

    #[test]
    fn cyclic_shift_rotates_left() {
        let mut tree = from_slice(5, &[1, 2, 3, 4, 5, 6]);
        tree.cyclic_shift(1, 4, 2);
        assert_eq!(collect(&mut tree), [1, 4, 5, 2, 3, 6]);
    }

    #[test]
    fn handle_at_resolves_every_position() {
        let values = [5, 3, 8, 1, 9, 2];
        let mut tree = from_slice(6, &values);
        for (position, &expected) in values.iter().enumerate() {
            let handle = tree.handle_at(position).expect("position is in range");
            assert_eq!(*tree.value(handle), expected);
            tree.validate_invariants();
        }
        assert_eq!(collect(&mut tree), values);
    }

    #[test]
    fn backward_walk_mirrors_forward_walk() {
        let mut tree = from_slice(7, &[4, 1, 3, 2, 5]);
        tree.reverse(0, 4);
        tree.cyclic_shift(1, 3, 1);

        let forward = collect(&mut tree);
        let mut backward = collect_backward(&mut tree);
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn clear_resets_everything() {
        let mut tree = from_slice(8, &[1, 2, 3]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(collect(&mut tree), []);
        tree.insert(0, 9);
        assert_eq!(collect(&mut tree), [9]);
    }

    // ─── Randomized model comparison against a Vec ───────────────────────

    #[derive(Clone, Debug)]
    enum Op {
        Insert(usize, i32),
        Delete(usize, usize),
        Add(usize, usize, i32),
        Reverse(usize, usize),
        CyclicShift(usize, usize, usize),
        Get(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (any::<usize>(), any::<i32>()).prop_map(|(position, value)| Op::Insert(position, value)),
            2 => (any::<usize>(), any::<usize>()).prop_map(|(left, right)| Op::Delete(left, right)),
            2 => (any::<usize>(), any::<usize>(), -100i32..100).prop_map(|(left, right, delta)| Op::Add(left, right, delta)),
            2 => (any::<usize>(), any::<usize>()).prop_map(|(left, right)| Op::Reverse(left, right)),
            2 => (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(left, right, count)| Op::CyclicShift(left, right, count)),
            1 => any::<usize>().prop_map(Op::Get),
        ]
    }

    /// Clamps raw strategy output to the bounds the raw layer requires.
    fn clamp_range(left: usize, right: usize, len: usize) -> (usize, usize) {
        let left = left % len;
        let right = right % len;
        if left <= right { (left, right) } else { (right, left) }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn raw_treap_matches_vec(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..300)) {
            let mut tree: RawTreap<i32> = RawTreap::with_seed(seed);
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(position, value) => {
                        let position = position % (model.len() + 1);
                        tree.insert(position, value);
                        model.insert(position, value);
                    }
                    Op::Delete(left, right) => {
                        if model.is_empty() {
                            continue;
                        }
                        let (left, right) = clamp_range(left, right, model.len());
                        tree.delete(left, right);
                        model.drain(left..=right);
                    }
                    Op::Add(left, right, delta) => {
                        if model.is_empty() {
                            continue;
                        }
                        let (left, right) = clamp_range(left, right, model.len());
                        tree.add(left, right, &delta);
                        for value in &mut model[left..=right] {
                            *value = value.wrapping_add(delta);
                        }
                    }
                    Op::Reverse(left, right) => {
                        if model.is_empty() {
                            continue;
                        }
                        let (left, right) = clamp_range(left, right, model.len());
                        tree.reverse(left, right);
                        model[left..=right].reverse();
                    }
                    Op::CyclicShift(left, right, count) => {
                        if model.is_empty() {
                            continue;
                        }
                        let (left, right) = clamp_range(left, right, model.len());
                        let count = count % (right - left + 1);
                        tree.cyclic_shift(left, right, count);
                        model[left..=right].rotate_left(count);
                    }
                    Op::Get(position) => {
                        if model.is_empty() {
                            continue;
                        }
                        let position = position % model.len();
                        let handle = tree.handle_at(position).expect("position is in range");
                        prop_assert_eq!(*tree.value(handle), model[position]);
                    }
                }

                prop_assert_eq!(collect(&mut tree), model.clone());
            }
        }
    }
}
