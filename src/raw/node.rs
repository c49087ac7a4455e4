use crate::element::Element;

use super::handle::Handle;

/// One element of the sequence.
///
/// `parent` is a non-owning back-reference used only by cursor traversal and
/// by split when it unlinks a detached piece; ownership always flows through
/// `left`/`right` from the arena-held root.
pub(crate) struct Node<T: Element> {
    /// Independently drawn random priority; the tree is heap-ordered on
    /// these, which is what keeps the expected height logarithmic.
    pub(crate) priority: i64,
    pub(crate) value: T,
    /// Number of nodes in the subtree rooted here, this node included.
    pub(crate) size: usize,
    pub(crate) parent: Option<Handle>,
    pub(crate) left: Option<Handle>,
    pub(crate) right: Option<Handle>,
    /// Deferred additive delta owed to this entire subtree. `None` is the
    /// identity; two pending deltas fold into one via `Element::merge_delta`.
    pub(crate) pending_add: Option<T::Delta>,
    /// Deferred subtree reversal. Set means `left`/`right` must be swapped
    /// here and the flag toggled on both children before either is read.
    pub(crate) pending_reverse: bool,
}

impl<T: Element> Node<T> {
    pub(crate) fn new(priority: i64, value: T) -> Self {
        Self {
            priority,
            value,
            size: 1,
            parent: None,
            left: None,
            right: None,
            pending_add: None,
            pending_reverse: false,
        }
    }

    /// Folds `delta` into this subtree's pending additive tag.
    pub(crate) fn defer_add(&mut self, delta: &T::Delta) {
        match self.pending_add.as_mut() {
            Some(pending) => T::merge_delta(pending, delta),
            None => self.pending_add = Some(delta.clone()),
        }
    }

    /// Toggles this subtree's pending reversal tag.
    pub(crate) fn defer_reverse(&mut self) {
        self.pending_reverse = !self.pending_reverse;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_is_a_settled_singleton() {
        let node: Node<i64> = Node::new(42, 7);
        assert_eq!(node.size, 1);
        assert!(node.parent.is_none());
        assert!(node.left.is_none());
        assert!(node.right.is_none());
        assert!(node.pending_add.is_none());
        assert!(!node.pending_reverse);
    }

    #[test]
    fn deferred_adds_compose() {
        let mut node: Node<i64> = Node::new(0, 0);
        node.defer_add(&5);
        node.defer_add(&-2);
        assert_eq!(node.pending_add, Some(3));
    }

    #[test]
    fn deferred_reversals_cancel() {
        let mut node: Node<i64> = Node::new(0, 0);
        node.defer_reverse();
        node.defer_reverse();
        assert!(!node.pending_reverse);
    }
}
