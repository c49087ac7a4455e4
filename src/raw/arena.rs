use alloc::vec::Vec;

use super::handle::Handle;

/// Flat backing store for tree nodes with explicit slot recycling.
///
/// Freed slots go onto a LIFO free list and are reissued most-recently-freed
/// first, so a delete-heavy workload churns through a small, cache-warm
/// region of the slot vector instead of growing it. A freed handle holds no
/// live node until it is reissued; accessing one panics.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of live nodes (allocated and not yet freed).
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Issues a slot for `node`, reusing the most recently freed slot if one
    /// exists and appending a fresh slot otherwise.
    pub(crate) fn alloc(&mut self, node: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.to_index()] = Some(node);
            handle
        } else {
            // Strict less-than keeps the last slot representable as a Handle.
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(node));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Reclaims a slot, returning the node that occupied it. Delete uses the
    /// returned node to reach the children of the subtree being recycled.
    pub(crate) fn free(&mut self, handle: Handle) -> T {
        let node = self.slots[handle.to_index()].take().expect("`Arena::free()` - `handle` is invalid!");
        self.free.push(handle);
        node
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
