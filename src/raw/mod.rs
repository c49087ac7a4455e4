mod arena;
mod handle;
mod node;
mod raw_treap;

pub(crate) use handle::Handle;
pub(crate) use raw_treap::RawTreap;
