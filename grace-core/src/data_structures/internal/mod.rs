mod marked_ptr;
mod node;

pub(crate) use marked_ptr::MarkedPtr;
pub(crate) use node::{KvNode, NodeBox, NodePtr, OwnedNode};
