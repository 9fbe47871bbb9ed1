pub mod error;
pub mod index;
pub mod internal;
pub mod leaf;

pub use error::BTreeError;
pub use index::{BTreeIndex, IndexCursor};
pub use internal::{InternalNode, MAX_INTERNAL_KEYS};
pub use leaf::{LeafNode, MAX_LEAF_ENTRIES};
