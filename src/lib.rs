// Export public modules
pub mod common;
pub mod index;
pub mod storage;

// Re-export key items for convenient access
pub use common::types::{Key, PageId, Rid};
pub use index::btree::{BTreeError, BTreeIndex, IndexCursor};
pub use storage::disk::{AccessMode, PageStore, PageStoreError};
