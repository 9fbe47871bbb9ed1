use thiserror::Error;

use crate::storage::disk::PageStoreError;

#[derive(Error, Debug)]
pub enum BTreeError {
    #[error("Node is full")]
    NodeFull,

    #[error("Invalid cursor or entry position")]
    InvalidCursor,

    #[error("No such record")]
    NoSuchRecord,

    #[error("End of tree")]
    EndOfTree,

    #[error("Key 0 is reserved by the on-disk format")]
    ReservedKey,

    #[error("Index file metadata is corrupt")]
    InvalidFileFormat,

    #[error("Page store error: {0}")]
    Store(#[from] PageStoreError),
}
