mod page_store;

pub use page_store::{AccessMode, PageStore, PageStoreError};
