use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};

use crate::common::types::{Key, PageData, PageId, Rid, INVALID_PAGE_ID, META_PAGE_ID, PAGE_SIZE};
use crate::index::btree::error::BTreeError;
use crate::index::btree::internal::InternalNode;
use crate::index::btree::leaf::LeafNode;
use crate::storage::disk::{AccessMode, PageStore};

/// Reserved by the on-disk format as the end-of-entries sentinel
const RESERVED_KEY: Key = 0;

/// Position on the leaf level: a leaf page and an entry index within it.
/// Produced by [`BTreeIndex::locate`], advanced by
/// [`BTreeIndex::read_forward`]. A cursor whose `pid` is 0 is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCursor {
    pub pid: PageId,
    pub eid: usize,
}

/// Disk-backed B+Tree index mapping i32 keys to record IDs.
///
/// Page 0 of the backing file persists `(root_pid, tree_height)`; all other
/// pages are leaf or internal nodes, allocated append-only. Single-writer,
/// single-reader; durability comes from `close` (or drop) flushing the
/// metadata block.
pub struct BTreeIndex {
    store: PageStore,
    root_pid: PageId,
    tree_height: i32,
    closed: bool,
}

impl BTreeIndex {
    /// Open or create the index file. Write mode bootstraps the metadata
    /// page on a fresh file; read mode restores it.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self, BTreeError> {
        let store = PageStore::open(path.as_ref(), mode)?;
        let mut index = Self {
            store,
            root_pid: INVALID_PAGE_ID,
            tree_height: 0,
            closed: false,
        };

        if index.store.end_pid()? == 0 {
            if index.store.is_writable() {
                index.write_meta()?;
            }
        } else {
            index.read_meta()?;
        }

        info!(
            "opened index {:?}: root {}, height {}",
            path.as_ref(),
            index.root_pid,
            index.tree_height
        );
        Ok(index)
    }

    /// Persist the metadata block and flush the store
    pub fn close(mut self) -> Result<(), BTreeError> {
        self.persist()?;
        self.closed = true;
        info!(
            "closed index: root {}, height {}",
            self.root_pid, self.tree_height
        );
        Ok(())
    }

    pub fn root_pid(&self) -> PageId {
        self.root_pid
    }

    pub fn tree_height(&self) -> i32 {
        self.tree_height
    }

    fn read_meta(&mut self) -> Result<(), BTreeError> {
        let mut page: PageData = [0; PAGE_SIZE];
        self.store.read(META_PAGE_ID, &mut page)?;
        self.root_pid = LittleEndian::read_i32(&page[0..4]);
        self.tree_height = LittleEndian::read_i32(&page[4..8]);

        let empty = self.tree_height == 0;
        if empty != (self.root_pid == INVALID_PAGE_ID) || self.tree_height < 0 {
            return Err(BTreeError::InvalidFileFormat);
        }
        Ok(())
    }

    fn write_meta(&self) -> Result<(), BTreeError> {
        let mut page: PageData = [0; PAGE_SIZE];
        LittleEndian::write_i32(&mut page[0..4], self.root_pid);
        LittleEndian::write_i32(&mut page[4..8], self.tree_height);
        self.store.write(META_PAGE_ID, &page)?;
        Ok(())
    }

    fn persist(&self) -> Result<(), BTreeError> {
        if self.store.is_writable() {
            self.write_meta()?;
        }
        self.store.flush()?;
        Ok(())
    }

    /// Insert a `(key, rid)` pair. Splits propagate toward the root; the
    /// tree grows by one level when the root itself splits.
    pub fn insert(&mut self, key: Key, rid: Rid) -> Result<(), BTreeError> {
        if key == RESERVED_KEY {
            return Err(BTreeError::ReservedKey);
        }

        if self.tree_height == 0 {
            let mut root = LeafNode::new();
            root.insert(key, rid)?;
            let pid = self.store.end_pid()?;
            root.write(pid, &self.store)?;
            self.root_pid = pid;
            self.tree_height = 1;
            debug!("created root leaf at page {}", pid);
            return Ok(());
        }

        // Descend to the target leaf, remembering the ancestors for split
        // propagation
        let mut ancestors: Vec<PageId> = Vec::with_capacity(self.tree_height as usize);
        let mut pid = self.root_pid;
        for _ in 1..self.tree_height {
            let mut node = InternalNode::new();
            node.read(pid, &self.store)?;
            ancestors.push(pid);
            pid = node.locate_child_ptr(key);
        }

        let mut leaf = LeafNode::new();
        leaf.read(pid, &self.store)?;
        match leaf.insert(key, rid) {
            Ok(()) => {
                leaf.write(pid, &self.store)?;
                return Ok(());
            }
            Err(BTreeError::NodeFull) => {}
            Err(e) => return Err(e),
        }

        // Leaf overflow: split, chain the siblings, then push the separator
        // into the parents
        let mut sibling = LeafNode::new();
        let mut promote = leaf.insert_and_split(key, rid, &mut sibling)?;
        let mut sibling_pid = self.store.end_pid()?;
        leaf.set_next_leaf(sibling_pid);
        sibling.write(sibling_pid, &self.store)?;
        leaf.write(pid, &self.store)?;
        debug!(
            "split leaf {} into {}, separator {}",
            pid, sibling_pid, promote
        );

        while let Some(parent_pid) = ancestors.pop() {
            let mut parent = InternalNode::new();
            parent.read(parent_pid, &self.store)?;
            match parent.insert(promote, sibling_pid) {
                Ok(()) => {
                    parent.write(parent_pid, &self.store)?;
                    return Ok(());
                }
                Err(BTreeError::NodeFull) => {
                    let mut parent_sibling = InternalNode::new();
                    let mid_key =
                        parent.insert_and_split(promote, sibling_pid, &mut parent_sibling)?;
                    let new_pid = self.store.end_pid()?;
                    parent_sibling.write(new_pid, &self.store)?;
                    parent.write(parent_pid, &self.store)?;
                    debug!(
                        "split internal {} into {}, pushing up {}",
                        parent_pid, new_pid, mid_key
                    );
                    promote = mid_key;
                    sibling_pid = new_pid;
                }
                Err(e) => return Err(e),
            }
        }

        // A promotion outlived the ancestor stack: grow a new root
        let mut root = InternalNode::new();
        root.initialize_root(self.root_pid, promote, sibling_pid)?;
        let root_pid = self.store.end_pid()?;
        root.write(root_pid, &self.store)?;
        self.root_pid = root_pid;
        self.tree_height += 1;
        debug!(
            "tree grew to height {}, new root {}",
            self.tree_height, root_pid
        );
        Ok(())
    }

    /// Position `cursor` at `search_key`, or at the first entry greater
    /// than it when absent (`NoSuchRecord`) so that range scans can start
    /// from a miss.
    pub fn locate(&self, search_key: Key, cursor: &mut IndexCursor) -> Result<(), BTreeError> {
        if self.tree_height == 0 {
            *cursor = IndexCursor::default();
            return Err(BTreeError::NoSuchRecord);
        }

        let pid = self.find_leaf(search_key)?;
        let mut leaf = LeafNode::new();
        leaf.read(pid, &self.store)?;

        let (eid, found) = leaf.locate(search_key);
        cursor.pid = pid;
        cursor.eid = eid;
        if found {
            Ok(())
        } else {
            Err(BTreeError::NoSuchRecord)
        }
    }

    /// Emit the entry under `cursor` and step forward, hopping to the next
    /// leaf in the chain when the current one is exhausted. `EndOfTree`
    /// terminates the scan.
    pub fn read_forward(&self, cursor: &mut IndexCursor) -> Result<(Key, Rid), BTreeError> {
        loop {
            if cursor.pid <= 0 {
                return Err(BTreeError::EndOfTree);
            }

            let mut leaf = LeafNode::new();
            leaf.read(cursor.pid, &self.store)?;

            if cursor.eid >= leaf.key_count() {
                cursor.pid = leaf.next_leaf();
                cursor.eid = 0;
                continue;
            }

            let entry = leaf.read_entry(cursor.eid)?;
            cursor.eid += 1;
            return Ok(entry);
        }
    }

    /// Total number of keys, by walking the leaf chain from the leftmost
    /// leaf
    pub fn get_total_key_count(&self) -> Result<usize, BTreeError> {
        if self.tree_height == 0 {
            return Ok(0);
        }

        let mut pid = self.find_leaf(Key::MIN)?;
        let mut total = 0;
        loop {
            let mut leaf = LeafNode::new();
            leaf.read(pid, &self.store)?;
            total += leaf.key_count();
            pid = leaf.next_leaf();
            if pid == 0 {
                return Ok(total);
            }
        }
    }

    /// Descend through the internal levels to the leaf covering
    /// `search_key`
    fn find_leaf(&self, search_key: Key) -> Result<PageId, BTreeError> {
        let mut pid = self.root_pid;
        for _ in 1..self.tree_height {
            let mut node = InternalNode::new();
            node.read(pid, &self.store)?;
            pid = node.locate_child_ptr(search_key);
        }
        Ok(pid)
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if !self.closed && self.store.is_writable() {
            let _ = self.persist();
        }
    }
}
