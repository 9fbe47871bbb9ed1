use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{PageData, PageId, PAGE_SIZE};

#[derive(Error, Debug)]
pub enum PageStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),
    #[error("Page store opened read-only")]
    ReadOnly,
}

/// How a page store is opened. `Read` requires the file to exist;
/// `Write` creates it when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// PageStore is a fixed-size block device over a backing file. Pages are
/// `PAGE_SIZE` bytes and addressed by non-negative `PageId`; the file is
/// always a whole number of pages long.
pub struct PageStore {
    file: Mutex<File>,
    mode: AccessMode,
}

impl PageStore {
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self, PageStoreError> {
        let file = match mode {
            AccessMode::Read => OpenOptions::new().read(true).open(path)?,
            AccessMode::Write => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?,
        };

        Ok(Self {
            file: Mutex::new(file),
            mode,
        })
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_writable(&self) -> bool {
        self.mode == AccessMode::Write
    }

    /// One past the last allocated page; the next append goes here.
    pub fn end_pid(&self) -> Result<PageId, PageStoreError> {
        let file = self.file.lock();
        let file_size = file.metadata()?.len();
        Ok((file_size / PAGE_SIZE as u64) as PageId)
    }

    /// Fill `page` from page `pid`. Fails for `pid` outside `[0, end_pid())`.
    pub fn read(&self, pid: PageId, page: &mut PageData) -> Result<(), PageStoreError> {
        if pid < 0 {
            return Err(PageStoreError::InvalidPageId(pid));
        }

        let mut file = self.file.lock();
        let file_size = file.metadata()?.len();
        let offset = pid as u64 * PAGE_SIZE as u64;
        if offset >= file_size {
            return Err(PageStoreError::InvalidPageId(pid));
        }

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(page)?;

        Ok(())
    }

    /// Write `page` at block granularity. Writing at `end_pid()` extends the
    /// file by exactly one page; writing past that fails.
    pub fn write(&self, pid: PageId, page: &PageData) -> Result<(), PageStoreError> {
        if !self.is_writable() {
            return Err(PageStoreError::ReadOnly);
        }
        if pid < 0 {
            return Err(PageStoreError::InvalidPageId(pid));
        }

        let mut file = self.file.lock();
        let file_size = file.metadata()?.len();
        let offset = pid as u64 * PAGE_SIZE as u64;
        if offset > file_size {
            return Err(PageStoreError::InvalidPageId(pid));
        }

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page)?;

        Ok(())
    }

    pub fn flush(&self) -> Result<(), PageStoreError> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Flush and release the file handle
    pub fn close(self) -> Result<(), PageStoreError> {
        self.flush()
    }
}

impl Drop for PageStore {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
