//! File-backed emulation of the node's 1024-byte EEPROM.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use airnode_core::store::{check_bounds, NonVolatileStore, StoreError, ERASED_BYTE, STORE_CAPACITY};
use tracing::info;

pub struct FileStore {
    file: File,
}

impl FileStore {
    /// Open the image at `path`, creating an erased one if it is missing or short.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len() as usize;
        if len < STORE_CAPACITY {
            info!(path = %path.display(), "Formatting store image");
            file.seek(SeekFrom::Start(len as u64))?;
            file.write_all(&vec![ERASED_BYTE; STORE_CAPACITY - len])?;
            file.sync_all()?;
        }

        Ok(Self { file })
    }
}

impl NonVolatileStore for FileStore {
    fn capacity(&self) -> usize {
        STORE_CAPACITY
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_bounds(offset, buf.len(), STORE_CAPACITY)?;
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        check_bounds(offset, data.len(), STORE_CAPACITY)?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.file.sync_data()?;
        Ok(())
    }
}
