use std::fs::{File as StdFile, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::{EmberError, Result};

// Block-file abstraction - lets us swap between real files and in-memory
// storage for testing.

pub trait File: Send {
    fn size(&self) -> Result<usize>;
    fn resize(&mut self, new_size: usize) -> Result<()>;
    fn read_block(&mut self, offset: usize, len: usize) -> Result<Vec<u8>>;
    fn write_block(&mut self, offset: usize, block: &[u8]) -> Result<()>;
}

pub struct DiskFile {
    file: StdFile,
    cached_size: usize,
}

impl DiskFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let cached_size = file.metadata()?.len() as usize;
        Ok(Self { file, cached_size })
    }

    pub fn temporary() -> Result<Self> {
        use std::env::temp_dir;
        use uuid::Uuid;

        let temp_path = temp_dir().join(format!("emberdb-temp-{}.tbl", Uuid::new_v4()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&temp_path)?;

        // Unlink right away - the handle stays usable but the file
        // disappears from the filesystem.
        std::fs::remove_file(&temp_path)?;

        Ok(Self {
            file,
            cached_size: 0,
        })
    }
}

impl File for DiskFile {
    fn size(&self) -> Result<usize> {
        Ok(self.cached_size)
    }

    fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size == self.cached_size {
            return Ok(());
        }
        self.file.set_len(new_size as u64)?;
        self.cached_size = new_size;
        Ok(())
    }

    fn read_block(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        if offset + len > self.cached_size {
            return Err(EmberError::Other(format!(
                "read past end of file: offset={}, len={}, size={}",
                offset, len, self.cached_size
            )));
        }

        let mut buffer = vec![0u8; len];
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write_block(&mut self, offset: usize, block: &[u8]) -> Result<()> {
        if offset + block.len() > self.cached_size {
            self.resize(offset + block.len())?;
        }
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(block)?;
        self.file.flush()?;
        Ok(())
    }
}

// In-memory backing store, used by tests and throwaway tables.
pub struct MemoryFile {
    data: Vec<u8>,
}

impl MemoryFile {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }
}

impl Default for MemoryFile {
    fn default() -> Self {
        Self::new()
    }
}

impl File for MemoryFile {
    fn size(&self) -> Result<usize> {
        Ok(self.data.len())
    }

    fn resize(&mut self, new_size: usize) -> Result<()> {
        self.data.resize(new_size, 0);
        Ok(())
    }

    fn read_block(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        if offset + len > self.data.len() {
            return Err(EmberError::Other(format!(
                "read past end of file: offset={}, len={}, size={}",
                offset,
                len,
                self.data.len()
            )));
        }
        Ok(self.data[offset..offset + len].to_vec())
    }

    fn write_block(&mut self, offset: usize, block: &[u8]) -> Result<()> {
        if offset + block.len() > self.data.len() {
            self.resize(offset + block.len())?;
        }
        self.data[offset..offset + block.len()].copy_from_slice(block);
        Ok(())
    }
}
