use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;

use crate::consts::{Block, BlockPointer, DISK_BLOCK_SIZE};
use crate::driver::DeviceDriver;
use crate::util::error::FsError;

/// Disk image backed by a regular file, one block per `DISK_BLOCK_SIZE`
/// bytes. The handle only exists between `open` and `close`.
pub struct FileDrive {
    file: Option<File>,
    block_count: BlockPointer,
}

impl FileDrive {
    pub fn new(block_count: BlockPointer) -> FileDrive {
        FileDrive { file: None, block_count }
    }

    fn handle(&self) -> Result<&File, FsError> {
        self.file
            .as_ref()
            .ok_or_else(|| FsError::Io(io::Error::new(io::ErrorKind::NotConnected, "drive not open")))
    }
}

impl DeviceDriver for FileDrive {
    fn open(&mut self, name: &str, create: bool) -> Result<(), FsError> {
        let file = if create {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(name)?;
            file.set_len(self.block_count as u64 * DISK_BLOCK_SIZE as u64)?;
            file
        } else {
            let file = OpenOptions::new().read(true).write(true).open(name)?;
            // An existing image dictates its own size.
            self.block_count = (file.metadata()?.len() / DISK_BLOCK_SIZE as u64) as BlockPointer;
            file
        };
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> Result<(), FsError> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn block_count(&self) -> BlockPointer {
        self.block_count
    }

    fn read_block(&self, index: BlockPointer) -> Result<Block, FsError> {
        if index >= self.block_count {
            return Err(FsError::OutOfRange);
        }
        let mut block = [0; DISK_BLOCK_SIZE];
        self.handle()?
            .read_exact_at(&mut block, index as u64 * DISK_BLOCK_SIZE as u64)?;
        Ok(block)
    }

    fn write_block(&mut self, index: BlockPointer, block: &Block) -> Result<(), FsError> {
        if index >= self.block_count {
            return Err(FsError::OutOfRange);
        }
        self.handle()?
            .write_all_at(block, index as u64 * DISK_BLOCK_SIZE as u64)?;
        Ok(())
    }
}
