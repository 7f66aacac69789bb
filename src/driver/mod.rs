use crate::consts::{Block, BlockPointer};
use crate::util::error::FsError;

pub mod file_drive;

/// Block device seam. Addressing is by absolute block number; every transfer
/// is exactly one block.
pub trait DeviceDriver {
    fn open(&mut self, name: &str, create: bool) -> Result<(), FsError>;
    fn close(&mut self) -> Result<(), FsError>;
    fn block_count(&self) -> BlockPointer;
    fn read_block(&self, index: BlockPointer) -> Result<Block, FsError>;
    fn write_block(&mut self, index: BlockPointer, block: &Block) -> Result<(), FsError>;
}
