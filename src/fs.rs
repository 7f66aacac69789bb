use crate::bytemap::{BytemapId, BytemapTable};
use crate::consts::{InodePointer, DISK_BLOCK_SIZE, INODE_BMAP_OFFSET};
use crate::directory::{Dentry, DirTable};
use crate::driver::DeviceDriver;
use crate::inode::{self, Inode};
use crate::superblock::SuperBlock;
use crate::util::error::FsError;

/// A mounted filesystem: the device, the layout, the three bytemaps and the
/// two directory contexts. Constructing one is the only way to mount, and
/// `umount` consumes it, so a device is never shared between a mounted and
/// an unmounted view in the same process.
pub struct FlatFs<D: DeviceDriver> {
    device: D,
    superblock: SuperBlock,
    bytemaps: BytemapTable,
    dirs: DirTable,
}

impl<D: DeviceDriver> FlatFs<D> {
    /// Build a fresh filesystem on the device: compute the layout, persist
    /// the superblock and clear the two bytemap blocks and the root
    /// directory block. Leaves the device closed.
    pub fn format(
        device: &mut D,
        name: &str,
        nblocks: u32,
        ninodeblocks: u32,
    ) -> Result<SuperBlock, FsError> {
        device.open(name, true)?;
        let sb = SuperBlock::create(nblocks, ninodeblocks)?;
        sb.write(device)?;

        let zeroes = [0; DISK_BLOCK_SIZE];
        device.write_block(INODE_BMAP_OFFSET, &zeroes)?;
        device.write_block(sb.start_dt_bmap(), &zeroes)?;
        device.write_block(sb.start_rotdir(), &zeroes)?;
        device.close()?;

        log::debug!("formatted {}: {} blocks, {} inode blocks", name, nblocks, ninodeblocks);
        Ok(sb)
    }

    /// Mount: open the device, load the superblock, persist the mounted
    /// flag, then derive the bytemap ranges. A failing step aborts with its
    /// own error and earlier steps are not rolled back.
    pub fn mount(mut device: D, name: &str, debug: bool) -> Result<FlatFs<D>, FsError> {
        device.open(name, false)?;
        let mut superblock = SuperBlock::read(&device)?;
        superblock.set_mounted(true);
        superblock.write(&mut device)?;

        if debug {
            superblock.log_dump();
        }

        let bytemaps = BytemapTable::init(&superblock);
        log::debug!("mounted {}", name);
        Ok(FlatFs { device, superblock, bytemaps, dirs: DirTable::new() })
    }

    /// Clear the mounted flag, persist it, then close the device, strictly
    /// in that order. Returns the device.
    pub fn umount(self) -> Result<D, FsError> {
        let FlatFs { mut device, mut superblock, .. } = self;
        superblock.set_mounted(false);
        superblock.write(&mut device)?;
        device.close()?;
        log::debug!("unmounted");
        Ok(device)
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    // Bytemap operations.

    pub fn find_free(&self, id: BytemapId, count: usize) -> Result<usize, FsError> {
        self.bytemaps.find_free(&self.device, id, count)
    }

    pub fn mark(
        &mut self,
        id: BytemapId,
        entry: usize,
        count: usize,
        value: u8,
    ) -> Result<usize, FsError> {
        self.bytemaps.mark(&mut self.device, id, entry, count, value)
    }

    pub fn dump_bytemap(&self, id: BytemapId) -> Result<(), FsError> {
        self.bytemaps.dump(&self.device, id)
    }

    // Directory operations, all acting on the active context.

    pub fn open_dir(&mut self, name: &str) -> Result<(), FsError> {
        self.dirs.open(&self.device, &self.superblock, name)
    }

    pub fn close_dir(&mut self, name: &str) -> Result<(), FsError> {
        self.dirs.close(&mut self.device, name)
    }

    pub fn create_entry(&mut self, name: &str, inode: InodePointer) -> Result<(), FsError> {
        self.dirs.create(name, inode)
    }

    pub fn delete_entry(&mut self, name: &str) -> Result<InodePointer, FsError> {
        self.dirs.delete(name)
    }

    pub fn read_entry(&mut self) -> Result<Option<&Dentry>, FsError> {
        self.dirs.read_next()
    }

    pub fn rewind_dir(&mut self) -> Result<(), FsError> {
        self.dirs.rewind()
    }

    pub fn dump_dir(&self) -> Result<(), FsError> {
        self.dirs.log_dump()
    }

    // Inode collaborator surface.

    pub fn read_inode(&self, ino: InodePointer) -> Result<Inode, FsError> {
        inode::read(&self.device, &self.superblock, ino)
    }

    pub fn write_inode(&mut self, ino: InodePointer, inode: &Inode) -> Result<(), FsError> {
        inode::write(&mut self.device, &self.superblock, ino, inode)
    }
}
