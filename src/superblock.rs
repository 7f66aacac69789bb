use crate::consts::{
    BlockPointer, DISK_BLOCK_SIZE, FS_MAGIC, LARGE_INODES_PER_BLOCK, SB_OFFSET,
    SMALL_INODES_PER_BLOCK,
};
use crate::driver::DeviceDriver;
use crate::util::error::FsError;
use crate::util::serializable::{read_u32, ByteSerializable};

/// On-disk layout descriptor. Computed once at format time; the offsets are
/// never recomputed while the filesystem is mounted.
#[derive(Debug, PartialEq, Clone)]
pub struct SuperBlock {
    magic: u32,
    nblocks: u32,
    nbmapblocks_inodes: u32,
    ninodeblocks: u32,
    ninodes: u32,
    nbmapblocks_data: u32,
    ndatablocks: u32,
    start_in_area: u32,
    start_rotdir: u32,
    start_dt_bmap: u32,
    start_dt_area: u32,
    mounted: u32,
}

impl SuperBlock {
    /// Compute the full layout for a disk of `nblocks` with `ninodeblocks`
    /// reserved for inodes. Rejects parameter pairs whose bytemaps would not
    /// fit their single block or whose data area would be empty.
    pub fn create(nblocks: u32, ninodeblocks: u32) -> Result<SuperBlock, FsError> {
        if ninodeblocks < 2 {
            return Err(FsError::InvalidArgument);
        }

        let half = ninodeblocks / 2;
        let ninodes = (LARGE_INODES_PER_BLOCK + SMALL_INODES_PER_BLOCK) as u32 * half;
        if ninodes as usize > DISK_BLOCK_SIZE {
            return Err(FsError::InvalidArgument);
        }

        let nbmapblocks_inodes = 1;
        let start_in_area = nbmapblocks_inodes + 1;
        let start_rotdir = start_in_area + ninodeblocks;
        let start_dt_bmap = start_rotdir + 1;
        let nbmapblocks_data = 1;
        let start_dt_area = start_dt_bmap + nbmapblocks_data;
        if start_dt_area >= nblocks {
            return Err(FsError::InvalidArgument);
        }

        let ndatablocks = nblocks - start_dt_area;
        if ndatablocks as usize > DISK_BLOCK_SIZE {
            return Err(FsError::InvalidArgument);
        }

        Ok(SuperBlock {
            magic: FS_MAGIC,
            nblocks,
            nbmapblocks_inodes,
            ninodeblocks,
            ninodes,
            nbmapblocks_data,
            ndatablocks,
            start_in_area,
            start_rotdir,
            start_dt_bmap,
            start_dt_area,
            mounted: 0,
        })
    }

    /// Load the superblock from its fixed block. The magic is not checked
    /// here; callers that care compare `magic()` against `FS_MAGIC`.
    pub fn read<D: DeviceDriver>(device: &D) -> Result<SuperBlock, FsError> {
        let block = device.read_block(SB_OFFSET)?;
        Ok(SuperBlock::from_bytes(&block))
    }

    pub fn write<D: DeviceDriver>(&self, device: &mut D) -> Result<(), FsError> {
        let mut block = [0; DISK_BLOCK_SIZE];
        let bytes = self.to_bytes();
        block[..bytes.len()].copy_from_slice(&bytes);
        device.write_block(SB_OFFSET, &block)
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    pub fn nblocks(&self) -> u32 {
        self.nblocks
    }

    pub fn ninodeblocks(&self) -> u32 {
        self.ninodeblocks
    }

    pub fn total_inodes(&self) -> u32 {
        self.ninodes
    }

    pub fn ndatablocks(&self) -> u32 {
        self.ndatablocks
    }

    pub fn start_in_area(&self) -> BlockPointer {
        self.start_in_area
    }

    pub fn start_rotdir(&self) -> BlockPointer {
        self.start_rotdir
    }

    pub fn start_dt_bmap(&self) -> BlockPointer {
        self.start_dt_bmap
    }

    pub fn start_dt_area(&self) -> BlockPointer {
        self.start_dt_area
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted != 0
    }

    pub(crate) fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted as u32;
    }

    pub fn log_dump(&self) {
        log::debug!("superblock:");
        log::debug!("  magic             = {:#x}", self.magic);
        log::debug!("  nblocks           = {}", self.nblocks);
        log::debug!("  nbmapblocks_inodes= {}", self.nbmapblocks_inodes);
        log::debug!("  ninodeblocks      = {}", self.ninodeblocks);
        log::debug!("  ninodes           = {}", self.ninodes);
        log::debug!("  nbmapblocks_data  = {}", self.nbmapblocks_data);
        log::debug!("  ndatablocks       = {}", self.ndatablocks);
        log::debug!("  start_in_area     = {}", self.start_in_area);
        log::debug!("  start_rotdir      = {}", self.start_rotdir);
        log::debug!("  start_dt_bmap     = {}", self.start_dt_bmap);
        log::debug!("  start_dt_area     = {}", self.start_dt_area);
        log::debug!("  mounted           = {}", self.is_mounted());
    }
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.nblocks.to_le_bytes());
        bytes.extend_from_slice(&self.nbmapblocks_inodes.to_le_bytes());
        bytes.extend_from_slice(&self.ninodeblocks.to_le_bytes());
        bytes.extend_from_slice(&self.ninodes.to_le_bytes());
        bytes.extend_from_slice(&self.nbmapblocks_data.to_le_bytes());
        bytes.extend_from_slice(&self.ndatablocks.to_le_bytes());
        bytes.extend_from_slice(&self.start_in_area.to_le_bytes());
        bytes.extend_from_slice(&self.start_rotdir.to_le_bytes());
        bytes.extend_from_slice(&self.start_dt_bmap.to_le_bytes());
        bytes.extend_from_slice(&self.start_dt_area.to_le_bytes());
        bytes.extend_from_slice(&self.mounted.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> SuperBlock {
        SuperBlock {
            magic: read_u32(bytes, 0),
            nblocks: read_u32(bytes, 4),
            nbmapblocks_inodes: read_u32(bytes, 8),
            ninodeblocks: read_u32(bytes, 12),
            ninodes: read_u32(bytes, 16),
            nbmapblocks_data: read_u32(bytes, 20),
            ndatablocks: read_u32(bytes, 24),
            start_in_area: read_u32(bytes, 28),
            start_rotdir: read_u32(bytes, 32),
            start_dt_bmap: read_u32(bytes, 36),
            start_dt_area: read_u32(bytes, 40),
            mounted: read_u32(bytes, 44),
        }
    }
}
