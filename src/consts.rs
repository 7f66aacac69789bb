pub const DISK_BLOCK_SIZE: usize = 512;

pub const FS_MAGIC: u32 = 0xF1A7F515;

// Fixed layout prefix: the superblock, then the single inode bytemap block.
pub const SB_OFFSET: BlockPointer = 0;
pub const INODE_BMAP_OFFSET: BlockPointer = 1;

pub const FNAME_LENGTH: usize = 4;
pub const DENTRY_SIZE: usize = FNAME_LENGTH + 4;
pub const DENTRIES_PER_BLOCK: usize = DISK_BLOCK_SIZE / DENTRY_SIZE;

pub const LARGE_INODE_SIZE: usize = 64;
pub const SMALL_INODE_SIZE: usize = 32;
pub const LARGE_INODES_PER_BLOCK: usize = DISK_BLOCK_SIZE / LARGE_INODE_SIZE;
pub const SMALL_INODES_PER_BLOCK: usize = DISK_BLOCK_SIZE / SMALL_INODE_SIZE;

pub type BlockPointer = u32;
pub type InodePointer = u32;

/// One whole device block; all I/O moves blocks of exactly this size.
pub type Block = [u8; DISK_BLOCK_SIZE];
