//! Allocation and metadata core of a flat, block-based filesystem: a
//! superblock describing the on-disk layout, byte-per-entry free maps for
//! two inode classes and the data area, and a single-level directory
//! manager over fixed-size directory blocks.

pub mod bytemap;
pub mod consts;
pub mod directory;
pub mod driver;
pub mod fs;
pub mod inode;
pub mod superblock;
mod util;

pub use bytemap::{BytemapId, BytemapTable};
pub use directory::{Dentry, DirKind, DirTable};
pub use driver::file_drive::FileDrive;
pub use driver::DeviceDriver;
pub use fs::FlatFs;
pub use inode::{Inode, InodeKind};
pub use superblock::SuperBlock;
pub use util::error::FsError;
pub use util::serializable::ByteSerializable;
