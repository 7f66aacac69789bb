use crate::consts::{
    BlockPointer, InodePointer, LARGE_INODES_PER_BLOCK, LARGE_INODE_SIZE, SMALL_INODES_PER_BLOCK,
    SMALL_INODE_SIZE,
};
use crate::driver::DeviceDriver;
use crate::superblock::SuperBlock;
use crate::util::error::FsError;
use crate::util::serializable::read_u32;

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum InodeKind {
    Free = 0,
    Directory = b'D',
    File = b'F',
}

impl InodeKind {
    fn from_tag(tag: u8) -> Option<InodeKind> {
        match tag {
            0 => Some(InodeKind::Free),
            b'D' => Some(InodeKind::Directory),
            b'F' => Some(InodeKind::File),
            _ => None,
        }
    }
}

/// The slice of an inode this core reads: its kind, its size in bytes and
/// its start block as an offset into the data area. Large slots reserve more
/// room on disk but carry the same record.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Inode {
    pub kind: InodeKind,
    pub size: u32,
    pub start: BlockPointer,
}

// Record layout within a slot: kind tag, 3 pad bytes, size, start.
const SIZE_OFFSET: usize = 4;
const START_OFFSET: usize = 8;

/// Map an inode number to its slot. Numbers cover the large slots first
/// (first half of the inode area), then the small slots, mirroring the two
/// bytemap ranges.
fn locate(sb: &SuperBlock, ino: InodePointer) -> Result<(BlockPointer, usize, usize), FsError> {
    let half = sb.ninodeblocks() / 2;
    let large_slots = half * LARGE_INODES_PER_BLOCK as u32;

    if ino < large_slots {
        let block = sb.start_in_area() + ino / LARGE_INODES_PER_BLOCK as u32;
        let offset = ino as usize % LARGE_INODES_PER_BLOCK * LARGE_INODE_SIZE;
        Ok((block, offset, LARGE_INODE_SIZE))
    } else if ino < sb.total_inodes() {
        let rel = ino - large_slots;
        let block = sb.start_in_area() + half + rel / SMALL_INODES_PER_BLOCK as u32;
        let offset = rel as usize % SMALL_INODES_PER_BLOCK * SMALL_INODE_SIZE;
        Ok((block, offset, SMALL_INODE_SIZE))
    } else {
        Err(FsError::OutOfRange)
    }
}

pub fn read<D: DeviceDriver>(
    device: &D,
    sb: &SuperBlock,
    ino: InodePointer,
) -> Result<Inode, FsError> {
    let (block, offset, _) = locate(sb, ino)?;
    let buffer = device.read_block(block)?;
    let kind = InodeKind::from_tag(buffer[offset]).ok_or(FsError::InvalidState)?;
    Ok(Inode {
        kind,
        size: read_u32(&buffer, offset + SIZE_OFFSET),
        start: read_u32(&buffer, offset + START_OFFSET),
    })
}

pub fn write<D: DeviceDriver>(
    device: &mut D,
    sb: &SuperBlock,
    ino: InodePointer,
    inode: &Inode,
) -> Result<(), FsError> {
    let (block, offset, slot_size) = locate(sb, ino)?;
    let mut buffer = device.read_block(block)?;
    buffer[offset..offset + slot_size].fill(0);
    buffer[offset] = inode.kind as u8;
    buffer[offset + SIZE_OFFSET..offset + SIZE_OFFSET + 4].copy_from_slice(&inode.size.to_le_bytes());
    buffer[offset + START_OFFSET..offset + START_OFFSET + 4]
        .copy_from_slice(&inode.start.to_le_bytes());
    device.write_block(block, &buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::file_drive::FileDrive;

    fn setup(dir: &tempfile::TempDir) -> (FileDrive, SuperBlock) {
        let name = dir.path().join("inodes.img");
        let mut drive = FileDrive::new(64);
        drive.open(name.to_str().unwrap(), true).unwrap();
        let sb = SuperBlock::create(64, 4).unwrap();
        sb.write(&mut drive).unwrap();
        (drive, sb)
    }

    #[test]
    fn slots_split_between_classes() {
        let dir = tempfile::tempdir().unwrap();
        let (_, sb) = setup(&dir);

        // 4 inode blocks: 16 large slots in blocks 2..4, then small slots.
        assert_eq!(locate(&sb, 0).unwrap(), (2, 0, LARGE_INODE_SIZE));
        assert_eq!(locate(&sb, 8).unwrap(), (3, 0, LARGE_INODE_SIZE));
        assert_eq!(locate(&sb, 16).unwrap(), (4, 0, SMALL_INODE_SIZE));
        assert_eq!(locate(&sb, 33).unwrap(), (5, SMALL_INODE_SIZE, SMALL_INODE_SIZE));
        assert!(matches!(locate(&sb, 48), Err(FsError::OutOfRange)));
    }

    #[test]
    fn records_round_trip_through_their_slots() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, sb) = setup(&dir);

        let large = Inode { kind: InodeKind::Directory, size: 512, start: 3 };
        let small = Inode { kind: InodeKind::File, size: 40, start: 9 };
        write(&mut drive, &sb, 1, &large).unwrap();
        write(&mut drive, &sb, 17, &small).unwrap();

        assert_eq!(read(&drive, &sb, 1).unwrap(), large);
        assert_eq!(read(&drive, &sb, 17).unwrap(), small);
        // Neighboring slots are untouched.
        assert_eq!(read(&drive, &sb, 0).unwrap().kind, InodeKind::Free);
        assert_eq!(read(&drive, &sb, 2).unwrap().kind, InodeKind::Free);
        assert_eq!(read(&drive, &sb, 16).unwrap().kind, InodeKind::Free);
    }

    #[test]
    fn unknown_tag_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, sb) = setup(&dir);

        let mut block = drive.read_block(2).unwrap();
        block[0] = 0xff;
        drive.write_block(2, &block).unwrap();
        assert!(matches!(read(&drive, &sb, 0), Err(FsError::InvalidState)));
    }
}
