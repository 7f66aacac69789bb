use crate::consts::{BlockPointer, INODE_BMAP_OFFSET, LARGE_INODES_PER_BLOCK, SMALL_INODES_PER_BLOCK};
use crate::driver::DeviceDriver;
use crate::superblock::SuperBlock;
use crate::util::error::FsError;

pub const NBR_OF_BMAPS: usize = 3;

/// Selects one of the three tracked resources. Also the index into the
/// bytemap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytemapId {
    LargeInode = 0,
    SmallInode = 1,
    Data = 2,
}

/// Where a bytemap lives: its backing block and the `[start, end)` entry
/// range it owns within that block. Entries past `end` are unused padding.
#[derive(Debug, PartialEq)]
struct BytemapMeta {
    disk_block: BlockPointer,
    start: usize,
    end: usize,
}

/// Byte-per-entry free maps for large inodes, small inodes and data blocks.
/// Entries are 0 when free; every operation reads the backing block fresh
/// and writes it back, with no cache between calls.
pub struct BytemapTable {
    maps: [BytemapMeta; NBR_OF_BMAPS],
}

impl BytemapTable {
    /// Compute the three ranges from the mounted superblock. The two inode
    /// maps share the inode bytemap block, large entries in the low range,
    /// small entries immediately after; the data map has its own block.
    pub fn init(sb: &SuperBlock) -> BytemapTable {
        let half = (sb.ninodeblocks() / 2) as usize;
        let large_end = half * LARGE_INODES_PER_BLOCK;
        let small_end = large_end + half * SMALL_INODES_PER_BLOCK;

        BytemapTable {
            maps: [
                BytemapMeta { disk_block: INODE_BMAP_OFFSET, start: 0, end: large_end },
                BytemapMeta { disk_block: INODE_BMAP_OFFSET, start: large_end, end: small_end },
                BytemapMeta {
                    disk_block: sb.start_dt_bmap(),
                    start: 0,
                    end: sb.ndatablocks() as usize,
                },
            ],
        }
    }

    /// First-fit search for `count` contiguous free entries. Returns the
    /// index of the first entry in the run. Nothing is marked; callers
    /// commit with `mark`.
    pub fn find_free<D: DeviceDriver>(
        &self,
        device: &D,
        id: BytemapId,
        count: usize,
    ) -> Result<usize, FsError> {
        if count == 0 {
            return Err(FsError::InvalidArgument);
        }

        let meta = &self.maps[id as usize];
        let bmap = device.read_block(meta.disk_block)?;

        let mut run_start = meta.start;
        let mut run = 0;
        for index in meta.start..meta.end {
            if bmap[index] == 0 {
                if run == 0 {
                    run_start = index;
                }
                run += 1;
                if run == count {
                    return Ok(run_start);
                }
            } else {
                run = 0;
            }
        }
        Err(FsError::NoSpace)
    }

    /// Write `value` into `count` entries starting at `entry`. Fails with
    /// `InvalidState` as soon as an entry already holds `value`; the block
    /// is flushed back even then, so entries before the clash stay flipped
    /// on disk and callers cannot assume a failed run left the map intact.
    pub fn mark<D: DeviceDriver>(
        &self,
        device: &mut D,
        id: BytemapId,
        entry: usize,
        count: usize,
        value: u8,
    ) -> Result<usize, FsError> {
        let meta = &self.maps[id as usize];
        if entry < meta.start || entry >= meta.end || count > meta.end - entry {
            return Err(FsError::OutOfRange);
        }

        let mut bmap = device.read_block(meta.disk_block)?;
        let mut clash = false;
        for slot in bmap[entry..entry + count].iter_mut() {
            if *slot == value {
                clash = true;
                break;
            }
            *slot = value;
        }
        device.write_block(meta.disk_block, &bmap)?;

        if clash {
            return Err(FsError::InvalidState);
        }
        Ok(entry)
    }

    /// Debug dump of one bytemap's live range, 16 entries per line.
    pub fn dump<D: DeviceDriver>(&self, device: &D, id: BytemapId) -> Result<(), FsError> {
        let meta = &self.maps[id as usize];
        let bmap = device.read_block(meta.disk_block)?;

        log::debug!("{:?} bytemap, entries [{}, {}):", id, meta.start, meta.end);
        for (row, chunk) in bmap[meta.start..meta.end].chunks(16).enumerate() {
            let line = chunk
                .iter()
                .map(|entry| entry.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            log::debug!("  {:4}: {}", meta.start + row * 16, line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::file_drive::FileDrive;

    // 11 blocks and 2 inode blocks leave exactly 5 data blocks, which keeps
    // the data map small enough to exhaust in a test.
    fn setup(dir: &tempfile::TempDir) -> (FileDrive, SuperBlock, BytemapTable) {
        let name = dir.path().join("bmap.img");
        let mut drive = FileDrive::new(11);
        drive.open(name.to_str().unwrap(), true).unwrap();
        let sb = SuperBlock::create(11, 2).unwrap();
        sb.write(&mut drive).unwrap();
        let table = BytemapTable::init(&sb);
        (drive, sb, table)
    }

    #[test]
    fn ranges_follow_the_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (_, sb, table) = setup(&dir);
        assert_eq!(sb.ndatablocks(), 5);
        // One block of each inode class: 8 large slots, then 16 small.
        assert_eq!(table.maps[BytemapId::LargeInode as usize].end, 8);
        assert_eq!(table.maps[BytemapId::SmallInode as usize].start, 8);
        assert_eq!(table.maps[BytemapId::SmallInode as usize].end, 24);
        assert_eq!(table.maps[BytemapId::Data as usize].end, 5);
    }

    #[test]
    fn first_fit_returns_the_run_start() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        assert_eq!(table.find_free(&drive, BytemapId::Data, 3).unwrap(), 0);

        table.mark(&mut drive, BytemapId::Data, 0, 3, 1).unwrap();
        assert_eq!(table.find_free(&drive, BytemapId::Data, 1).unwrap(), 3);
        // Only entries 3 and 4 are left free.
        assert!(matches!(
            table.find_free(&drive, BytemapId::Data, 3),
            Err(FsError::NoSpace)
        ));
    }

    #[test]
    fn run_may_end_on_the_last_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        table.mark(&mut drive, BytemapId::Data, 0, 2, 1).unwrap();
        assert_eq!(table.find_free(&drive, BytemapId::Data, 3).unwrap(), 2);
    }

    #[test]
    fn small_inode_range_starts_after_the_large_range() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        assert_eq!(table.find_free(&drive, BytemapId::SmallInode, 1).unwrap(), 8);
        table.mark(&mut drive, BytemapId::SmallInode, 8, 2, 1).unwrap();
        assert_eq!(table.find_free(&drive, BytemapId::SmallInode, 1).unwrap(), 10);
        // The large map still sees its whole range free.
        assert_eq!(table.find_free(&drive, BytemapId::LargeInode, 8).unwrap(), 0);
    }

    #[test]
    fn mark_outside_the_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        assert!(matches!(
            table.mark(&mut drive, BytemapId::Data, 5, 1, 1),
            Err(FsError::OutOfRange)
        ));
        // A run that would overflow the range is rejected up front.
        assert!(matches!(
            table.mark(&mut drive, BytemapId::Data, 3, 3, 1),
            Err(FsError::OutOfRange)
        ));
        // Below the small map's start.
        assert!(matches!(
            table.mark(&mut drive, BytemapId::SmallInode, 7, 1, 1),
            Err(FsError::OutOfRange)
        ));
    }

    #[test]
    fn double_mark_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        table.mark(&mut drive, BytemapId::Data, 0, 1, 1).unwrap();
        assert!(matches!(
            table.mark(&mut drive, BytemapId::Data, 0, 1, 1),
            Err(FsError::InvalidState)
        ));
    }

    #[test]
    fn failed_mark_still_flushes_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let (mut drive, _, table) = setup(&dir);

        table.mark(&mut drive, BytemapId::Data, 2, 1, 1).unwrap();
        // Entries 0 and 1 get flipped before the clash at 2 and stay that
        // way on disk.
        assert!(matches!(
            table.mark(&mut drive, BytemapId::Data, 0, 3, 1),
            Err(FsError::InvalidState)
        ));
        assert_eq!(table.find_free(&drive, BytemapId::Data, 1).unwrap(), 3);
        assert!(matches!(
            table.find_free(&drive, BytemapId::Data, 3),
            Err(FsError::NoSpace)
        ));
    }

    #[test]
    fn zero_length_requests_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (drive, _, table) = setup(&dir);

        assert!(matches!(
            table.find_free(&drive, BytemapId::Data, 0),
            Err(FsError::InvalidArgument)
        ));
    }
}
