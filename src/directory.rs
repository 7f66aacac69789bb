use crate::consts::{Block, BlockPointer, InodePointer, DENTRIES_PER_BLOCK, DENTRY_SIZE, FNAME_LENGTH};
use crate::driver::DeviceDriver;
use crate::inode::{self, InodeKind};
use crate::superblock::SuperBlock;
use crate::util::error::FsError;
use crate::util::serializable::{read_u32, ByteSerializable};

/// One directory entry: a fixed 4-byte name and the inode it points to. A
/// slot is free iff the first name byte is zero; a 4-byte name carries no
/// terminator.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Dentry {
    pub name: [u8; FNAME_LENGTH],
    pub inode: InodePointer,
}

impl Dentry {
    const EMPTY: Dentry = Dentry { name: [0; FNAME_LENGTH], inode: 0 };

    fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    /// Name bytes up to the first zero, for display.
    pub fn name_str(&self) -> String {
        let len = self.name.iter().position(|b| *b == 0).unwrap_or(FNAME_LENGTH);
        String::from_utf8_lossy(&self.name[..len]).into_owned()
    }
}

impl ByteSerializable for Dentry {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(DENTRY_SIZE);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.inode.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Dentry {
        let mut name = [0; FNAME_LENGTH];
        name.copy_from_slice(&bytes[..FNAME_LENGTH]);
        Dentry { name, inode: read_u32(bytes, FNAME_LENGTH) }
    }
}

/// Which of the two contexts is active. Root is the designated root block;
/// Other is the single subdirectory that may be open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Root = 0,
    Other = 1,
}

/// An open directory block: its entries in memory, where they came from and
/// the sequential-read cursor. Mutations stay in memory until close flushes
/// the block.
struct DirContext {
    entries: [Dentry; DENTRIES_PER_BLOCK],
    disk_block: BlockPointer,
    open: bool,
    cursor: usize,
}

impl DirContext {
    fn new() -> DirContext {
        DirContext {
            entries: [Dentry::EMPTY; DENTRIES_PER_BLOCK],
            disk_block: 0,
            open: false,
            cursor: 0,
        }
    }

    fn load(&mut self, block: &Block) {
        for (slot, chunk) in self.entries.iter_mut().zip(block.chunks(DENTRY_SIZE)) {
            *slot = Dentry::from_bytes(chunk);
        }
    }

    fn store(&self) -> Block {
        let mut block = [0; crate::consts::DISK_BLOCK_SIZE];
        for (slot, chunk) in self.entries.iter().zip(block.chunks_mut(DENTRY_SIZE)) {
            chunk.copy_from_slice(&slot.to_bytes());
        }
        block
    }
}

/// The two directory contexts plus the selector that says which one the
/// single-context operations act on. Opening a subdirectory moves the
/// selector to Other; closing it moves back to Root, whose open flag is
/// untouched across the excursion.
pub struct DirTable {
    cwd: [DirContext; 2],
    current: DirKind,
}

impl Default for DirTable {
    fn default() -> DirTable {
        DirTable::new()
    }
}

impl DirTable {
    pub fn new() -> DirTable {
        DirTable {
            cwd: [DirContext::new(), DirContext::new()],
            current: DirKind::Root,
        }
    }

    pub fn current(&self) -> DirKind {
        self.current
    }

    /// Open "/" (always the root block, re-read unconditionally) or a name
    /// in the active directory. Only one Other may be open, and nothing can
    /// be opened while it is.
    pub fn open<D: DeviceDriver>(
        &mut self,
        device: &D,
        sb: &SuperBlock,
        name: &str,
    ) -> Result<(), FsError> {
        check_name(name)?;
        if self.current == DirKind::Other {
            return Err(FsError::InvalidState);
        }

        let disk_block = if name == "/" {
            sb.start_rotdir()
        } else {
            if !self.cwd[DirKind::Root as usize].open {
                return Err(FsError::NotADirectory);
            }
            let slot = self.find(name).ok_or(FsError::NotFound)?;
            let entry = self.cwd[self.current as usize].entries[slot];
            let ino = inode::read(device, sb, entry.inode)?;
            if ino.kind != InodeKind::Directory {
                return Err(FsError::NotADirectory);
            }
            self.current = DirKind::Other;
            sb.start_dt_area() + ino.start
        };

        let block = device.read_block(disk_block)?;
        let context = &mut self.cwd[self.current as usize];
        context.load(&block);
        context.open = true;
        context.cursor = 0;
        context.disk_block = disk_block;
        Ok(())
    }

    /// Flush the active context to disk and leave it. The name must match
    /// the active kind: "/" only closes Root, anything else only closes
    /// Other. Name equality beyond that is the caller's responsibility.
    pub fn close<D: DeviceDriver>(&mut self, device: &mut D, name: &str) -> Result<(), FsError> {
        check_name(name)?;
        let context = &self.cwd[self.current as usize];
        if !context.open {
            return Err(FsError::NotADirectory);
        }
        if (name == "/") != (self.current == DirKind::Root) {
            return Err(FsError::InvalidState);
        }

        device.write_block(context.disk_block, &context.store())?;
        match self.current {
            DirKind::Other => self.current = DirKind::Root,
            DirKind::Root => self.cwd[DirKind::Root as usize].open = false,
        }
        Ok(())
    }

    /// Put `name -> inode` into the first free slot. The inode itself is
    /// neither checked nor allocated here.
    pub fn create(&mut self, name: &str, inode: InodePointer) -> Result<(), FsError> {
        if !self.cwd[self.current as usize].open {
            return Err(FsError::NotADirectory);
        }
        check_name(name)?;
        if self.find(name).is_some() {
            return Err(FsError::AlreadyExists);
        }

        let context = &mut self.cwd[self.current as usize];
        let slot = context
            .entries
            .iter()
            .position(Dentry::is_free)
            .ok_or(FsError::NoSpace)?;
        context.entries[slot] = Dentry { name: pad_name(name), inode };
        Ok(())
    }

    /// Zero the entry and hand its inode number back; freeing the inode is
    /// the caller's job.
    pub fn delete(&mut self, name: &str) -> Result<InodePointer, FsError> {
        if !self.cwd[self.current as usize].open {
            return Err(FsError::NotADirectory);
        }
        check_name(name)?;
        let slot = self.find(name).ok_or(FsError::NotFound)?;

        let context = &mut self.cwd[self.current as usize];
        let inode = context.entries[slot].inode;
        context.entries[slot] = Dentry::EMPTY;
        Ok(inode)
    }

    /// Next valid entry at or after the cursor, or None once the block is
    /// exhausted. The reference aliases the in-memory block and dies at the
    /// next mutation.
    pub fn read_next(&mut self) -> Result<Option<&Dentry>, FsError> {
        let context = &mut self.cwd[self.current as usize];
        if !context.open {
            return Err(FsError::NotADirectory);
        }
        while context.cursor < DENTRIES_PER_BLOCK {
            let index = context.cursor;
            context.cursor += 1;
            if !context.entries[index].is_free() {
                return Ok(Some(&context.entries[index]));
            }
        }
        Ok(None)
    }

    pub fn rewind(&mut self) -> Result<(), FsError> {
        let context = &mut self.cwd[self.current as usize];
        if !context.open {
            return Err(FsError::NotADirectory);
        }
        context.cursor = 0;
        Ok(())
    }

    /// Debug dump of the active context's valid entries.
    pub fn log_dump(&self) -> Result<(), FsError> {
        let context = &self.cwd[self.current as usize];
        if !context.open {
            return Err(FsError::NotADirectory);
        }
        log::debug!("{:?} directory, block {}:", self.current, context.disk_block);
        for (index, entry) in context.entries.iter().enumerate() {
            if !entry.is_free() {
                log::debug!("  {:2}: {:4} {}", index, entry.name_str(), entry.inode);
            }
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<usize> {
        let want = pad_name(name);
        self.cwd[self.current as usize]
            .entries
            .iter()
            .position(|entry| entry.name == want)
    }
}

fn check_name(name: &str) -> Result<(), FsError> {
    if name.is_empty() || name.len() > FNAME_LENGTH {
        return Err(FsError::InvalidArgument);
    }
    Ok(())
}

fn pad_name(name: &str) -> [u8; FNAME_LENGTH] {
    let mut padded = [0; FNAME_LENGTH];
    padded[..name.len()].copy_from_slice(name.as_bytes());
    padded
}
