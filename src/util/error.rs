use std::os::raw::c_int;

use thiserror::Error;

/// Error type shared by every component. Device failures pass through as
/// `Io`; everything else is a typed condition the caller can match on.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("directory not open")]
    NotADirectory,
    #[error("name is empty or longer than the entry limit")]
    InvalidArgument,
    #[error("an entry with that name already exists")]
    AlreadyExists,
    #[error("no entry with that name")]
    NotFound,
    #[error("no free run of the requested length")]
    NoSpace,
    #[error("index outside the bytemap range")]
    OutOfRange,
    #[error("entry already holds the requested value")]
    InvalidState,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// POSIX errno for this error, for callers that surface OS-style codes.
    pub fn errno(&self) -> c_int {
        match self {
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::InvalidArgument => libc::EINVAL,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotFound => libc::ENOENT,
            FsError::NoSpace => libc::ENOSPC,
            FsError::OutOfRange => libc::EFBIG,
            FsError::InvalidState => libc::EINVAL,
            FsError::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}
