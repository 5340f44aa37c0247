// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the dirfd emulation layer

use std::io;

/// Filesystem error type returned by every operation in this crate.
///
/// Native call failures are passed through unchanged; this layer never
/// reinterprets or masks them.
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("access denied")]
    AccessDenied,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("bad file descriptor")]
    BadFileDescriptor,
    #[error("operation not supported")]
    Unsupported,
    #[error("not implemented")]
    NotImplemented,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    /// Map a raw OS error number to the corresponding variant.
    ///
    /// Only exact one-to-one mappings are named; everything else is carried
    /// as [`FsError::Io`] so that [`FsError::errno`] round-trips.
    pub fn from_errno(errno: i32) -> Self {
        match errno {
            libc::ENOENT => FsError::NotFound,
            libc::EEXIST => FsError::AlreadyExists,
            libc::EACCES => FsError::AccessDenied,
            libc::EINVAL => FsError::InvalidArgument,
            libc::ENOTDIR => FsError::NotADirectory,
            libc::EISDIR => FsError::IsADirectory,
            libc::ENOTEMPTY => FsError::NotEmpty,
            libc::EBADF => FsError::BadFileDescriptor,
            libc::ENOTSUP => FsError::Unsupported,
            libc::ENOSYS => FsError::NotImplemented,
            other => FsError::Io(io::Error::from_raw_os_error(other)),
        }
    }

    /// Capture the thread's last OS error, as set by a failed native call.
    pub fn last_os_error() -> Self {
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(errno) => Self::from_errno(errno),
            None => FsError::Io(err),
        }
    }

    /// POSIX error number for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::AccessDenied => libc::EACCES,
            FsError::InvalidArgument => libc::EINVAL,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::BadFileDescriptor => libc::EBADF,
            FsError::Unsupported => libc::ENOTSUP,
            FsError::NotImplemented => libc::ENOSYS,
            FsError::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}
