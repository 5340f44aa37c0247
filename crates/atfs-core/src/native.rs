// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Native filesystem collaborator interface
//!
//! The emulated platform's filesystem API only accepts absolute or
//! process-relative paths. [`NativeFs`] models exactly that surface: plain
//! path-based primitives, a descriptor-to-path lookup, and a clock. The
//! dispatch layer owns no descriptor lifetime and performs every operation
//! through this trait.

use std::ffi::{CString, OsString};
use std::mem::MaybeUninit;
use std::os::fd::RawFd;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{FsError, FsResult};
use crate::types::{Metadata, Timespec, Timeval};

/// The native absolute-path filesystem API plus its descriptor lookup and
/// clock source.
#[cfg_attr(test, mockall::automock)]
pub trait NativeFs: Send + Sync {
    /// Absolute path backing an open directory descriptor.
    fn fd_path(&self, fd: RawFd) -> FsResult<PathBuf>;

    fn open(&self, path: &Path, flags: i32, mode: u32) -> FsResult<RawFd>;

    fn unlink(&self, path: &Path) -> FsResult<()>;

    fn rmdir(&self, path: &Path) -> FsResult<()>;

    fn rename(&self, from: &Path, to: &Path) -> FsResult<()>;

    /// Create a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> FsResult<()>;

    fn mkdir(&self, path: &Path, mode: u32) -> FsResult<()>;

    /// Read a symlink's target as an owned path.
    fn readlink(&self, path: &Path) -> FsResult<PathBuf>;

    fn stat(&self, path: &Path) -> FsResult<Metadata>;

    fn fstat(&self, fd: RawFd) -> FsResult<Metadata>;

    fn chmod(&self, path: &Path, mode: u32) -> FsResult<()>;

    /// Set access and modification times. `None` means "current time for
    /// both"; the primitive's resolution is microseconds.
    fn set_times(&self, path: &Path, times: Option<[Timeval; 2]>) -> FsResult<()>;

    /// Current wall-clock time.
    fn now(&self) -> Timespec;
}

/// [`NativeFs`] backed by the host's absolute-path libc calls.
///
/// This is the production stand-in for the emulated platform's native API.
/// The descriptor lookup reads `/proc/self/fd` and is therefore only wired
/// up on Linux.
#[derive(Debug, Default)]
pub struct HostFs;

impl HostFs {
    pub fn new() -> Self {
        Self
    }

    fn cstr(path: &Path) -> FsResult<CString> {
        CString::new(path.as_os_str().as_bytes()).map_err(|_| FsError::InvalidArgument)
    }

    #[cfg(target_os = "linux")]
    fn fd_path_impl(fd: RawFd) -> FsResult<PathBuf> {
        match std::fs::read_link(format!("/proc/self/fd/{fd}")) {
            Ok(path) => Ok(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::BadFileDescriptor)
            }
            Err(err) => Err(FsError::Io(err)),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn fd_path_impl(_fd: RawFd) -> FsResult<PathBuf> {
        Err(FsError::NotImplemented)
    }
}

fn check(rc: libc::c_int) -> FsResult<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(FsError::last_os_error())
    }
}

fn metadata_from_stat(st: &libc::stat) -> Metadata {
    let mode = st.st_mode as u32;
    let fmt = mode & libc::S_IFMT as u32;
    Metadata {
        len: st.st_size as u64,
        mode,
        uid: st.st_uid,
        gid: st.st_gid,
        is_dir: fmt == libc::S_IFDIR as u32,
        is_symlink: fmt == libc::S_IFLNK as u32,
        atime: Timespec::new(st.st_atime as i64, st.st_atime_nsec as i64),
        mtime: Timespec::new(st.st_mtime as i64, st.st_mtime_nsec as i64),
    }
}

impl NativeFs for HostFs {
    fn fd_path(&self, fd: RawFd) -> FsResult<PathBuf> {
        if fd < 0 {
            return Err(FsError::BadFileDescriptor);
        }
        Self::fd_path_impl(fd)
    }

    fn open(&self, path: &Path, flags: i32, mode: u32) -> FsResult<RawFd> {
        let c = Self::cstr(path)?;
        let fd = unsafe { libc::open(c.as_ptr(), flags, mode as libc::c_uint) };
        if fd < 0 {
            return Err(FsError::last_os_error());
        }
        Ok(fd)
    }

    fn unlink(&self, path: &Path) -> FsResult<()> {
        let c = Self::cstr(path)?;
        check(unsafe { libc::unlink(c.as_ptr()) })
    }

    fn rmdir(&self, path: &Path) -> FsResult<()> {
        let c = Self::cstr(path)?;
        check(unsafe { libc::rmdir(c.as_ptr()) })
    }

    fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        let from_c = Self::cstr(from)?;
        let to_c = Self::cstr(to)?;
        check(unsafe { libc::rename(from_c.as_ptr(), to_c.as_ptr()) })
    }

    fn symlink(&self, target: &Path, link: &Path) -> FsResult<()> {
        let target_c = Self::cstr(target)?;
        let link_c = Self::cstr(link)?;
        check(unsafe { libc::symlink(target_c.as_ptr(), link_c.as_ptr()) })
    }

    fn mkdir(&self, path: &Path, mode: u32) -> FsResult<()> {
        let c = Self::cstr(path)?;
        check(unsafe { libc::mkdir(c.as_ptr(), mode as libc::mode_t) })
    }

    fn readlink(&self, path: &Path) -> FsResult<PathBuf> {
        let c = Self::cstr(path)?;
        let mut buf = vec![0u8; 256];
        loop {
            let n = unsafe { libc::readlink(c.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
            if n < 0 {
                return Err(FsError::last_os_error());
            }
            let n = n as usize;
            if n < buf.len() {
                buf.truncate(n);
                return Ok(PathBuf::from(OsString::from_vec(buf)));
            }
            // Target may have been truncated; retry with a larger buffer.
            let doubled = buf.len() * 2;
            buf.resize(doubled, 0);
        }
    }

    fn stat(&self, path: &Path) -> FsResult<Metadata> {
        let c = Self::cstr(path)?;
        let mut st = MaybeUninit::<libc::stat>::uninit();
        if unsafe { libc::stat(c.as_ptr(), st.as_mut_ptr()) } != 0 {
            return Err(FsError::last_os_error());
        }
        let st = unsafe { st.assume_init() };
        Ok(metadata_from_stat(&st))
    }

    fn fstat(&self, fd: RawFd) -> FsResult<Metadata> {
        let mut st = MaybeUninit::<libc::stat>::uninit();
        if unsafe { libc::fstat(fd, st.as_mut_ptr()) } != 0 {
            return Err(FsError::last_os_error());
        }
        let st = unsafe { st.assume_init() };
        Ok(metadata_from_stat(&st))
    }

    fn chmod(&self, path: &Path, mode: u32) -> FsResult<()> {
        let c = Self::cstr(path)?;
        check(unsafe { libc::chmod(c.as_ptr(), mode as libc::mode_t) })
    }

    fn set_times(&self, path: &Path, times: Option<[Timeval; 2]>) -> FsResult<()> {
        let c = Self::cstr(path)?;
        let rc = match times {
            Some([atime, mtime]) => {
                let tv = [
                    libc::timeval {
                        tv_sec: atime.sec as libc::time_t,
                        tv_usec: atime.usec as libc::suseconds_t,
                    },
                    libc::timeval {
                        tv_sec: mtime.sec as libc::time_t,
                        tv_usec: mtime.usec as libc::suseconds_t,
                    },
                ];
                unsafe { libc::utimes(c.as_ptr(), tv.as_ptr()) }
            }
            None => unsafe { libc::utimes(c.as_ptr(), std::ptr::null()) },
        };
        check(rc)
    }

    fn now(&self) -> Timespec {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Timespec::new(d.as_secs() as i64, d.subsec_nanos() as i64),
            Err(_) => Timespec::default(),
        }
    }
}
