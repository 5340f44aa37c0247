// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The `*at()` operation surface
//!
//! One method per POSIX `*at()` call. Each inspects its descriptor and path
//! arguments: if the descriptor is `AT_FDCWD` or the path is already
//! absolute, the plain native primitive is invoked on the path unchanged;
//! otherwise the path is resolved first. Results and errors from the native
//! layer are returned verbatim.

use std::borrow::Cow;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::AtConfig;
use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::resolve::{is_absolute, resolve_at};
use crate::types::{Metadata, Timestamp, AT_FDCWD, AT_REMOVEDIR, AT_SYMLINK_NOFOLLOW};

/// Dirfd-relative filesystem operations over a native absolute-path API.
pub struct AtFs<N: NativeFs> {
    pub(crate) native: N,
    config: AtConfig,
}

impl<N: NativeFs> AtFs<N> {
    pub fn new(native: N) -> Self {
        Self::with_config(native, AtConfig::default())
    }

    pub fn with_config(native: N, config: AtConfig) -> Self {
        Self { native, config }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    /// Absolute target for `(dirfd, path)`.
    ///
    /// Fast path: `AT_FDCWD` or an already-absolute path is passed through
    /// untouched (the descriptor is then ignored entirely, even if it is
    /// invalid). Everything else goes through the resolver and yields an
    /// owned path whose lifetime ends with the calling operation.
    fn target<'p>(&self, dirfd: RawFd, path: &'p Path) -> FsResult<Cow<'p, Path>> {
        if dirfd == AT_FDCWD || is_absolute(path) {
            trace!(dirfd, path = %path.display(), "fast path, no resolution");
            return Ok(Cow::Borrowed(path));
        }
        resolve_at(&self.native, dirfd, path).map(Cow::Owned)
    }

    fn check_flags(&self, flags: i32) -> FsResult<()> {
        if flags & AT_SYMLINK_NOFOLLOW != 0 {
            if self.config.strict_flags {
                return Err(FsError::InvalidArgument);
            }
            // No no-follow primitives on the native surface; the flag is
            // accepted and ignored.
            debug!("AT_SYMLINK_NOFOLLOW ignored: native surface always follows symlinks");
        }
        Ok(())
    }

    pub fn openat(&self, dirfd: RawFd, path: &Path, flags: i32, mode: u32) -> FsResult<RawFd> {
        let target = self.target(dirfd, path)?;
        self.native.open(&target, flags, mode)
    }

    pub fn unlinkat(&self, dirfd: RawFd, path: &Path, flags: i32) -> FsResult<()> {
        let target = self.target(dirfd, path)?;
        if flags & AT_REMOVEDIR != 0 {
            self.native.rmdir(&target)
        } else {
            self.native.unlink(&target)
        }
    }

    /// Rename with both endpoints independently dirfd-relative.
    ///
    /// The native rename does not replace an existing destination, so the
    /// destination is unlinked first as a best-effort step; its own failure
    /// is ignored because the rename reports the definitive error.
    pub fn renameat(
        &self,
        olddirfd: RawFd,
        oldpath: &Path,
        newdirfd: RawFd,
        newpath: &Path,
    ) -> FsResult<()> {
        let from = self.target(olddirfd, oldpath)?;
        let to = self.target(newdirfd, newpath)?;
        if self.config.replace_on_rename {
            if let Err(err) = self.native.unlink(&to) {
                trace!(error = %err, to = %to.display(), "pre-removal of rename destination failed");
            }
        }
        self.native.rename(&from, &to)
    }

    /// Create a symlink at `(newdirfd, linkpath)` pointing to `target`.
    ///
    /// Only the link location is resolved; the target string is stored
    /// untouched, exactly as given.
    pub fn symlinkat(&self, target: &Path, newdirfd: RawFd, linkpath: &Path) -> FsResult<()> {
        let link = self.target(newdirfd, linkpath)?;
        self.native.symlink(target, &link)
    }

    pub fn mkdirat(&self, dirfd: RawFd, path: &Path, mode: u32) -> FsResult<()> {
        let target = self.target(dirfd, path)?;
        self.native.mkdir(&target, mode)
    }

    pub fn readlinkat(&self, dirfd: RawFd, path: &Path) -> FsResult<PathBuf> {
        let target = self.target(dirfd, path)?;
        self.native.readlink(&target)
    }

    /// Hard links do not exist on the emulated platform; this always fails.
    pub fn linkat(
        &self,
        _olddirfd: RawFd,
        _oldpath: &Path,
        _newdirfd: RawFd,
        _newpath: &Path,
        _flags: i32,
    ) -> FsResult<()> {
        Err(FsError::Unsupported)
    }

    pub fn fstatat(&self, dirfd: RawFd, path: &Path, flags: i32) -> FsResult<Metadata> {
        self.check_flags(flags)?;
        let target = self.target(dirfd, path)?;
        self.native.stat(&target)
    }

    pub fn fchmodat(&self, dirfd: RawFd, path: &Path, mode: u32, flags: i32) -> FsResult<()> {
        self.check_flags(flags)?;
        let target = self.target(dirfd, path)?;
        self.native.chmod(&target, mode)
    }

    pub fn utimensat(
        &self,
        dirfd: RawFd,
        path: &Path,
        times: Option<[Timestamp; 2]>,
        flags: i32,
    ) -> FsResult<()> {
        self.check_flags(flags)?;
        let target = self.target(dirfd, path)?;
        self.fdutimens(None, Some(&target), times)
    }
}
