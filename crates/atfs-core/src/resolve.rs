// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path resolution for dirfd-relative operations
//!
//! Converts `(directory descriptor, relative name)` pairs into absolute
//! paths usable by the native API. The resolved path is a point-in-time
//! snapshot: a concurrent rename of an ancestor directory between
//! resolution and the subsequent native call can redirect the operation.
//! That race is inherent to the strategy and accepted.

use std::ffi::OsString;
use std::os::fd::RawFd;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::FsResult;
use crate::native::NativeFs;

/// Absolute-path rule of the emulated platform: a leading separator, or a
/// drive-letter separator in the second byte.
pub(crate) fn is_absolute(path: &Path) -> bool {
    let bytes = path.as_os_str().as_bytes();
    bytes.first() == Some(&b'/') || bytes.get(1) == Some(&b':')
}

/// Resolve `name` relative to the directory behind `dirfd`.
///
/// An empty `name` yields an empty path without consulting the descriptor
/// lookup; the subsequent native call then reports not-found, matching the
/// kernel's treatment of an empty path operand.
pub(crate) fn resolve_at<N: NativeFs>(native: &N, dirfd: RawFd, name: &Path) -> FsResult<PathBuf> {
    if name.as_os_str().is_empty() {
        return Ok(PathBuf::new());
    }

    let dir = native.fd_path(dirfd)?;

    // Byte-level join: `PathBuf::push` would discard `dir` for a rooted
    // name, which must never happen here (rooted names take the dispatch
    // fast path and bypass resolution entirely).
    let mut joined = dir.into_os_string().into_vec();
    joined.push(b'/');
    joined.extend_from_slice(name.as_os_str().as_bytes());
    let resolved = PathBuf::from(OsString::from_vec(joined));
    trace!(dirfd, resolved = %resolved.display(), "resolved dirfd-relative path");
    Ok(resolved)
}
