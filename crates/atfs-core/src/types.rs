// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for the dirfd emulation layer

use serde::{Deserialize, Serialize};
use std::os::fd::RawFd;

/// Sentinel descriptor meaning "relative to the current working directory".
pub const AT_FDCWD: RawFd = libc::AT_FDCWD;

/// `unlinkat` flag selecting directory removal instead of file removal.
pub const AT_REMOVEDIR: i32 = libc::AT_REMOVEDIR;

/// Follow-symlink suppression flag on stat/chmod/timestamp operations.
///
/// Accepted but not honored; see [`AtConfig::strict_flags`] for the loud
/// alternative.
///
/// [`AtConfig::strict_flags`]: crate::AtConfig::strict_flags
pub const AT_SYMLINK_NOFOLLOW: i32 = libc::AT_SYMLINK_NOFOLLOW;

pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Nanosecond-resolution point in time (whole seconds plus fraction).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl Timespec {
    pub fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// Truncate to the microsecond resolution of the native time-setting
    /// primitive.
    pub fn to_timeval(self) -> Timeval {
        Timeval {
            sec: self.sec,
            usec: self.nsec / 1_000,
        }
    }
}

/// Microsecond-resolution time accepted by the native `utimes` primitive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeval {
    pub sec: i64,
    pub usec: i64,
}

/// One slot of a timestamp-setting request.
///
/// Slot 0 is the access time, slot 1 the modification time. The sentinel
/// cases replace the `UTIME_NOW`/`UTIME_OMIT` magic nanosecond values of the
/// C interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timestamp {
    /// Use the current time at the moment the request is applied.
    Now,
    /// Leave the recorded time unchanged.
    Omit,
    /// Set this concrete value. `nsec` must lie in `[0, 10^9)`.
    At(Timespec),
}

impl Timestamp {
    pub fn at(sec: i64, nsec: i64) -> Self {
        Self::At(Timespec::new(sec, nsec))
    }
}

/// File attributes as reported by the native stat primitives.
#[derive(Clone, Debug)]
pub struct Metadata {
    pub len: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub atime: Timespec,
    pub mtime: Timespec,
}
