// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Timestamp normalization for `fdutimens`/`utimens`/`futimens`
//!
//! Emulates nanosecond `utimensat` semantics (including the "now" and
//! "omit" sentinels) on top of a native time-setting primitive that only
//! accepts microsecond-resolution absolute values. Sentinels are resolved
//! against the file's current metadata and the clock before the single
//! native call; the conversion to microseconds truncates.

use std::os::fd::RawFd;
use std::path::Path;
use tracing::trace;

use crate::dispatch::AtFs;
use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::types::{Metadata, Timespec, Timestamp, Timeval, NANOS_PER_SEC};

/// Terminal state of a timestamp pair after sentinel resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Normalized {
    /// Both slots were "omit": the whole request is a no-op.
    Noop,
    /// Set both times to the current time, letting the native primitive
    /// sample its own clock. Used when no pair was given and when both
    /// slots were "now"; passing explicit values instead would trip
    /// platform permission quirks tied to them.
    SetToNow,
    /// Concrete access and modification times, already truncated to the
    /// native resolution.
    Set([Timeval; 2]),
}

/// Reject any concrete slot whose fraction falls outside `[0, 10^9)`.
///
/// Runs before any native call so that invalid requests have no partial
/// effect.
pub(crate) fn validate(times: &Option<[Timestamp; 2]>) -> FsResult<()> {
    let Some(times) = times else {
        return Ok(());
    };
    for slot in times {
        if let Timestamp::At(t) = slot {
            if t.nsec < 0 || t.nsec >= NANOS_PER_SEC {
                return Err(FsError::InvalidArgument);
            }
        }
    }
    Ok(())
}

/// Resolve sentinels into the terminal pair state.
///
/// `fetch_meta` is consulted only when a slot is "omit" and the pair is not
/// the all-omit no-op; "now" substitution needs only the clock.
pub(crate) fn normalize<F>(
    times: Option<[Timestamp; 2]>,
    fetch_meta: F,
    now: impl Fn() -> Timespec,
) -> FsResult<Normalized>
where
    F: FnOnce() -> FsResult<Metadata>,
{
    let Some(times) = times else {
        return Ok(Normalized::SetToNow);
    };
    match times {
        [Timestamp::Omit, Timestamp::Omit] => return Ok(Normalized::Noop),
        [Timestamp::Now, Timestamp::Now] => return Ok(Normalized::SetToNow),
        _ => {}
    }

    let meta = if times.iter().any(|slot| matches!(slot, Timestamp::Omit)) {
        Some(fetch_meta()?)
    } else {
        None
    };

    let mut out = [Timeval::default(); 2];
    for (i, slot) in times.iter().enumerate() {
        let ts = match slot {
            Timestamp::At(t) => *t,
            Timestamp::Now => now(),
            Timestamp::Omit => {
                let meta = meta.as_ref().ok_or(FsError::InvalidArgument)?;
                if i == 0 {
                    meta.atime
                } else {
                    meta.mtime
                }
            }
        };
        out[i] = ts.to_timeval();
    }
    Ok(Normalized::Set(out))
}

impl<N: NativeFs> AtFs<N> {
    /// Set timestamps through a descriptor, a path, or both.
    ///
    /// The native surface has no working descriptor-based time-setting
    /// primitive, so a request that must touch the file and carries no path
    /// fails with `NotImplemented`. An all-omit pair still succeeds without
    /// any native call.
    pub fn fdutimens(
        &self,
        fd: Option<RawFd>,
        path: Option<&Path>,
        times: Option<[Timestamp; 2]>,
    ) -> FsResult<()> {
        validate(&times)?;
        if fd.is_none() && path.is_none() {
            return Err(FsError::BadFileDescriptor);
        }

        let fetch_meta = || match fd {
            Some(fd) => self.native.fstat(fd),
            None => match path {
                Some(p) => self.native.stat(p),
                None => Err(FsError::BadFileDescriptor),
            },
        };
        let normalized = normalize(times, fetch_meta, || self.native.now())?;

        match normalized {
            Normalized::Noop => {
                trace!("both timestamp slots omitted, nothing to do");
                Ok(())
            }
            Normalized::SetToNow => match path {
                Some(p) => self.native.set_times(p, None),
                None => Err(FsError::NotImplemented),
            },
            Normalized::Set(pair) => match path {
                Some(p) => self.native.set_times(p, Some(pair)),
                None => Err(FsError::NotImplemented),
            },
        }
    }

    /// Path-based timestamp setting.
    pub fn utimens(&self, path: &Path, times: Option<[Timestamp; 2]>) -> FsResult<()> {
        self.fdutimens(None, Some(path), times)
    }

    /// Descriptor-based timestamp setting.
    ///
    /// Only the all-omit no-op can succeed; see [`AtFs::fdutimens`].
    pub fn futimens(&self, fd: RawFd, times: Option<[Timestamp; 2]>) -> FsResult<()> {
        self.fdutimens(Some(fd), None, times)
    }
}
