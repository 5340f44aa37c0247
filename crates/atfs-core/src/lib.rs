// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dirfd-relative filesystem emulation for absolute-path-only platforms
//!
//! Portable software written against the POSIX `*at()` family expects to
//! address files relative to an open directory descriptor. This crate makes
//! that work on a platform whose native filesystem API (modeled by the
//! [`NativeFs`] trait) only accepts absolute or process-relative paths: each
//! operation resolves its `(dirfd, relative name)` pair to an absolute path
//! via the platform's descriptor-to-path lookup and delegates to the plain
//! native primitive. `AT_FDCWD` and already-absolute paths bypass resolution
//! entirely.
//!
//! The companion [`AtFs::fdutimens`] family emulates nanosecond `utimensat`
//! semantics on top of a microsecond-resolution native time-setting call,
//! including the "now" and "omit" sentinels, expressed here as the
//! [`Timestamp`] enum.
//!
//! Resolved paths are point-in-time snapshots: a concurrent rename of an
//! ancestor directory between resolution and the native call can redirect
//! an operation. That race is inherent to the strategy and accepted, not
//! managed.

pub mod config;
mod dispatch;
mod error;
mod native;
mod resolve;
pub mod testing;
mod times;
mod types;

pub use config::AtConfig;
pub use dispatch::AtFs;
pub use error::{FsError, FsResult};
pub use native::{HostFs, NativeFs};
pub use types::{
    Metadata, Timespec, Timestamp, Timeval, AT_FDCWD, AT_REMOVEDIR, AT_SYMLINK_NOFOLLOW,
};
