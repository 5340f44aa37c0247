// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration for the dispatch layer

use serde::{Deserialize, Serialize};

/// Behavior knobs for [`AtFs`](crate::AtFs).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AtConfig {
    /// Unlink an existing `renameat` destination before renaming.
    ///
    /// The native rename primitive does not replace an existing destination,
    /// so POSIX rename-over semantics require a best-effort removal first.
    /// The removal opens a window in which a crash loses the destination
    /// with no replacement; turning this off trades that window for the
    /// native call's own failure on an existing destination.
    pub replace_on_rename: bool,

    /// Reject `AT_SYMLINK_NOFOLLOW` with `InvalidArgument` instead of
    /// silently ignoring it.
    ///
    /// The native surface offers no no-follow primitives, so the flag
    /// cannot be honored. The default keeps the historical accept-and-ignore
    /// behavior.
    pub strict_flags: bool,
}

impl Default for AtConfig {
    fn default() -> Self {
        Self {
            replace_on_rename: true,
            strict_flags: false,
        }
    }
}
