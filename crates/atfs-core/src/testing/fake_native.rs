// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory fake of the native filesystem collaborator
//!
//! Behaves like the emulated platform's API: absolute paths only, a
//! non-replacing rename, microsecond time-setting, and a descriptor table
//! for the path lookup. Every call is recorded so tests can assert that a
//! primitive was never reached, and individual operations can be made to
//! fail on demand.

use std::collections::HashMap;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::types::{Metadata, Timespec, Timeval};

type ErrorFn = Arc<dyn Fn() -> FsError + Send + Sync>;

#[derive(Clone, Debug)]
enum Node {
    File {
        mode: u32,
        atime: Timespec,
        mtime: Timespec,
        content: Vec<u8>,
    },
    Dir {
        mode: u32,
        atime: Timespec,
        mtime: Timespec,
    },
    Symlink {
        target: PathBuf,
    },
}

struct State {
    nodes: HashMap<PathBuf, Node>,
    fds: HashMap<RawFd, PathBuf>,
    next_fd: RawFd,
    clock: Timespec,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, ErrorFn>,
}

pub struct FakeNativeFs {
    state: Mutex<State>,
}

impl Default for FakeNativeFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNativeFs {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node::Dir {
                mode: 0o755,
                atime: Timespec::default(),
                mtime: Timespec::default(),
            },
        );
        Self {
            state: Mutex::new(State {
                nodes,
                fds: HashMap::new(),
                next_fd: 100,
                clock: Timespec::new(1_000_000, 0),
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    // -- test setup --------------------------------------------------------

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let mut state = self.state.lock().unwrap();
        let clock = state.clock;
        state.nodes.insert(
            path.into(),
            Node::Dir {
                mode: 0o755,
                atime: clock,
                mtime: clock,
            },
        );
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let clock = state.clock;
        state.nodes.insert(
            path.into(),
            Node::File {
                mode: 0o644,
                atime: clock,
                mtime: clock,
                content: content.to_vec(),
            },
        );
    }

    pub fn add_symlink(&self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        let mut state = self.state.lock().unwrap();
        state.nodes.insert(
            path.into(),
            Node::Symlink {
                target: target.into(),
            },
        );
    }

    /// Register a descriptor for an existing directory and return it.
    pub fn open_dir(&self, path: impl Into<PathBuf>) -> RawFd {
        let mut state = self.state.lock().unwrap();
        let fd = state.next_fd;
        state.next_fd += 1;
        state.fds.insert(fd, path.into());
        fd
    }

    pub fn set_clock(&self, clock: Timespec) {
        self.state.lock().unwrap().clock = clock;
    }

    /// Make every subsequent call to `op` fail with the produced error.
    pub fn fail_op(&self, op: &'static str, error_fn: impl Fn() -> FsError + Send + Sync + 'static) {
        self.state.lock().unwrap().failures.insert(op, Arc::new(error_fn));
    }

    // -- test inspection ---------------------------------------------------

    pub fn call_count(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|&&c| c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn has_node(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().unwrap().nodes.contains_key(path.as_ref())
    }

    pub fn file_content(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(path.as_ref()) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn mode_of(&self, path: impl AsRef<Path>) -> Option<u32> {
        match self.state.lock().unwrap().nodes.get(path.as_ref()) {
            Some(Node::File { mode, .. }) | Some(Node::Dir { mode, .. }) => Some(*mode),
            _ => None,
        }
    }

    /// Recorded (atime, mtime) of a file or directory node.
    pub fn times_of(&self, path: impl AsRef<Path>) -> Option<(Timespec, Timespec)> {
        match self.state.lock().unwrap().nodes.get(path.as_ref()) {
            Some(Node::File { atime, mtime, .. }) | Some(Node::Dir { atime, mtime, .. }) => {
                Some((*atime, *mtime))
            }
            _ => None,
        }
    }

    // -- internals ---------------------------------------------------------

    fn enter(&self, op: &'static str) -> FsResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if let Some(error_fn) = state.failures.get(op) {
            return Err(error_fn());
        }
        Ok(())
    }

    fn parent_exists(state: &State, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                matches!(state.nodes.get(parent), Some(Node::Dir { .. }))
            }
            // Relative or rootless keys are accepted as-is; the fake is a
            // flat map, not a tree walker.
            _ => true,
        }
    }

    fn follow<'a>(state: &'a State, path: &Path) -> FsResult<(&'a Node, PathBuf)> {
        if path.as_os_str().is_empty() {
            return Err(FsError::NotFound);
        }
        match state.nodes.get(path) {
            Some(Node::Symlink { target }) => match state.nodes.get(target) {
                Some(node) => Ok((node, target.clone())),
                None => Err(FsError::NotFound),
            },
            Some(node) => Ok((node, path.to_path_buf())),
            None => Err(FsError::NotFound),
        }
    }

    fn metadata_of(node: &Node) -> Metadata {
        match node {
            Node::File {
                mode,
                atime,
                mtime,
                content,
            } => Metadata {
                len: content.len() as u64,
                mode: *mode | libc::S_IFREG as u32,
                uid: 0,
                gid: 0,
                is_dir: false,
                is_symlink: false,
                atime: *atime,
                mtime: *mtime,
            },
            Node::Dir { mode, atime, mtime } => Metadata {
                len: 0,
                mode: *mode | libc::S_IFDIR as u32,
                uid: 0,
                gid: 0,
                is_dir: true,
                is_symlink: false,
                atime: *atime,
                mtime: *mtime,
            },
            Node::Symlink { target } => Metadata {
                len: target.as_os_str().len() as u64,
                mode: 0o777 | libc::S_IFLNK as u32,
                uid: 0,
                gid: 0,
                is_dir: false,
                is_symlink: true,
                atime: Timespec::default(),
                mtime: Timespec::default(),
            },
        }
    }
}

impl NativeFs for FakeNativeFs {
    fn fd_path(&self, fd: RawFd) -> FsResult<PathBuf> {
        self.enter("fd_path")?;
        let state = self.state.lock().unwrap();
        state.fds.get(&fd).cloned().ok_or(FsError::BadFileDescriptor)
    }

    fn open(&self, path: &Path, flags: i32, mode: u32) -> FsResult<RawFd> {
        self.enter("open")?;
        let mut state = self.state.lock().unwrap();
        if path.as_os_str().is_empty() {
            return Err(FsError::NotFound);
        }
        let exists = state.nodes.contains_key(path);
        if exists {
            if flags & libc::O_CREAT != 0 && flags & libc::O_EXCL != 0 {
                return Err(FsError::AlreadyExists);
            }
        } else if flags & libc::O_CREAT != 0 {
            if !Self::parent_exists(&state, path) {
                return Err(FsError::NotFound);
            }
            let clock = state.clock;
            state.nodes.insert(
                path.to_path_buf(),
                Node::File {
                    mode,
                    atime: clock,
                    mtime: clock,
                    content: Vec::new(),
                },
            );
        } else {
            return Err(FsError::NotFound);
        }
        let fd = state.next_fd;
        state.next_fd += 1;
        state.fds.insert(fd, path.to_path_buf());
        Ok(fd)
    }

    fn unlink(&self, path: &Path) -> FsResult<()> {
        self.enter("unlink")?;
        let mut state = self.state.lock().unwrap();
        match state.nodes.get(path) {
            Some(Node::Dir { .. }) => return Err(FsError::IsADirectory),
            Some(_) => {}
            None => return Err(FsError::NotFound),
        }
        state.nodes.remove(path);
        Ok(())
    }

    fn rmdir(&self, path: &Path) -> FsResult<()> {
        self.enter("rmdir")?;
        let mut state = self.state.lock().unwrap();
        match state.nodes.get(path) {
            Some(Node::Dir { .. }) => {}
            Some(_) => return Err(FsError::NotADirectory),
            None => return Err(FsError::NotFound),
        }
        state.nodes.remove(path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        self.enter("rename")?;
        let mut state = self.state.lock().unwrap();
        // The emulated platform's rename does not replace an existing
        // destination; this is what forces the dispatch layer's pre-removal.
        if state.nodes.contains_key(to) {
            return Err(FsError::AlreadyExists);
        }
        match state.nodes.remove(from) {
            Some(node) => {
                state.nodes.insert(to.to_path_buf(), node);
                Ok(())
            }
            None => Err(FsError::NotFound),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> FsResult<()> {
        self.enter("symlink")?;
        let mut state = self.state.lock().unwrap();
        if link.as_os_str().is_empty() {
            return Err(FsError::NotFound);
        }
        if state.nodes.contains_key(link) {
            return Err(FsError::AlreadyExists);
        }
        state.nodes.insert(
            link.to_path_buf(),
            Node::Symlink {
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }

    fn mkdir(&self, path: &Path, mode: u32) -> FsResult<()> {
        self.enter("mkdir")?;
        let mut state = self.state.lock().unwrap();
        if path.as_os_str().is_empty() {
            return Err(FsError::NotFound);
        }
        if state.nodes.contains_key(path) {
            return Err(FsError::AlreadyExists);
        }
        if !Self::parent_exists(&state, path) {
            return Err(FsError::NotFound);
        }
        let clock = state.clock;
        state.nodes.insert(
            path.to_path_buf(),
            Node::Dir {
                mode,
                atime: clock,
                mtime: clock,
            },
        );
        Ok(())
    }

    fn readlink(&self, path: &Path) -> FsResult<PathBuf> {
        self.enter("readlink")?;
        let state = self.state.lock().unwrap();
        match state.nodes.get(path) {
            Some(Node::Symlink { target }) => Ok(target.clone()),
            Some(_) => Err(FsError::InvalidArgument),
            None => Err(FsError::NotFound),
        }
    }

    fn stat(&self, path: &Path) -> FsResult<Metadata> {
        self.enter("stat")?;
        let state = self.state.lock().unwrap();
        let (node, _) = Self::follow(&state, path)?;
        Ok(Self::metadata_of(node))
    }

    fn fstat(&self, fd: RawFd) -> FsResult<Metadata> {
        self.enter("fstat")?;
        let state = self.state.lock().unwrap();
        let path = state.fds.get(&fd).cloned().ok_or(FsError::BadFileDescriptor)?;
        let (node, _) = Self::follow(&state, &path)?;
        Ok(Self::metadata_of(node))
    }

    fn chmod(&self, path: &Path, new_mode: u32) -> FsResult<()> {
        self.enter("chmod")?;
        let mut state = self.state.lock().unwrap();
        let (_, real_path) = Self::follow(&state, path)?;
        match state.nodes.get_mut(&real_path) {
            Some(Node::File { mode, .. }) | Some(Node::Dir { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            _ => Err(FsError::NotFound),
        }
    }

    fn set_times(&self, path: &Path, times: Option<[Timeval; 2]>) -> FsResult<()> {
        self.enter("set_times")?;
        let mut state = self.state.lock().unwrap();
        let (_, real_path) = Self::follow(&state, path)?;
        let clock = state.clock;
        let (new_atime, new_mtime) = match times {
            Some([atime, mtime]) => (
                Timespec::new(atime.sec, atime.usec * 1_000),
                Timespec::new(mtime.sec, mtime.usec * 1_000),
            ),
            // Microsecond primitive sets "now" at its own resolution.
            None => (
                Timespec::new(clock.sec, clock.nsec / 1_000 * 1_000),
                Timespec::new(clock.sec, clock.nsec / 1_000 * 1_000),
            ),
        };
        match state.nodes.get_mut(&real_path) {
            Some(Node::File { atime, mtime, .. }) | Some(Node::Dir { atime, mtime, .. }) => {
                *atime = new_atime;
                *mtime = new_mtime;
                Ok(())
            }
            _ => Err(FsError::NotFound),
        }
    }

    fn now(&self) -> Timespec {
        self.state.lock().unwrap().clock
    }
}
