//! File contexts: per-handle state correlating create, I/O, cleanup and close.
//!
//! The dispatcher owns every [`FileContext`] through a [`HandleTable`]. A
//! backend only ever sees a borrowed [`FileInfo`], through which it may set the
//! opaque [`BackendToken`], `is_directory` and `delete_on_close`. All mutable
//! fields are atomics so concurrent requests on one handle need no lock.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::path::NormalizedPath;

/// Driver-assigned identity of an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque value a backend stores on a context.
///
/// The adapter never interprets, orders or does arithmetic on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendToken(u64);

impl BackendToken {
    /// Wrap a backend value. Zero is reserved for "no token".
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// I/O mode flags for one request. Read-only to backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoFlags {
    pub paging_io: bool,
    pub synchronous_io: bool,
    pub no_cache: bool,
    pub write_to_end_of_file: bool,
}

/// Per-request identity the driver attaches to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestInfo {
    pub handle: HandleId,
    pub process_id: u32,
    pub io: IoFlags,
}

impl RequestInfo {
    pub fn new(handle: u64) -> Self {
        Self {
            handle: HandleId(handle),
            process_id: 0,
            io: IoFlags::default(),
        }
    }

    pub fn process_id(mut self, pid: u32) -> Self {
        self.process_id = pid;
        self
    }

    pub fn paging_io(mut self) -> Self {
        self.io.paging_io = true;
        self
    }

    pub fn synchronous_io(mut self) -> Self {
        self.io.synchronous_io = true;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.io.no_cache = true;
        self
    }

    pub fn write_to_end_of_file(mut self) -> Self {
        self.io.write_to_end_of_file = true;
        self
    }
}

/// Where a handle is in its lifecycle. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum HandleState {
    Unopened = 0,
    Open = 1,
    CleanupRequested = 2,
    Closed = 3,
}

impl HandleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => HandleState::Unopened,
            1 => HandleState::Open,
            2 => HandleState::CleanupRequested,
            _ => HandleState::Closed,
        }
    }
}

/// State for one open handle.
#[derive(Debug)]
pub struct FileContext {
    path: NormalizedPath,
    process_id: u32,
    token: AtomicU64,
    is_directory: AtomicBool,
    delete_on_close: AtomicBool,
    state: AtomicU8,
}

impl FileContext {
    pub fn new(path: NormalizedPath, process_id: u32) -> Self {
        Self {
            path,
            process_id,
            token: AtomicU64::new(0),
            is_directory: AtomicBool::new(false),
            delete_on_close: AtomicBool::new(false),
            state: AtomicU8::new(HandleState::Unopened as u8),
        }
    }

    /// Path as normalized at open time.
    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    pub fn token(&self) -> Option<BackendToken> {
        BackendToken::new(self.token.load(Ordering::Acquire))
    }

    pub fn set_token(&self, token: BackendToken) {
        self.token.store(token.raw(), Ordering::Release);
    }

    /// Remove and return the token.
    pub fn take_token(&self) -> Option<BackendToken> {
        BackendToken::new(self.token.swap(0, Ordering::AcqRel))
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory.load(Ordering::Acquire)
    }

    pub fn set_is_directory(&self, value: bool) {
        self.is_directory.store(value, Ordering::Release);
    }

    pub fn delete_on_close(&self) -> bool {
        self.delete_on_close.load(Ordering::Acquire)
    }

    pub fn set_delete_on_close(&self, value: bool) {
        self.delete_on_close.store(value, Ordering::Release);
    }

    pub fn state(&self) -> HandleState {
        HandleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move the lifecycle forward. Earlier states are ignored.
    pub fn advance(&self, state: HandleState) {
        self.state.fetch_max(state as u8, Ordering::AcqRel);
    }
}

/// What a backend receives for a handle-bound request.
#[derive(Debug, Clone, Copy)]
pub struct FileInfo<'a> {
    context: &'a FileContext,
    /// Flags of the request being served.
    pub io: IoFlags,
}

impl<'a> FileInfo<'a> {
    pub fn new(context: &'a FileContext, io: IoFlags) -> Self {
        Self { context, io }
    }

    pub fn context(&self) -> &'a FileContext {
        self.context
    }
}

impl Deref for FileInfo<'_> {
    type Target = FileContext;

    fn deref(&self) -> &FileContext {
        self.context
    }
}

/// Live contexts keyed by handle.
#[derive(Debug, Default)]
pub struct HandleTable {
    contexts: RwLock<HashMap<HandleId, Arc<FileContext>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<HandleId, Arc<FileContext>>>> {
        self.contexts.read().map_err(|_| Error::poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<HandleId, Arc<FileContext>>>> {
        self.contexts.write().map_err(|_| Error::poisoned())
    }

    /// Return the context for `handle`, creating it with `make` if absent.
    pub fn open_with(
        &self,
        handle: HandleId,
        make: impl FnOnce() -> FileContext,
    ) -> Result<Arc<FileContext>> {
        let mut contexts = self.write()?;
        Ok(Arc::clone(
            contexts.entry(handle).or_insert_with(|| Arc::new(make())),
        ))
    }

    pub fn get(&self, handle: HandleId) -> Result<Option<Arc<FileContext>>> {
        Ok(self.read()?.get(&handle).cloned())
    }

    /// Drop the record for `handle`, returning it if it existed.
    pub fn discard(&self, handle: HandleId) -> Result<Option<Arc<FileContext>>> {
        Ok(self.write()?.remove(&handle))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
