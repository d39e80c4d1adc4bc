//! In-memory backend

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use enumset::EnumSet;

use crate::backend::{apply_disposition, CreateRequest, FileSystem};
use crate::context::{BackendToken, FileInfo};
use crate::error::{Error, Result};
use crate::flags::FileAttribute;
use crate::path::{normalize, NormalizedPath};
use crate::types::{FileMetadata, FileTime, FileTimes, StreamInfo};
use crate::wildcard::WildcardPattern;

const ROOT: &str = "/";

/// Default cap on a single file's size (256 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// In-memory backend.
///
/// Stores every entry in a map keyed by its path without trailing separator.
/// Tokens handed to contexts index a table of open handles, so
/// [`MemoryFs::open_handle_count`] shows what close has not yet released.
///
/// Files never grow past [`MemoryFs::max_file_size`]; a write or resize
/// beyond it fails instead of allocating.
pub struct MemoryFs {
    entries: RwLock<HashMap<String, Entry>>,
    open: Mutex<HashMap<u64, String>>,
    locks: Mutex<Vec<RangeLock>>,
    next_token: AtomicU64,
    next_index: AtomicU64,
    max_file_size: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: EntryKind,
    attributes: EnumSet<FileAttribute>,
    creation: FileTime,
    last_access: FileTime,
    last_write: FileTime,
    index: u64,
    security: Vec<u8>,
}

#[derive(Debug, Clone)]
enum EntryKind {
    File {
        data: Vec<u8>,
        streams: BTreeMap<String, Vec<u8>>,
    },
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeLock {
    path: String,
    offset: u64,
    length: u64,
    owner: Option<BackendToken>,
}

impl RangeLock {
    fn overlaps(&self, offset: u64, length: u64) -> bool {
        let end = self.offset.saturating_add(self.length);
        let other_end = offset.saturating_add(length);
        self.offset < other_end && offset < end
    }
}

impl Entry {
    fn new(kind: EntryKind, attributes: EnumSet<FileAttribute>, index: u64) -> Self {
        let now = FileTime::now();
        let mut entry = Self {
            kind,
            attributes,
            creation: now,
            last_access: now,
            last_write: now,
            index,
            security: Vec::new(),
        };
        entry.attributes = entry.fix_attributes(attributes);
        entry
    }

    fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Keep the directory bit in sync with the entry kind; `Normal` only
    /// stands alone.
    fn fix_attributes(&self, attributes: EnumSet<FileAttribute>) -> EnumSet<FileAttribute> {
        let mut attributes = attributes;
        if self.is_dir() {
            attributes.insert(FileAttribute::Directory);
        } else {
            attributes.remove(FileAttribute::Directory);
        }
        attributes.remove(FileAttribute::Normal);
        if attributes.is_empty() {
            attributes.insert(FileAttribute::Normal);
        }
        attributes
    }

    fn size(&self) -> u64 {
        match &self.kind {
            EntryKind::File { data, .. } => data.len() as u64,
            EntryKind::Directory => 0,
        }
    }

    fn metadata(&self, name: &str) -> FileMetadata {
        FileMetadata {
            name: name.to_string(),
            attributes: self.attributes,
            creation_time: self.creation,
            last_access_time: self.last_access,
            last_write_time: self.last_write,
            size: self.size(),
            file_index: self.index,
            volume_serial_number: 0,
            number_of_links: 1,
        }
    }
}

fn key(path: &NormalizedPath) -> String {
    path.trimmed().to_string()
}

fn parent_key(key: &str) -> Option<&str> {
    if key == ROOT {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&key[..idx]),
        None => None,
    }
}

fn name_of(key: &str) -> &str {
    if key == ROOT {
        return ROOT;
    }
    key.rsplit('/').next().unwrap_or(key)
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidParameter(format!("{value} out of range")))
}

/// Zero-extend `data` to `len` bytes without aborting on allocation failure.
fn grow(data: &mut Vec<u8>, len: usize) -> Result<()> {
    if len > data.len() {
        data.try_reserve_exact(len - data.len())
            .map_err(|err| Error::WriteFault(err.to_string()))?;
        data.resize(len, 0);
    }
    Ok(())
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create an empty volume containing only the root directory.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            ROOT.to_string(),
            Entry::new(EntryKind::Directory, EnumSet::new(), 1),
        );
        Self {
            entries: RwLock::new(entries),
            open: Mutex::new(HashMap::new()),
            locks: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
            next_index: AtomicU64::new(2),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set the largest size a file may reach through writes or resizes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn check_size(&self, path: &NormalizedPath, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(Error::WriteFault(format!(
                "{path}: size {size} exceeds limit {}",
                self.max_file_size
            )));
        }
        Ok(())
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, raw: &str) -> Result<()> {
        let path = normalize(raw)?;
        let mut entries = self.entries_mut()?;
        self.ensure_dirs(&mut entries, &key(&path))
    }

    /// Create or replace a file, creating missing parent directories.
    pub fn add_file(&self, raw: &str, data: &[u8]) -> Result<()> {
        let path = normalize(raw)?;
        let key = key(&path);
        let mut entries = self.entries_mut()?;
        if let Some(parent) = parent_key(&key) {
            self.ensure_dirs(&mut entries, parent)?;
        }
        if entries.get(&key).is_some_and(Entry::is_dir) {
            return Err(Error::IsADirectory(key));
        }
        let entry = Entry::new(
            EntryKind::File {
                data: data.to_vec(),
                streams: BTreeMap::new(),
            },
            EnumSet::new(),
            self.allocate_index(),
        );
        entries.insert(key, entry);
        Ok(())
    }

    /// Attach a named data stream to an existing file.
    pub fn add_stream(&self, raw: &str, name: &str, data: &[u8]) -> Result<()> {
        let path = normalize(raw)?;
        let key = key(&path);
        let mut entries = self.entries_mut()?;
        match entries.get_mut(&key).map(|e| &mut e.kind) {
            Some(EntryKind::File { streams, .. }) => {
                streams.insert(name.to_string(), data.to_vec());
                Ok(())
            }
            Some(EntryKind::Directory) => Err(Error::IsADirectory(key)),
            None => Err(Error::not_found(key)),
        }
    }

    /// Current contents of a file.
    pub fn contents(&self, raw: &str) -> Option<Vec<u8>> {
        let path = normalize(raw).ok()?;
        let entries = self.entries.read().ok()?;
        match &entries.get(&key(&path))?.kind {
            EntryKind::File { data, .. } => Some(data.clone()),
            EntryKind::Directory => None,
        }
    }

    /// Handles that were created but not yet closed.
    pub fn open_handle_count(&self) -> usize {
        self.open.lock().map(|open| open.len()).unwrap_or(0)
    }

    fn entries(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>> {
        self.entries.read().map_err(|_| Error::poisoned())
    }

    fn entries_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>> {
        self.entries.write().map_err(|_| Error::poisoned())
    }

    fn locks(&self) -> Result<MutexGuard<'_, Vec<RangeLock>>> {
        self.locks.lock().map_err(|_| Error::poisoned())
    }

    fn allocate_index(&self) -> u64 {
        self.next_index.fetch_add(1, Ordering::Relaxed)
    }

    fn ensure_dirs(&self, entries: &mut HashMap<String, Entry>, key: &str) -> Result<()> {
        match entries.get(key) {
            Some(entry) if entry.is_dir() => return Ok(()),
            Some(_) => return Err(Error::NotADirectory(key.to_string())),
            None => {}
        }
        if let Some(parent) = parent_key(key) {
            self.ensure_dirs(entries, parent)?;
        }
        entries.insert(
            key.to_string(),
            Entry::new(EntryKind::Directory, EnumSet::new(), self.allocate_index()),
        );
        Ok(())
    }

    fn insert_new(
        &self,
        path: &NormalizedPath,
        kind: EntryKind,
        attributes: EnumSet<FileAttribute>,
    ) -> Result<()> {
        let key = key(path);
        let mut entries = self.entries_mut()?;
        if entries.contains_key(&key) {
            return Err(Error::AlreadyExists(key));
        }
        let parent = parent_key(&key).ok_or_else(|| Error::AlreadyExists(key.clone()))?;
        match entries.get(parent) {
            Some(entry) if entry.is_dir() => {}
            Some(_) => return Err(Error::NotADirectory(parent.to_string())),
            None => return Err(Error::not_found(parent)),
        }
        let entry = Entry::new(kind, attributes, self.allocate_index());
        entries.insert(key, entry);
        Ok(())
    }

    /// Run `f` on the file at `path`, refusing directories.
    fn with_file_mut<T>(
        &self,
        path: &NormalizedPath,
        f: impl FnOnce(&mut Vec<u8>, &mut Entry) -> Result<T>,
    ) -> Result<T> {
        let key = key(path);
        let mut entries = self.entries_mut()?;
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(key.as_str()))?;
        let mut data = match &mut entry.kind {
            EntryKind::File { data, .. } => std::mem::take(data),
            EntryKind::Directory => return Err(Error::IsADirectory(key)),
        };
        let result = f(&mut data, &mut *entry);
        if let EntryKind::File { data: slot, .. } = &mut entry.kind {
            *slot = data;
        }
        result
    }

    fn with_entry_mut<T>(
        &self,
        path: &NormalizedPath,
        f: impl FnOnce(&mut Entry) -> T,
    ) -> Result<T> {
        let key = key(path);
        let mut entries = self.entries_mut()?;
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(key.as_str()))?;
        Ok(f(entry))
    }

    fn release_locks(&self, token: Option<BackendToken>) -> Result<()> {
        if token.is_some() {
            self.locks()?.retain(|lock| lock.owner != token);
        }
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn create(&self, path: &NormalizedPath, request: &CreateRequest, info: &FileInfo<'_>) -> Result<()> {
        let existing = self.entries()?.get(&key(path)).map(Entry::is_dir);
        match existing {
            Some(true) if request.wants_file() => return Err(Error::IsADirectory(key(path))),
            Some(false) if request.wants_directory() => {
                return Err(Error::NotADirectory(key(path)))
            }
            _ => {}
        }
        let directory = existing.unwrap_or_else(|| request.wants_directory());

        apply_disposition(self, path, request, directory)?;

        info.set_is_directory(directory);
        let raw = self.next_token.fetch_add(1, Ordering::Relaxed);
        if let Some(token) = BackendToken::new(raw) {
            self.open
                .lock()
                .map_err(|_| Error::poisoned())?
                .insert(token.raw(), key(path));
            info.set_token(token);
        }
        Ok(())
    }

    fn path_exists(&self, path: &NormalizedPath) -> Result<bool> {
        Ok(self.entries()?.contains_key(&key(path)))
    }

    fn find_files_with_pattern(
        &self,
        path: &NormalizedPath,
        pattern: &WildcardPattern,
        _info: &FileInfo<'_>,
    ) -> Result<Vec<FileMetadata>> {
        let dir = key(path);
        let entries = self.entries()?;
        match entries.get(&dir) {
            Some(entry) if entry.is_dir() => {}
            Some(_) => return Err(Error::NotADirectory(dir)),
            None => return Err(Error::not_found(dir)),
        }

        let mut found: Vec<FileMetadata> = entries
            .iter()
            .filter(|(child, _)| parent_key(child) == Some(dir.as_str()))
            .map(|(child, entry)| entry.metadata(name_of(child)))
            // Loose pre-filter; the dispatcher applies the volume's case mode.
            .filter(|meta| pattern.matches(&meta.name, false))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    fn find_streams(&self, path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<Vec<StreamInfo>> {
        let key = key(path);
        let entries = self.entries()?;
        match entries.get(&key).map(|e| &e.kind) {
            Some(EntryKind::File { data, streams }) => {
                let mut out = vec![StreamInfo {
                    name: "::$DATA".to_string(),
                    size: data.len() as u64,
                }];
                out.extend(streams.iter().map(|(name, bytes)| StreamInfo {
                    name: format!(":{name}:$DATA"),
                    size: bytes.len() as u64,
                }));
                Ok(out)
            }
            Some(EntryKind::Directory) => Ok(Vec::new()),
            None => Err(Error::not_found(key)),
        }
    }

    fn lock(&self, path: &NormalizedPath, offset: u64, length: u64, info: &FileInfo<'_>) -> Result<()> {
        let key = key(path);
        if !self.path_exists(path)? {
            return Err(Error::not_found(key));
        }
        let owner = info.token();
        let mut locks = self.locks()?;
        if locks
            .iter()
            .any(|lock| lock.path == key && lock.owner != owner && lock.overlaps(offset, length))
        {
            return Err(Error::LockConflict(key));
        }
        locks.push(RangeLock {
            path: key,
            offset,
            length,
            owner,
        });
        Ok(())
    }

    fn unlock(&self, path: &NormalizedPath, offset: u64, length: u64, info: &FileInfo<'_>) -> Result<()> {
        let wanted = RangeLock {
            path: key(path),
            offset,
            length,
            owner: info.token(),
        };
        let mut locks = self.locks()?;
        match locks.iter().position(|lock| *lock == wanted) {
            Some(idx) => {
                locks.remove(idx);
                Ok(())
            }
            None => Err(Error::InvalidParameter("range not locked".to_string())),
        }
    }

    fn move_path(
        &self,
        from: &NormalizedPath,
        to: &NormalizedPath,
        replace_if_existing: bool,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        let from_key = key(from);
        let to_key = key(to);
        if from_key == ROOT || to_key == ROOT {
            return Err(Error::AccessDenied(from_key));
        }
        if from_key == to_key {
            return Ok(());
        }
        if to_key.starts_with(&format!("{from_key}/")) {
            return Err(Error::InvalidParameter(format!("{to_key} is inside {from_key}")));
        }

        let mut entries = self.entries_mut()?;
        if !entries.contains_key(&from_key) {
            return Err(Error::not_found(from_key));
        }
        let to_parent = parent_key(&to_key).unwrap_or(ROOT);
        if !entries.get(to_parent).is_some_and(Entry::is_dir) {
            return Err(Error::not_found(to_parent));
        }
        if let Some(target) = entries.get(&to_key) {
            if !replace_if_existing {
                return Err(Error::AlreadyExists(to_key));
            }
            if target.is_dir() {
                return Err(Error::AccessDenied(to_key));
            }
        }

        let prefix = format!("{from_key}/");
        let moving: Vec<String> = entries
            .keys()
            .filter(|k| **k == from_key || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moving {
            if let Some(entry) = entries.remove(&old) {
                let new = format!("{to_key}{}", &old[from_key.len()..]);
                entries.insert(new, entry);
            }
        }
        Ok(())
    }

    fn delete_file(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        let key = key(path);
        let entries = self.entries()?;
        let entry = entries.get(&key).ok_or_else(|| Error::not_found(key.as_str()))?;
        if entry.is_dir() {
            return Err(Error::AccessDenied(key));
        }
        if entry.attributes.contains(FileAttribute::ReadOnly) {
            return Err(Error::AccessDenied(key));
        }
        info.set_delete_on_close(true);
        Ok(())
    }

    fn delete_directory(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        let key = key(path);
        if key == ROOT {
            return Err(Error::AccessDenied(key));
        }
        let entries = self.entries()?;
        let entry = entries.get(&key).ok_or_else(|| Error::not_found(key.as_str()))?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory(key));
        }
        if entries.keys().any(|k| parent_key(k) == Some(key.as_str())) {
            return Err(Error::DirectoryNotEmpty(key));
        }
        info.set_delete_on_close(true);
        Ok(())
    }

    fn read(&self, path: &NormalizedPath, offset: u64, buf: &mut [u8], _info: &FileInfo<'_>) -> Result<usize> {
        let key = key(path);
        let entries = self.entries()?;
        let data = match entries.get(&key).map(|e| &e.kind) {
            Some(EntryKind::File { data, .. }) => data,
            Some(EntryKind::Directory) => return Err(Error::IsADirectory(key)),
            None => return Err(Error::not_found(key)),
        };
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&self, path: &NormalizedPath, offset: u64, bytes: &[u8], info: &FileInfo<'_>) -> Result<usize> {
        let io = info.io;
        self.with_file_mut(path, |data, entry| {
            let start = if io.write_to_end_of_file {
                data.len()
            } else {
                to_usize(offset)?
            };
            let n = if io.paging_io {
                // Paging writes never extend the file.
                if start >= data.len() {
                    return Ok(0);
                }
                bytes.len().min(data.len() - start)
            } else {
                bytes.len()
            };
            let end = start
                .checked_add(n)
                .ok_or_else(|| Error::InvalidParameter("write past addressable range".into()))?;
            if end > data.len() {
                self.check_size(path, end as u64)?;
                grow(data, end)?;
            }
            data[start..end].copy_from_slice(&bytes[..n]);
            entry.last_write = FileTime::now();
            Ok(n)
        })
    }

    fn create_empty_file(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()> {
        self.insert_new(
            path,
            EntryKind::File {
                data: Vec::new(),
                streams: BTreeMap::new(),
            },
            request.file_attributes,
        )
    }

    fn create_empty_directory(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()> {
        self.insert_new(path, EntryKind::Directory, request.file_attributes)
    }

    fn flush(&self, path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<()> {
        if self.path_exists(path)? {
            Ok(())
        } else {
            Err(Error::not_found(path.as_str()))
        }
    }

    fn cleanup(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.release_locks(info.token())?;
        if !info.delete_on_close() {
            return Ok(());
        }
        let key = key(path);
        let mut entries = self.entries_mut()?;
        let entry = entries.get(&key).ok_or_else(|| Error::not_found(key.as_str()))?;
        if entry.is_dir() && entries.keys().any(|k| parent_key(k) == Some(key.as_str())) {
            return Err(Error::DirectoryNotEmpty(key));
        }
        entries.remove(&key);
        Ok(())
    }

    fn close(&self, _path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        let token = info.take_token();
        self.release_locks(token)?;
        if let Some(token) = token {
            self.open
                .lock()
                .map_err(|_| Error::poisoned())?
                .remove(&token.raw());
        }
        Ok(())
    }

    fn get_security(
        &self,
        path: &NormalizedPath,
        _security_information: u32,
        _info: &FileInfo<'_>,
    ) -> Result<Vec<u8>> {
        let key = key(path);
        self.entries()?
            .get(&key)
            .map(|entry| entry.security.clone())
            .ok_or_else(|| Error::not_found(key))
    }

    fn set_security(
        &self,
        path: &NormalizedPath,
        _security_information: u32,
        descriptor: &[u8],
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        self.with_entry_mut(path, |entry| entry.security = descriptor.to_vec())
    }

    fn truncate(&self, path: &NormalizedPath) -> Result<()> {
        self.with_file_mut(path, |data, entry| {
            data.clear();
            entry.last_write = FileTime::now();
            Ok(())
        })
    }

    fn set_allocation_size(&self, path: &NormalizedPath, size: u64, _info: &FileInfo<'_>) -> Result<()> {
        let size = to_usize(size)?;
        self.with_file_mut(path, |data, _| {
            // Allocation below end-of-file cuts the file.
            if size < data.len() {
                data.truncate(size);
            }
            Ok(())
        })
    }

    fn set_end_of_file(&self, path: &NormalizedPath, size: u64, _info: &FileInfo<'_>) -> Result<()> {
        self.check_size(path, size)?;
        let size = to_usize(size)?;
        self.with_file_mut(path, |data, entry| {
            if size < data.len() {
                data.truncate(size);
            } else {
                grow(data, size)?;
            }
            entry.last_write = FileTime::now();
            Ok(())
        })
    }

    fn set_attributes(
        &self,
        path: &NormalizedPath,
        attributes: EnumSet<FileAttribute>,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        self.with_entry_mut(path, |entry| entry.attributes = entry.fix_attributes(attributes))
    }

    fn get_metadata(&self, path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<FileMetadata> {
        let key = key(path);
        self.entries()?
            .get(&key)
            .map(|entry| entry.metadata(name_of(&key)))
            .ok_or_else(|| Error::not_found(key.as_str()))
    }

    fn set_times(&self, path: &NormalizedPath, times: &FileTimes, _info: &FileInfo<'_>) -> Result<()> {
        self.with_entry_mut(path, |entry| {
            if let Some(t) = times.creation {
                entry.creation = t;
            }
            if let Some(t) = times.last_access {
                entry.last_access = t;
            }
            if let Some(t) = times.last_write {
                entry.last_write = t;
            }
        })
    }
}
