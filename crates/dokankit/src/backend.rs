//! Backend trait
//!
//! A backend supplies storage behavior; the [`Dispatcher`](crate::Dispatcher)
//! supplies everything else (path normalization, handle tracking, status
//! translation, enumeration filtering, mount-option gates).
//!
//! # Contract
//!
//! Backends are expected to:
//! - Report directory-ness from [`FileSystem::create`] through
//!   [`FileContext::set_is_directory`](crate::FileContext::set_is_directory)
//! - Record delete intent in `delete_on_close` during the delete checks and
//!   remove the entry in [`FileSystem::cleanup`] only when it is set
//! - Release whatever a [`BackendToken`](crate::BackendToken) denotes in
//!   [`FileSystem::close`]
//! - Return the number of bytes actually transferred from `read`/`write`
//!
//! Backends do NOT need to:
//! - Normalize paths (every path arrives as a [`NormalizedPath`])
//! - Filter enumeration results exactly (the dispatcher re-filters)
//! - Enforce write protection (the dispatcher gates mutating requests)
//!
//! # Thread Safety
//!
//! All implementations must be `Send + Sync`. The dispatcher may call any
//! method concurrently, including several reads and writes on one handle.

use enumset::EnumSet;

use crate::context::FileInfo;
use crate::error::{Error, Result};
use crate::flags::{CreateOption, CreationDisposition, FileAccess, FileAttribute, FileShare};
use crate::path::NormalizedPath;
use crate::types::{FileMetadata, FileTimes, StreamInfo};
use crate::wildcard::WildcardPattern;

/// Decoded arguments of a create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateRequest {
    pub desired_access: EnumSet<FileAccess>,
    pub file_attributes: EnumSet<FileAttribute>,
    pub share_access: EnumSet<FileShare>,
    pub disposition: CreationDisposition,
    pub create_options: EnumSet<CreateOption>,
}

impl CreateRequest {
    pub fn new(disposition: CreationDisposition) -> Self {
        Self {
            desired_access: EnumSet::new(),
            file_attributes: EnumSet::new(),
            share_access: EnumSet::all(),
            disposition,
            create_options: EnumSet::new(),
        }
    }

    pub fn access(mut self, access: EnumSet<FileAccess>) -> Self {
        self.desired_access = access;
        self
    }

    pub fn attributes(mut self, attributes: EnumSet<FileAttribute>) -> Self {
        self.file_attributes = attributes;
        self
    }

    pub fn share(mut self, share: EnumSet<FileShare>) -> Self {
        self.share_access = share;
        self
    }

    pub fn options(mut self, options: EnumSet<CreateOption>) -> Self {
        self.create_options = options;
        self
    }

    /// The caller insists on a directory.
    pub fn wants_directory(&self) -> bool {
        self.create_options.contains(CreateOption::DirectoryFile)
    }

    /// The caller insists on a non-directory.
    pub fn wants_file(&self) -> bool {
        self.create_options.contains(CreateOption::NonDirectoryFile)
    }
}

/// What [`apply_disposition`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Opened,
    Created,
    Truncated,
}

/// Enforce the creation-disposition matrix using a backend's primitives.
///
/// | disposition | exists | missing |
/// |-------------|--------|---------|
/// | create-new | `AlreadyExists` | create |
/// | create-always | truncate | create |
/// | open-existing | open | `NotFound` |
/// | open-always | open | create |
/// | truncate-existing | truncate | `NotFound` |
///
/// Directories are never truncated; truncate-existing on one fails with
/// `IsADirectory`.
pub fn apply_disposition<F: FileSystem + ?Sized>(
    fs: &F,
    path: &NormalizedPath,
    request: &CreateRequest,
    directory: bool,
) -> Result<CreateOutcome> {
    use CreationDisposition::*;

    let exists = fs.path_exists(path)?;
    match (request.disposition, exists) {
        (CreateNew, true) => Err(Error::AlreadyExists(path.to_string())),
        (OpenExisting | TruncateExisting, false) => Err(Error::not_found(path.as_str())),
        (OpenExisting | OpenAlways, true) => Ok(CreateOutcome::Opened),
        (CreateNew | CreateAlways | OpenAlways, false) => {
            if directory {
                fs.create_empty_directory(path, request)?;
            } else {
                fs.create_empty_file(path, request)?;
            }
            Ok(CreateOutcome::Created)
        }
        (CreateAlways, true) if directory => Ok(CreateOutcome::Opened),
        (TruncateExisting, true) if directory => Err(Error::IsADirectory(path.to_string())),
        (CreateAlways | TruncateExisting, true) => {
            fs.truncate(path)?;
            Ok(CreateOutcome::Truncated)
        }
    }
}

/// The pluggable storage implementation behind a mount.
///
/// Optional capabilities have default bodies: streams, locks and security
/// answer [`Error::Unsupported`]; mount notifications succeed.
pub trait FileSystem: Send + Sync {
    /// Open or create `path`.
    ///
    /// Must call `info.set_is_directory` when the opened entry is a directory.
    /// [`apply_disposition`] implements the disposition matrix.
    fn create(&self, path: &NormalizedPath, request: &CreateRequest, info: &FileInfo<'_>)
        -> Result<()>;

    /// The volume was mounted.
    fn mounted(&self) -> Result<()> {
        Ok(())
    }

    /// The volume was unmounted.
    fn unmounted(&self) -> Result<()> {
        Ok(())
    }

    fn path_exists(&self, path: &NormalizedPath) -> Result<bool>;

    /// List a directory. Entries that do not match `pattern` may be returned;
    /// the dispatcher filters them out.
    fn find_files_with_pattern(
        &self,
        path: &NormalizedPath,
        pattern: &WildcardPattern,
        info: &FileInfo<'_>,
    ) -> Result<Vec<FileMetadata>>;

    fn find_streams(&self, _path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<Vec<StreamInfo>> {
        Err(Error::Unsupported("find_streams"))
    }

    fn lock(
        &self,
        _path: &NormalizedPath,
        _offset: u64,
        _length: u64,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        Err(Error::Unsupported("lock"))
    }

    fn unlock(
        &self,
        _path: &NormalizedPath,
        _offset: u64,
        _length: u64,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        Err(Error::Unsupported("unlock"))
    }

    fn move_path(
        &self,
        from: &NormalizedPath,
        to: &NormalizedPath,
        replace_if_existing: bool,
        info: &FileInfo<'_>,
    ) -> Result<()>;

    /// Check that a file may be deleted and record intent on the context.
    fn delete_file(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()>;

    /// Check that a directory may be deleted and record intent on the context.
    fn delete_directory(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()>;

    /// Read into `buf` at `offset`; returns bytes read (0 at end of file).
    fn read(
        &self,
        path: &NormalizedPath,
        offset: u64,
        buf: &mut [u8],
        info: &FileInfo<'_>,
    ) -> Result<usize>;

    /// Write `data` at `offset`; returns bytes written.
    ///
    /// `info.io.write_to_end_of_file` means append regardless of `offset`;
    /// `info.io.paging_io` means never extend the file.
    fn write(
        &self,
        path: &NormalizedPath,
        offset: u64,
        data: &[u8],
        info: &FileInfo<'_>,
    ) -> Result<usize>;

    fn create_empty_file(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()>;

    fn create_empty_directory(&self, path: &NormalizedPath, request: &CreateRequest)
        -> Result<()>;

    fn flush(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()>;

    /// Last user handle closed. Remove the entry iff `info.delete_on_close()`.
    fn cleanup(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()>;

    /// Handle released. Drop what the token denotes.
    fn close(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()>;

    fn get_security(
        &self,
        _path: &NormalizedPath,
        _security_information: u32,
        _info: &FileInfo<'_>,
    ) -> Result<Vec<u8>> {
        Err(Error::Unsupported("get_security"))
    }

    fn set_security(
        &self,
        _path: &NormalizedPath,
        _security_information: u32,
        _descriptor: &[u8],
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        Err(Error::Unsupported("set_security"))
    }

    /// Cut an existing file to zero length.
    fn truncate(&self, path: &NormalizedPath) -> Result<()>;

    fn set_allocation_size(&self, path: &NormalizedPath, size: u64, info: &FileInfo<'_>)
        -> Result<()>;

    fn set_end_of_file(&self, path: &NormalizedPath, size: u64, info: &FileInfo<'_>)
        -> Result<()>;

    fn set_attributes(
        &self,
        path: &NormalizedPath,
        attributes: EnumSet<FileAttribute>,
        info: &FileInfo<'_>,
    ) -> Result<()>;

    fn get_metadata(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<FileMetadata>;

    /// Apply the timestamps that are `Some`.
    fn set_times(&self, path: &NormalizedPath, times: &FileTimes, info: &FileInfo<'_>)
        -> Result<()>;
}
