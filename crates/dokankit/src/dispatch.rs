//! Request dispatcher
//!
//! One entry point per driver request. Every entry point follows the same
//! shape:
//!
//! 1. Normalize the raw path (failure answers `ObjectNameNotFound` without
//!    touching the backend)
//! 2. Apply mount-option gates (write protection, lock and stream support)
//! 3. Resolve the [`FileContext`] for the request's handle
//! 4. Call the backend under panic containment
//! 5. Translate the outcome into a [`StatusCode`]
//!
//! # Fail Points (enabled with `failpoints` feature)
//!
//! - `dispatch::backend_call` - Fail or panic in place of any backend call

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "failpoints")]
use fail::fail_point;
use tracing::{debug, info, trace, warn};

use crate::backend::{CreateRequest, FileSystem};
use crate::config::{AdapterConfig, DeviceOptions, FreeSpace, VolumeInformation};
use crate::context::{FileContext, FileInfo, HandleId, HandleState, HandleTable, RequestInfo};
use crate::error::{Error, Result};
use crate::flags::{self, CreateOption, CreationDisposition, MountOption};
use crate::logging_impl::LogConfig;
use crate::path::{self, NormalizedPath};
use crate::status::{translate_error, DispatchResult, OperationKind, StatusCode};
use crate::types::{DiskSpace, FileMetadata, FileTime, FileTimes, StreamInfo};
use crate::wildcard::WildcardPattern;

/// Shell metadata files Explorer probes for constantly. Cleanup and close
/// for these never reach the backend.
const SKIP_FILES: [&str; 4] = ["desktop.ini", "autorun.inf", "folder.jpg", "folder.gif"];

fn is_skip_file(path: &NormalizedPath) -> bool {
    let lower = path.as_str().to_lowercase();
    SKIP_FILES.iter().any(|name| lower.ends_with(name))
}

/// Raw create arguments as the driver passes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateArgs {
    pub desired_access: u32,
    pub file_attributes: u32,
    pub share_access: u32,
    pub creation_disposition: u32,
    pub create_options: u32,
}

impl CreateArgs {
    pub fn new(disposition: CreationDisposition) -> Self {
        Self {
            creation_disposition: disposition.raw(),
            share_access: 0b111,
            ..Self::default()
        }
    }

    pub fn desired_access(mut self, raw: u32) -> Self {
        self.desired_access = raw;
        self
    }

    pub fn file_attributes(mut self, raw: u32) -> Self {
        self.file_attributes = raw;
        self
    }

    pub fn share_access(mut self, raw: u32) -> Self {
        self.share_access = raw;
        self
    }

    pub fn create_options(mut self, raw: u32) -> Self {
        self.create_options = raw;
        self
    }

    /// Shorthand for the directory-file create option.
    pub fn directory(self) -> Self {
        let raw = self.create_options | enumset::EnumSet::only(CreateOption::DirectoryFile).as_u32();
        self.create_options(raw)
    }

    fn decode(&self) -> Option<CreateRequest> {
        let disposition = CreationDisposition::from_raw(self.creation_disposition)?;
        Some(
            CreateRequest::new(disposition)
                .access(flags::decode(self.desired_access))
                .attributes(flags::decode(self.file_attributes))
                .share(flags::decode(self.share_access))
                .options(flags::decode(self.create_options)),
        )
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    fs: Arc<dyn FileSystem>,
    device: DeviceOptions,
    volume: VolumeInformation,
    free_space: FreeSpace,
    log: LogConfig,
}

impl DispatcherBuilder {
    pub fn device_options(mut self, options: DeviceOptions) -> Self {
        self.device = options;
        self
    }

    pub fn volume(mut self, volume: VolumeInformation) -> Self {
        self.volume = volume;
        self
    }

    pub fn free_space(mut self, free_space: FreeSpace) -> Self {
        self.free_space = free_space;
        self
    }

    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Take device options, volume information and free space from one
    /// config document.
    pub fn config(self, config: AdapterConfig) -> Self {
        self.device_options(config.device)
            .volume(config.volume)
            .free_space(config.free_space)
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            fs: self.fs,
            handles: HandleTable::new(),
            device: self.device,
            volume: self.volume,
            free_space: self.free_space,
            log: self.log,
        }
    }
}

/// Routes driver requests to a backend.
///
/// `Send + Sync`; every entry point may be called concurrently.
pub struct Dispatcher {
    fs: Arc<dyn FileSystem>,
    handles: HandleTable,
    device: DeviceOptions,
    volume: VolumeInformation,
    free_space: FreeSpace,
    log: LogConfig,
}

impl Dispatcher {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::builder(fs).build()
    }

    pub fn builder(fs: Arc<dyn FileSystem>) -> DispatcherBuilder {
        DispatcherBuilder {
            fs,
            device: DeviceOptions::default(),
            volume: VolumeInformation::default(),
            free_space: FreeSpace::default(),
            log: LogConfig::default(),
        }
    }

    pub fn device_options(&self) -> &DeviceOptions {
        &self.device
    }

    pub fn volume(&self) -> &VolumeInformation {
        &self.volume
    }

    pub fn backend(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// The live context for a handle, if any.
    pub fn file_context(&self, handle: HandleId) -> Option<Arc<FileContext>> {
        self.handles.get(handle).ok().flatten()
    }

    /// Number of handles between create and close.
    pub fn open_handles(&self) -> usize {
        self.handles.len().unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Handle lifecycle
    // ---------------------------------------------------------------------

    /// Open or create a file or directory.
    ///
    /// Returns whether the opened entry is a directory.
    pub fn create(&self, req: &RequestInfo, raw_path: &str, args: &CreateArgs) -> DispatchResult<bool> {
        let op = OperationKind::Create;
        let path = self.normalize(op, raw_path)?;
        let request = args.decode().ok_or(StatusCode::InvalidParameter)?;

        let modifies = request.disposition.may_modify()
            || request.create_options.contains(CreateOption::DeleteOnClose);
        if modifies {
            self.check_writable(op)?;
        }

        debug!(
            op = op.name(),
            handle = req.handle.0,
            path = %self.log.format_path(&path),
            disposition = ?request.disposition,
            "dispatch"
        );

        let context = self.table(
            op,
            self.handles
                .open_with(req.handle, || FileContext::new(path.clone(), req.process_id)),
        )?;
        context.set_is_directory(request.wants_directory());
        let info = FileInfo::new(&context, req.io);

        match self.call(op, |fs| fs.create(&path, &request, &info)) {
            Ok(()) => {
                if request.create_options.contains(CreateOption::DeleteOnClose) {
                    context.set_delete_on_close(true);
                }
                context.advance(HandleState::Open);
                Ok(context.is_directory())
            }
            Err(code) => {
                if context.state() == HandleState::Unopened {
                    self.table(op, self.handles.discard(req.handle))?;
                }
                Err(code)
            }
        }
    }

    /// Last user handle closed; the backend deletes if delete-on-close is set.
    pub fn cleanup(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<()> {
        let op = OperationKind::Cleanup;
        let path = self.normalize(op, raw_path)?;
        if is_skip_file(&path) {
            trace!(op = op.name(), "skip file");
            return Ok(());
        }
        let Some(context) = self.table(op, self.handles.get(req.handle))? else {
            debug!(op = op.name(), handle = req.handle.0, "no live context");
            return Ok(());
        };
        self.trace_request(op, req, &path);

        context.advance(HandleState::CleanupRequested);
        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.cleanup(&path, &info))
    }

    /// Handle released. The context record is discarded whatever the outcome
    /// and the backend always gets to release its token.
    pub fn close(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<()> {
        let op = OperationKind::Close;
        let Some(context) = self.table(op, self.handles.discard(req.handle))? else {
            debug!(op = op.name(), handle = req.handle.0, "no live context");
            return Ok(());
        };
        context.advance(HandleState::Closed);
        let info = FileInfo::new(&context, req.io);

        let path = match self.normalize(op, raw_path) {
            Ok(path) => path,
            Err(code) => {
                // Release under the path seen at open; failures are logged by `call`.
                let opened = context.path();
                let _ = self.call(op, |fs| fs.close(opened, &info));
                return Err(code);
            }
        };
        if is_skip_file(&path) {
            trace!(op = op.name(), "skip file");
            let _ = self.call(op, |fs| fs.close(&path, &info));
            return Ok(());
        }
        self.trace_request(op, req, &path);

        self.call(op, |fs| fs.close(&path, &info))
    }

    // ---------------------------------------------------------------------
    // Data transfer
    // ---------------------------------------------------------------------

    /// Read into `buf` at `offset`. Returns the byte count the backend
    /// reported; short reads are passed through, never retried.
    pub fn read(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        buf: &mut [u8],
        offset: i64,
    ) -> DispatchResult<usize> {
        let op = OperationKind::Read;
        let path = self.normalize(op, raw_path)?;
        let context = self.context(op, req)?;
        let offset = non_negative(offset)?;
        if context.is_directory() {
            return Err(StatusCode::FileIsADirectory);
        }
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.read(&path, offset, buf, &info))
    }

    /// Write `data` at `offset` (ignored when the request asks to append).
    pub fn write(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        data: &[u8],
        offset: i64,
    ) -> DispatchResult<usize> {
        let op = OperationKind::Write;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        let offset = if req.io.write_to_end_of_file {
            0
        } else {
            non_negative(offset)?
        };
        if context.is_directory() {
            return Err(StatusCode::FileIsADirectory);
        }
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.write(&path, offset, data, &info))
    }

    pub fn flush(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<()> {
        let op = OperationKind::Flush;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.flush(&path, &info))
    }

    // ---------------------------------------------------------------------
    // Metadata
    // ---------------------------------------------------------------------

    pub fn get_metadata(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<FileMetadata> {
        let op = OperationKind::GetMetadata;
        let path = self.normalize(op, raw_path)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        let mut metadata = self.call(op, |fs| fs.get_metadata(&path, &info))?;
        if metadata.volume_serial_number == 0 {
            metadata.volume_serial_number = self.volume.serial_number;
        }
        Ok(metadata)
    }

    pub fn set_attributes(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        raw_attributes: u32,
    ) -> DispatchResult<()> {
        let op = OperationKind::SetAttributes;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let attributes = flags::decode(raw_attributes);
        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.set_attributes(&path, attributes, &info))
    }

    /// Apply timestamps. A zero [`FileTime`] leaves that timestamp unchanged.
    pub fn set_times(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        creation: FileTime,
        last_access: FileTime,
        last_write: FileTime,
    ) -> DispatchResult<()> {
        let op = OperationKind::SetTimes;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let times = FileTimes::from_raw(creation, last_access, last_write);
        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.set_times(&path, &times, &info))
    }

    pub fn set_end_of_file(&self, req: &RequestInfo, raw_path: &str, size: i64) -> DispatchResult<()> {
        let op = OperationKind::SetEndOfFile;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        let size = non_negative(size)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.set_end_of_file(&path, size, &info))
    }

    pub fn set_allocation_size(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        size: i64,
    ) -> DispatchResult<()> {
        let op = OperationKind::SetAllocationSize;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        let size = non_negative(size)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.set_allocation_size(&path, size, &info))
    }

    // ---------------------------------------------------------------------
    // Enumeration
    // ---------------------------------------------------------------------

    /// List a directory.
    pub fn enumerate(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<Vec<FileMetadata>> {
        self.find(OperationKind::Enumerate, req, raw_path, "*")
    }

    /// List the entries of a directory whose names match `raw_pattern`.
    ///
    /// An uncompilable pattern yields no entries.
    pub fn enumerate_with_pattern(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        raw_pattern: &str,
    ) -> DispatchResult<Vec<FileMetadata>> {
        self.find(OperationKind::EnumerateWithPattern, req, raw_path, raw_pattern)
    }

    fn find(
        &self,
        op: OperationKind,
        req: &RequestInfo,
        raw_path: &str,
        raw_pattern: &str,
    ) -> DispatchResult<Vec<FileMetadata>> {
        let path = self.normalize_directory(op, raw_path)?;
        let context = self.context(op, req)?;
        let pattern = match WildcardPattern::parse(raw_pattern) {
            Ok(pattern) => pattern,
            Err(err) => {
                debug!(op = op.name(), error = %err, "pattern matches nothing");
                return Ok(Vec::new());
            }
        };
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        let entries = self.call(op, |fs| fs.find_files_with_pattern(&path, &pattern, &info))?;

        let case_sensitive = self.volume.case_sensitive();
        let total = entries.len();
        let matched: Vec<FileMetadata> = entries
            .into_iter()
            .filter(|entry| pattern.matches(&entry.name, case_sensitive))
            .collect();
        trace!(
            op = op.name(),
            total,
            matched = matched.len(),
            "filtered entries"
        );
        Ok(matched)
    }

    pub fn enumerate_streams(&self, req: &RequestInfo, raw_path: &str) -> DispatchResult<Vec<StreamInfo>> {
        let op = OperationKind::EnumerateStreams;
        let path = self.normalize(op, raw_path)?;
        self.require_option(MountOption::AltStream)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.find_streams(&path, &info))
    }

    // ---------------------------------------------------------------------
    // Namespace changes
    // ---------------------------------------------------------------------

    /// Mark (or unmark) a file for deletion at cleanup.
    pub fn delete_file_check(&self, req: &RequestInfo, raw_path: &str, delete: bool) -> DispatchResult<()> {
        self.delete_check(OperationKind::DeleteFileCheck, req, raw_path, delete)
    }

    /// Mark (or unmark) a directory for deletion at cleanup.
    pub fn delete_directory_check(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        delete: bool,
    ) -> DispatchResult<()> {
        self.delete_check(OperationKind::DeleteDirectoryCheck, req, raw_path, delete)
    }

    fn delete_check(
        &self,
        op: OperationKind,
        req: &RequestInfo,
        raw_path: &str,
        delete: bool,
    ) -> DispatchResult<()> {
        let path = self.normalize(op, raw_path)?;
        if delete {
            self.check_writable(op)?;
        }
        let context = self.context(op, req)?;
        if !delete {
            context.set_delete_on_close(false);
            return Ok(());
        }
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| match op {
            OperationKind::DeleteDirectoryCheck => fs.delete_directory(&path, &info),
            _ => fs.delete_file(&path, &info),
        })
    }

    pub fn move_file(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        raw_new_path: &str,
        replace_if_existing: bool,
    ) -> DispatchResult<()> {
        let op = OperationKind::MoveFile;
        let from = self.normalize(op, raw_path)?;
        let to = self.normalize(op, raw_new_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        debug!(
            op = op.name(),
            handle = req.handle.0,
            from = %self.log.format_path(&from),
            to = %self.log.format_path(&to),
            replace_if_existing,
            "dispatch"
        );

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.move_path(&from, &to, replace_if_existing, &info))
    }

    // ---------------------------------------------------------------------
    // Byte-range locks
    // ---------------------------------------------------------------------

    pub fn lock(&self, req: &RequestInfo, raw_path: &str, offset: i64, length: i64) -> DispatchResult<()> {
        self.byte_range(OperationKind::Lock, req, raw_path, offset, length)
    }

    pub fn unlock(&self, req: &RequestInfo, raw_path: &str, offset: i64, length: i64) -> DispatchResult<()> {
        self.byte_range(OperationKind::Unlock, req, raw_path, offset, length)
    }

    fn byte_range(
        &self,
        op: OperationKind,
        req: &RequestInfo,
        raw_path: &str,
        offset: i64,
        length: i64,
    ) -> DispatchResult<()> {
        let path = self.normalize(op, raw_path)?;
        self.require_option(MountOption::FileLockUserMode)?;
        let context = self.context(op, req)?;
        let offset = non_negative(offset)?;
        let length = non_negative(length)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| match op {
            OperationKind::Unlock => fs.unlock(&path, offset, length, &info),
            _ => fs.lock(&path, offset, length, &info),
        })
    }

    // ---------------------------------------------------------------------
    // Security
    // ---------------------------------------------------------------------

    /// Fetch the self-relative security descriptor for the requested parts.
    pub fn get_security(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        security_information: u32,
    ) -> DispatchResult<Vec<u8>> {
        let op = OperationKind::GetSecurity;
        let path = self.normalize(op, raw_path)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.get_security(&path, security_information, &info))
    }

    pub fn set_security(
        &self,
        req: &RequestInfo,
        raw_path: &str,
        security_information: u32,
        descriptor: &[u8],
    ) -> DispatchResult<()> {
        let op = OperationKind::SetSecurity;
        let path = self.normalize(op, raw_path)?;
        self.check_writable(op)?;
        let context = self.context(op, req)?;
        self.trace_request(op, req, &path);

        let info = FileInfo::new(&context, req.io);
        self.call(op, |fs| fs.set_security(&path, security_information, descriptor, &info))
    }

    // ---------------------------------------------------------------------
    // Volume-level requests (no file context)
    // ---------------------------------------------------------------------

    pub fn get_disk_free_space(&self) -> DispatchResult<DiskSpace> {
        let free = self.free_space.free_bytes();
        Ok(DiskSpace {
            free_bytes_available: free,
            total_bytes: self.free_space.total_bytes,
            total_free_bytes: free,
        })
    }

    /// Volume information with names cut to the caller's buffer capacities.
    pub fn get_volume_information(
        &self,
        name_capacity: usize,
        file_system_name_capacity: usize,
    ) -> DispatchResult<VolumeInformation> {
        Ok(self.volume.truncated(name_capacity, file_system_name_capacity))
    }

    pub fn mounted(&self) -> DispatchResult<()> {
        info!(
            mount_point = %self.device.mount_point,
            volume = %self.volume.name,
            "volume mounted"
        );
        self.call(OperationKind::Mounted, |fs| fs.mounted())
    }

    pub fn unmounted(&self) -> DispatchResult<()> {
        info!(mount_point = %self.device.mount_point, "volume unmounted");
        self.call(OperationKind::Unmounted, |fs| fs.unmounted())
    }

    // ---------------------------------------------------------------------
    // Shared preamble
    // ---------------------------------------------------------------------

    fn normalize(&self, op: OperationKind, raw: &str) -> DispatchResult<NormalizedPath> {
        path::normalize(raw).map_err(|err| self.reject_path(op, raw, err))
    }

    fn normalize_directory(&self, op: OperationKind, raw: &str) -> DispatchResult<NormalizedPath> {
        path::normalize_directory(raw).map_err(|err| self.reject_path(op, raw, err))
    }

    fn reject_path(&self, op: OperationKind, raw: &str, err: path::NormalizationError) -> StatusCode {
        let code = translate_error(&Error::from(err), op);
        warn!(
            op = op.name(),
            path = %self.log.format_raw_path(raw),
            error = %err,
            "rejected illegal path"
        );
        code
    }

    fn context(&self, op: OperationKind, req: &RequestInfo) -> DispatchResult<Arc<FileContext>> {
        self.table(op, self.handles.get(req.handle))?
            .ok_or_else(|| {
                debug!(handle = req.handle.0, "unknown handle");
                StatusCode::InvalidHandle
            })
    }

    fn table<T>(&self, op: OperationKind, result: Result<T>) -> DispatchResult<T> {
        result.map_err(|err| {
            let code = translate_error(&err, op);
            warn!(op = op.name(), error = %err, status = %code, "handle table failure");
            code
        })
    }

    fn check_writable(&self, op: OperationKind) -> DispatchResult<()> {
        if self.device.has(MountOption::WriteProtection) {
            debug!(op = op.name(), "write-protected volume");
            return Err(StatusCode::MediaWriteProtected);
        }
        Ok(())
    }

    fn require_option(&self, option: MountOption) -> DispatchResult<()> {
        if self.device.has(option) {
            Ok(())
        } else {
            Err(StatusCode::NotImplemented)
        }
    }

    fn trace_request(&self, op: OperationKind, req: &RequestInfo, path: &NormalizedPath) {
        debug!(
            op = op.name(),
            handle = req.handle.0,
            pid = req.process_id,
            path = %self.log.format_path(path),
            "dispatch"
        );
    }

    /// Run one backend call with panics contained and the outcome translated.
    fn call<T>(
        &self,
        op: OperationKind,
        f: impl FnOnce(&dyn FileSystem) -> Result<T>,
    ) -> DispatchResult<T> {
        let fs = self.fs.as_ref();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            #[cfg(feature = "failpoints")]
            fail_point!("dispatch::backend_call", |_| {
                Err(Error::Internal("injected backend failure".to_string()))
            });
            f(fs)
        }))
        .unwrap_or_else(|_| {
            warn!(op = op.name(), "backend panicked");
            Err(Error::Internal("backend panicked".to_string()))
        });

        outcome.map_err(|err| {
            let code = translate_error(&err, op);
            match err {
                Error::Internal(_) => warn!(op = op.name(), error = %err, status = %code, "backend failure"),
                _ => debug!(op = op.name(), error = %err, status = %code, "backend error"),
            }
            code
        })
    }
}

fn non_negative(value: i64) -> DispatchResult<u64> {
    u64::try_from(value).map_err(|_| StatusCode::InvalidParameter)
}
