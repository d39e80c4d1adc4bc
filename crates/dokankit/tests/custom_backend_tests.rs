//! Tests for custom FileSystem implementations
//!
//! These tests verify that everything needed to implement a backend is
//! exported, that optional capabilities fall back to their defaults, and that
//! a misbehaving backend cannot take the dispatcher down with it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dokankit::{
    apply_disposition, CreateArgs, CreateRequest, CreationDisposition, DeviceOptions, Dispatcher,
    EnumSet, Error, FileAttribute, FileInfo, FileMetadata, FileSystem, FileTime, FileTimes,
    IntoStatus, MountOption, NormalizedPath, RequestInfo, Result, StatusCode, WildcardPattern,
};

/// A flat backend: one directory (the root) holding named files.
#[derive(Default)]
struct FlatFs {
    files: Mutex<Vec<(String, Vec<u8>)>>,
    calls: AtomicUsize,
}

impl FlatFs {
    fn with(names: &[&str]) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| (format!("/{n}"), Vec::new())));
        fs
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl FileSystem for FlatFs {
    fn create(&self, path: &NormalizedPath, request: &CreateRequest, info: &FileInfo<'_>) -> Result<()> {
        self.touch();
        let directory = path.is_root() || request.wants_directory();
        apply_disposition(self, path, request, directory)?;
        info.set_is_directory(directory);
        Ok(())
    }

    fn path_exists(&self, path: &NormalizedPath) -> Result<bool> {
        Ok(path.is_root() || self.files.lock().unwrap().iter().any(|(n, _)| path == n.as_str()))
    }

    fn find_files_with_pattern(
        &self,
        _path: &NormalizedPath,
        _pattern: &WildcardPattern,
        _info: &FileInfo<'_>,
    ) -> Result<Vec<FileMetadata>> {
        self.touch();
        // Returns everything; the dispatcher does the filtering.
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|(n, data)| FileMetadata::file(&n[1..], data.len() as u64, FileTime::UNSET))
            .collect())
    }

    fn move_path(&self, _: &NormalizedPath, _: &NormalizedPath, _: bool, _: &FileInfo<'_>) -> Result<()> {
        Err(Error::AccessDenied("flat volume".into()))
    }

    fn delete_file(&self, _: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        info.set_delete_on_close(true);
        Ok(())
    }

    fn delete_directory(&self, path: &NormalizedPath, _: &FileInfo<'_>) -> Result<()> {
        Err(Error::AccessDenied(path.to_string()))
    }

    fn read(&self, _: &NormalizedPath, _: u64, _: &mut [u8], _: &FileInfo<'_>) -> Result<usize> {
        self.touch();
        Ok(0)
    }

    fn write(&self, _: &NormalizedPath, _: u64, data: &[u8], _: &FileInfo<'_>) -> Result<usize> {
        Ok(data.len())
    }

    fn create_empty_file(&self, path: &NormalizedPath, _: &CreateRequest) -> Result<()> {
        self.files.lock().unwrap().push((path.to_string(), Vec::new()));
        Ok(())
    }

    fn create_empty_directory(&self, _: &NormalizedPath, _: &CreateRequest) -> Result<()> {
        Err(Error::Unsupported("directories"))
    }

    fn flush(&self, _: &NormalizedPath, _: &FileInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.touch();
        if info.delete_on_close() {
            self.files.lock().unwrap().retain(|(n, _)| path != n.as_str());
        }
        Ok(())
    }

    fn close(&self, _: &NormalizedPath, _: &FileInfo<'_>) -> Result<()> {
        self.touch();
        Ok(())
    }

    fn truncate(&self, _: &NormalizedPath) -> Result<()> {
        Ok(())
    }

    fn set_allocation_size(&self, _: &NormalizedPath, _: u64, _: &FileInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn set_end_of_file(&self, _: &NormalizedPath, _: u64, _: &FileInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn set_attributes(
        &self,
        _: &NormalizedPath,
        _: EnumSet<FileAttribute>,
        _: &FileInfo<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn get_metadata(&self, path: &NormalizedPath, _: &FileInfo<'_>) -> Result<FileMetadata> {
        if path.is_root() {
            return Ok(FileMetadata::directory("/", FileTime::UNSET));
        }
        let name = path.file_name().unwrap_or_default();
        Ok(FileMetadata::file(name, 0, FileTime::UNSET))
    }

    fn set_times(&self, _: &NormalizedPath, _: &FileTimes, _: &FileInfo<'_>) -> Result<()> {
        Ok(())
    }
}

fn all_options() -> DeviceOptions {
    DeviceOptions::new("M:\\")
        .with_option(MountOption::AltStream)
        .with_option(MountOption::FileLockUserMode)
}

fn open(d: &Dispatcher, handle: u64, path: &str) -> RequestInfo {
    let req = RequestInfo::new(handle);
    d.create(&req, path, &CreateArgs::new(CreationDisposition::OpenExisting))
        .unwrap();
    req
}

#[test]
fn default_capabilities_are_not_implemented() {
    let d = Dispatcher::builder(Arc::new(FlatFs::with(&["a.txt"])))
        .device_options(all_options())
        .build();
    let req = open(&d, 1, "/a.txt");

    assert_eq!(
        d.enumerate_streams(&req, "/a.txt").status(),
        StatusCode::NotImplemented
    );
    assert_eq!(d.lock(&req, "/a.txt", 0, 1), Err(StatusCode::NotImplemented));
    assert_eq!(d.unlock(&req, "/a.txt", 0, 1), Err(StatusCode::NotImplemented));
    assert_eq!(
        d.get_security(&req, "/a.txt", 0x4).status(),
        StatusCode::NotImplemented
    );
    assert_eq!(
        d.set_security(&req, "/a.txt", 0x4, &[]),
        Err(StatusCode::NotImplemented)
    );
    // Mount notifications default to success.
    assert_eq!(d.mounted(), Ok(()));
    assert_eq!(d.unmounted(), Ok(()));
}

#[test]
fn dispatcher_filters_unfiltered_backend_listings() {
    let d = Dispatcher::new(Arc::new(FlatFs::with(&["a.txt", "b.md", "c.TXT"])));
    let req = open(&d, 1, "/");
    let names: Vec<String> = d
        .enumerate_with_pattern(&req, "\\", "*.txt")
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["a.txt".to_string(), "c.TXT".to_string()]);
}

#[test]
fn illegal_paths_never_reach_backend() {
    let fs = Arc::new(FlatFs::with(&["a.txt"]));
    let d = Dispatcher::new(fs.clone());
    let req = RequestInfo::new(1);
    let before = fs.calls.load(Ordering::SeqCst);

    for raw in ["/../a.txt", "/a\0.txt", ":bad"] {
        assert_eq!(
            d.create(&req, raw, &CreateArgs::new(CreationDisposition::OpenExisting)),
            Err(StatusCode::ObjectNameNotFound),
            "input {raw:?}"
        );
    }
    assert_eq!(fs.calls.load(Ordering::SeqCst), before);
}

#[test]
fn backend_errors_translate_per_operation() {
    let d = Dispatcher::new(Arc::new(FlatFs::with(&["a.txt"])));
    let req = open(&d, 1, "/a.txt");
    assert_eq!(
        d.move_file(&req, "/a.txt", "/b.txt", false),
        Err(StatusCode::AccessDenied)
    );

    let dir = RequestInfo::new(2);
    assert_eq!(
        d.create(
            &dir,
            "/sub",
            &CreateArgs::new(CreationDisposition::CreateNew).directory()
        ),
        Err(StatusCode::NotImplemented)
    );
}

// =============================================================================
// Panic containment
// =============================================================================

/// Panics on read; everything else is delegated.
struct PanickyFs {
    inner: FlatFs,
}

impl FileSystem for PanickyFs {
    fn create(&self, path: &NormalizedPath, request: &CreateRequest, info: &FileInfo<'_>) -> Result<()> {
        self.inner.create(path, request, info)
    }

    fn path_exists(&self, path: &NormalizedPath) -> Result<bool> {
        self.inner.path_exists(path)
    }

    fn find_files_with_pattern(
        &self,
        _: &NormalizedPath,
        _: &WildcardPattern,
        _: &FileInfo<'_>,
    ) -> Result<Vec<FileMetadata>> {
        panic!("listing exploded");
    }

    fn move_path(&self, from: &NormalizedPath, to: &NormalizedPath, replace: bool, info: &FileInfo<'_>) -> Result<()> {
        self.inner.move_path(from, to, replace, info)
    }

    fn delete_file(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.inner.delete_file(path, info)
    }

    fn delete_directory(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.inner.delete_directory(path, info)
    }

    fn read(&self, _: &NormalizedPath, _: u64, _: &mut [u8], _: &FileInfo<'_>) -> Result<usize> {
        panic!("read exploded");
    }

    fn write(&self, path: &NormalizedPath, offset: u64, data: &[u8], info: &FileInfo<'_>) -> Result<usize> {
        self.inner.write(path, offset, data, info)
    }

    fn create_empty_file(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()> {
        self.inner.create_empty_file(path, request)
    }

    fn create_empty_directory(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()> {
        self.inner.create_empty_directory(path, request)
    }

    fn flush(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.inner.flush(path, info)
    }

    fn cleanup(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.inner.cleanup(path, info)
    }

    fn close(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        self.inner.close(path, info)
    }

    fn truncate(&self, path: &NormalizedPath) -> Result<()> {
        self.inner.truncate(path)
    }

    fn set_allocation_size(&self, path: &NormalizedPath, size: u64, info: &FileInfo<'_>) -> Result<()> {
        self.inner.set_allocation_size(path, size, info)
    }

    fn set_end_of_file(&self, path: &NormalizedPath, size: u64, info: &FileInfo<'_>) -> Result<()> {
        self.inner.set_end_of_file(path, size, info)
    }

    fn set_attributes(
        &self,
        path: &NormalizedPath,
        attributes: EnumSet<FileAttribute>,
        info: &FileInfo<'_>,
    ) -> Result<()> {
        self.inner.set_attributes(path, attributes, info)
    }

    fn get_metadata(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<FileMetadata> {
        self.inner.get_metadata(path, info)
    }

    fn set_times(&self, path: &NormalizedPath, times: &FileTimes, info: &FileInfo<'_>) -> Result<()> {
        self.inner.set_times(path, times, info)
    }
}

#[test]
fn backend_panic_becomes_operation_failure() {
    let d = Dispatcher::new(Arc::new(PanickyFs {
        inner: FlatFs::with(&["a.txt"]),
    }));
    let req = open(&d, 1, "/a.txt");

    let mut buf = [0u8; 8];
    assert_eq!(
        d.read(&req, "/a.txt", &mut buf, 0),
        Err(StatusCode::ReadFault)
    );

    let root = open(&d, 2, "/");
    assert_eq!(d.enumerate(&root, "/"), Err(StatusCode::Unsuccessful));

    // The dispatcher keeps serving after the panics.
    assert!(d.get_metadata(&req, "/a.txt").is_ok());
    assert_eq!(d.write(&req, "/a.txt", b"ok", 0), Ok(2));
    assert_eq!(d.cleanup(&req, "/a.txt"), Ok(()));
    assert_eq!(d.close(&req, "/a.txt"), Ok(()));
}
