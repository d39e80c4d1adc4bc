//! Host-directory backend
//!
//! Serves a directory on the host through `std::fs`. Every normalized path is
//! resolved segment by segment under the mirrored root; normalized paths carry
//! no `..` so nothing above the root is reachable.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use enumset::EnumSet;
use tracing::trace;

use crate::backend::{apply_disposition, CreateRequest, FileSystem};
use crate::context::FileInfo;
use crate::error::{Error, Result};
use crate::flags::FileAttribute;
use crate::path::NormalizedPath;
use crate::types::{FileMetadata, FileTime, FileTimes};
use crate::wildcard::WildcardPattern;

/// Backend mirroring a host directory.
pub struct MirrorFs {
    root: PathBuf,
}

impl MirrorFs {
    /// Mirror `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let meta = fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory(root.display().to_string()));
        }
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a normalized path. Only rooted paths are served.
    fn resolve(&self, path: &NormalizedPath) -> Result<PathBuf> {
        if !path.as_str().starts_with('/') {
            return Err(Error::AccessDenied(path.to_string()));
        }
        let mut full = self.root.clone();
        for segment in path.segments() {
            full.push(segment);
        }
        Ok(full)
    }

    fn metadata_for(&self, name: &str, meta: &fs::Metadata) -> FileMetadata {
        let mut attributes = EnumSet::new();
        if meta.is_dir() {
            attributes.insert(FileAttribute::Directory);
        }
        if meta.permissions().readonly() {
            attributes.insert(FileAttribute::ReadOnly);
        }
        if attributes.is_empty() {
            attributes.insert(FileAttribute::Normal);
        }

        let time = |t: std::io::Result<std::time::SystemTime>| t.map(FileTime::from).unwrap_or_default();
        FileMetadata {
            name: name.to_string(),
            attributes,
            creation_time: time(meta.created()),
            last_access_time: time(meta.accessed()),
            last_write_time: time(meta.modified()),
            size: if meta.is_dir() { 0 } else { meta.len() },
            file_index: 0,
            volume_serial_number: 0,
            number_of_links: 1,
        }
    }
}

fn open_for_write(full: &Path) -> Result<File> {
    Ok(OpenOptions::new().write(true).open(full)?)
}

impl FileSystem for MirrorFs {
    fn create(&self, path: &NormalizedPath, request: &CreateRequest, info: &FileInfo<'_>) -> Result<()> {
        let full = self.resolve(path)?;
        let existing = match fs::metadata(&full) {
            Ok(meta) => Some(meta.is_dir()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        match existing {
            Some(true) if request.wants_file() => return Err(Error::IsADirectory(path.to_string())),
            Some(false) if request.wants_directory() => {
                return Err(Error::NotADirectory(path.to_string()))
            }
            _ => {}
        }
        let directory = existing.unwrap_or_else(|| request.wants_directory());

        let outcome = apply_disposition(self, path, request, directory)?;
        trace!(?outcome, directory, "mirror create");
        info.set_is_directory(directory);
        Ok(())
    }

    fn path_exists(&self, path: &NormalizedPath) -> Result<bool> {
        Ok(self.resolve(path)?.try_exists()?)
    }

    fn find_files_with_pattern(
        &self,
        path: &NormalizedPath,
        _pattern: &WildcardPattern,
        _info: &FileInfo<'_>,
    ) -> Result<Vec<FileMetadata>> {
        let full = self.resolve(path)?;
        let mut found = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            found.push(self.metadata_for(&name, &meta));
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    fn move_path(
        &self,
        from: &NormalizedPath,
        to: &NormalizedPath,
        replace_if_existing: bool,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if source == self.root || target == self.root {
            return Err(Error::AccessDenied(from.to_string()));
        }
        if target.try_exists()? && !replace_if_existing {
            return Err(Error::AlreadyExists(to.to_string()));
        }
        fs::rename(&source, &target)?;
        Ok(())
    }

    fn delete_file(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        let meta = fs::metadata(self.resolve(path)?)?;
        if meta.is_dir() {
            return Err(Error::AccessDenied(path.to_string()));
        }
        if meta.permissions().readonly() {
            return Err(Error::AccessDenied(path.to_string()));
        }
        info.set_delete_on_close(true);
        Ok(())
    }

    fn delete_directory(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(Error::AccessDenied(path.to_string()));
        }
        if !fs::metadata(&full)?.is_dir() {
            return Err(Error::NotADirectory(path.to_string()));
        }
        if fs::read_dir(&full)?.next().is_some() {
            return Err(Error::DirectoryNotEmpty(path.to_string()));
        }
        info.set_delete_on_close(true);
        Ok(())
    }

    fn read(&self, path: &NormalizedPath, offset: u64, buf: &mut [u8], _info: &FileInfo<'_>) -> Result<usize> {
        let mut file = File::open(self.resolve(path)?)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(Error::ReadFault(err.to_string())),
            }
        }
        Ok(total)
    }

    fn write(&self, path: &NormalizedPath, offset: u64, data: &[u8], info: &FileInfo<'_>) -> Result<usize> {
        let mut file = open_for_write(&self.resolve(path)?)?;
        let len = file.metadata()?.len();
        let start = if info.io.write_to_end_of_file { len } else { offset };

        let n = if info.io.paging_io {
            if start >= len {
                return Ok(0);
            }
            data.len().min(usize::try_from(len - start).unwrap_or(usize::MAX))
        } else {
            data.len()
        };

        file.seek(SeekFrom::Start(start))?;
        file.write_all(&data[..n])
            .map_err(|err| Error::WriteFault(err.to_string()))?;
        Ok(n)
    }

    fn create_empty_file(&self, path: &NormalizedPath, request: &CreateRequest) -> Result<()> {
        let full = self.resolve(path)?;
        OpenOptions::new().write(true).create_new(true).open(&full)?;
        if request.file_attributes.contains(FileAttribute::ReadOnly) {
            let mut permissions = fs::metadata(&full)?.permissions();
            permissions.set_readonly(true);
            fs::set_permissions(&full, permissions)?;
        }
        Ok(())
    }

    fn create_empty_directory(&self, path: &NormalizedPath, _request: &CreateRequest) -> Result<()> {
        fs::create_dir(self.resolve(path)?)?;
        Ok(())
    }

    fn flush(&self, path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<()> {
        let full = self.resolve(path)?;
        if fs::metadata(&full)?.is_dir() {
            return Ok(());
        }
        open_for_write(&full)?
            .sync_data()
            .map_err(|err| Error::WriteFault(err.to_string()))
    }

    fn cleanup(&self, path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        if !info.delete_on_close() {
            return Ok(());
        }
        let full = self.resolve(path)?;
        if fs::metadata(&full)?.is_dir() {
            fs::remove_dir(&full)?;
        } else {
            fs::remove_file(&full)?;
        }
        Ok(())
    }

    fn close(&self, _path: &NormalizedPath, info: &FileInfo<'_>) -> Result<()> {
        info.take_token();
        Ok(())
    }

    fn truncate(&self, path: &NormalizedPath) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.resolve(path)?)?;
        Ok(())
    }

    fn set_allocation_size(&self, path: &NormalizedPath, size: u64, _info: &FileInfo<'_>) -> Result<()> {
        let file = open_for_write(&self.resolve(path)?)?;
        if size < file.metadata()?.len() {
            file.set_len(size)?;
        }
        Ok(())
    }

    fn set_end_of_file(&self, path: &NormalizedPath, size: u64, _info: &FileInfo<'_>) -> Result<()> {
        open_for_write(&self.resolve(path)?)?.set_len(size)?;
        Ok(())
    }

    fn set_attributes(
        &self,
        path: &NormalizedPath,
        attributes: EnumSet<FileAttribute>,
        _info: &FileInfo<'_>,
    ) -> Result<()> {
        // Only the read-only bit has a portable host equivalent.
        let full = self.resolve(path)?;
        let mut permissions = fs::metadata(&full)?.permissions();
        permissions.set_readonly(attributes.contains(FileAttribute::ReadOnly));
        fs::set_permissions(&full, permissions)?;
        Ok(())
    }

    fn get_metadata(&self, path: &NormalizedPath, _info: &FileInfo<'_>) -> Result<FileMetadata> {
        let meta = fs::metadata(self.resolve(path)?)?;
        let name = path.file_name().unwrap_or("/");
        Ok(self.metadata_for(name, &meta))
    }

    fn set_times(&self, path: &NormalizedPath, times: &FileTimes, _info: &FileInfo<'_>) -> Result<()> {
        if times.last_access.is_none() && times.last_write.is_none() {
            return Ok(());
        }
        let full = self.resolve(path)?;
        let file = if fs::metadata(&full)?.is_dir() {
            File::open(&full)?
        } else {
            open_for_write(&full)?
        };
        let mut host = fs::FileTimes::new();
        if let Some(t) = times.last_access {
            host = host.set_accessed(t.to_system_time());
        }
        if let Some(t) = times.last_write {
            host = host.set_modified(t.to_system_time());
        }
        file.set_times(host)?;
        Ok(())
    }
}
