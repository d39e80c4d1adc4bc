//! Error types for dokankit
//!
//! This module provides the error taxonomy shared by backends and the
//! dispatcher with the following design goals:
//! - Every backend method returns a typed [`Result`]; nothing is thrown across
//!   the driver boundary
//! - Each error classifies into exactly one [`ErrorKind`], which the status
//!   translator turns into a driver status code
//! - Messages are human-readable and never carry raw buffers or handles

use std::io;

use thiserror::Error;

use crate::path::NormalizationError;

/// Result type alias using dokankit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// dokankit error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The incoming path could not be normalized.
    #[error("illegal path: {0}")]
    IllegalPath(#[from] NormalizationError),

    /// The path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The request is not allowed.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A file operation was attempted on a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// A directory operation was attempted on a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A directory still has children.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// A byte range is locked by another handle.
    #[error("lock conflict: {0}")]
    LockConflict(String),

    /// The volume is mounted write-protected.
    #[error("volume is write-protected")]
    WriteProtected,

    /// A numeric or enumerated argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reading from the backing store failed.
    #[error("read fault: {0}")]
    ReadFault(String),

    /// Writing to the backing store failed.
    #[error("write fault: {0}")]
    WriteFault(String),

    /// The backend does not implement this capability.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// I/O error from a host filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Internal error for unexpected failures.
    ///
    /// Used for contained backend panics and poisoned locks. The message is a
    /// fixed description, never the panic payload.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure classification consumed by the status translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IllegalPath,
    NotFound,
    AlreadyExists,
    AccessDenied,
    IsADirectory,
    NotADirectory,
    DirectoryNotEmpty,
    LockConflict,
    WriteProtected,
    InvalidParameter,
    ReadFault,
    WriteFault,
    Unsupported,
    GenericFailure,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IllegalPath(_) => ErrorKind::IllegalPath,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::AccessDenied(_) => ErrorKind::AccessDenied,
            Error::IsADirectory(_) => ErrorKind::IsADirectory,
            Error::NotADirectory(_) => ErrorKind::NotADirectory,
            Error::DirectoryNotEmpty(_) => ErrorKind::DirectoryNotEmpty,
            Error::LockConflict(_) => ErrorKind::LockConflict,
            Error::WriteProtected => ErrorKind::WriteProtected,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::ReadFault(_) => ErrorKind::ReadFault,
            Error::WriteFault(_) => ErrorKind::WriteFault,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Io(err) => io_kind(err),
            Error::Config(_) | Error::Internal(_) => ErrorKind::GenericFailure,
        }
    }

    /// Create a not-found error for a path.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Error for a poisoned lock.
    pub(crate) fn poisoned() -> Self {
        Self::Internal("lock poisoned".to_string())
    }
}

fn io_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
        io::ErrorKind::IsADirectory => ErrorKind::IsADirectory,
        io::ErrorKind::NotADirectory => ErrorKind::NotADirectory,
        io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
        io::ErrorKind::ReadOnlyFilesystem => ErrorKind::WriteProtected,
        io::ErrorKind::InvalidInput => ErrorKind::InvalidParameter,
        io::ErrorKind::Unsupported => ErrorKind::Unsupported,
        _ => ErrorKind::GenericFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_classify_by_kind() {
        let err: Error = io::Error::from(io::ErrorKind::NotFound).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);

        let err: Error = io::Error::other("disk on fire").into();
        assert_eq!(err.kind(), ErrorKind::GenericFailure);
    }

    #[test]
    fn normalization_errors_are_illegal_paths() {
        let err: Error = NormalizationError::EscapesRoot.into();
        assert_eq!(err.kind(), ErrorKind::IllegalPath);
        assert!(err.to_string().contains("illegal path"));
    }

    #[test]
    fn internal_errors_are_generic() {
        assert_eq!(Error::poisoned().kind(), ErrorKind::GenericFailure);
        assert_eq!(
            Error::Config("bad json".into()).kind(),
            ErrorKind::GenericFailure
        );
    }
}
