//! Status codes returned across the driver boundary
//!
//! Backends speak [`Error`]; the driver speaks [`StatusCode`]. The translation
//! is a pure function of the error kind and the operation that produced it.

use std::fmt;

use crate::error::{Error, ErrorKind, Result};

/// The closed vocabulary of results the driver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    BufferOverflow,
    Unsuccessful,
    NotImplemented,
    InvalidHandle,
    InvalidParameter,
    AccessDenied,
    ObjectNameNotFound,
    ObjectNameCollision,
    FileLockConflict,
    MediaWriteProtected,
    FileIsADirectory,
    DirectoryNotEmpty,
    NotADirectory,
    /// Win32 `ERROR_WRITE_FAULT`
    WriteFault,
    /// Win32 `ERROR_READ_FAULT`
    ReadFault,
}

impl StatusCode {
    /// Raw value placed in the driver's result slot.
    pub const fn code(self) -> u32 {
        match self {
            StatusCode::Success => 0,
            StatusCode::BufferOverflow => 0x8000_0005,
            StatusCode::Unsuccessful => 0xC000_0001,
            StatusCode::NotImplemented => 0xC000_0002,
            StatusCode::InvalidHandle => 0xC000_0008,
            StatusCode::InvalidParameter => 0xC000_000D,
            StatusCode::AccessDenied => 0xC000_0022,
            StatusCode::ObjectNameNotFound => 0xC000_0034,
            StatusCode::ObjectNameCollision => 0xC000_0035,
            StatusCode::FileLockConflict => 0xC000_0054,
            StatusCode::MediaWriteProtected => 0xC000_00A2,
            StatusCode::FileIsADirectory => 0xC000_00BA,
            StatusCode::DirectoryNotEmpty => 0xC000_0101,
            StatusCode::NotADirectory => 0xC000_0103,
            StatusCode::WriteFault => 29,
            StatusCode::ReadFault => 30,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:08X})", self, self.code())
    }
}

/// Every request kind the driver can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Cleanup,
    Close,
    Read,
    Write,
    Flush,
    GetMetadata,
    Enumerate,
    EnumerateWithPattern,
    SetAttributes,
    SetTimes,
    DeleteFileCheck,
    DeleteDirectoryCheck,
    MoveFile,
    SetEndOfFile,
    SetAllocationSize,
    Lock,
    Unlock,
    GetDiskFreeSpace,
    GetVolumeInformation,
    Mounted,
    Unmounted,
    GetSecurity,
    SetSecurity,
    EnumerateStreams,
}

impl OperationKind {
    pub const ALL: [OperationKind; 25] = [
        OperationKind::Create,
        OperationKind::Cleanup,
        OperationKind::Close,
        OperationKind::Read,
        OperationKind::Write,
        OperationKind::Flush,
        OperationKind::GetMetadata,
        OperationKind::Enumerate,
        OperationKind::EnumerateWithPattern,
        OperationKind::SetAttributes,
        OperationKind::SetTimes,
        OperationKind::DeleteFileCheck,
        OperationKind::DeleteDirectoryCheck,
        OperationKind::MoveFile,
        OperationKind::SetEndOfFile,
        OperationKind::SetAllocationSize,
        OperationKind::Lock,
        OperationKind::Unlock,
        OperationKind::GetDiskFreeSpace,
        OperationKind::GetVolumeInformation,
        OperationKind::Mounted,
        OperationKind::Unmounted,
        OperationKind::GetSecurity,
        OperationKind::SetSecurity,
        OperationKind::EnumerateStreams,
    ];

    /// Stable name used in log events.
    pub const fn name(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Cleanup => "cleanup",
            OperationKind::Close => "close",
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Flush => "flush",
            OperationKind::GetMetadata => "get_metadata",
            OperationKind::Enumerate => "enumerate",
            OperationKind::EnumerateWithPattern => "enumerate_with_pattern",
            OperationKind::SetAttributes => "set_attributes",
            OperationKind::SetTimes => "set_times",
            OperationKind::DeleteFileCheck => "delete_file_check",
            OperationKind::DeleteDirectoryCheck => "delete_directory_check",
            OperationKind::MoveFile => "move_file",
            OperationKind::SetEndOfFile => "set_end_of_file",
            OperationKind::SetAllocationSize => "set_allocation_size",
            OperationKind::Lock => "lock",
            OperationKind::Unlock => "unlock",
            OperationKind::GetDiskFreeSpace => "get_disk_free_space",
            OperationKind::GetVolumeInformation => "get_volume_information",
            OperationKind::Mounted => "mounted",
            OperationKind::Unmounted => "unmounted",
            OperationKind::GetSecurity => "get_security",
            OperationKind::SetSecurity => "set_security",
            OperationKind::EnumerateStreams => "enumerate_streams",
        }
    }

    /// Code used when a failure has no more specific mapping.
    pub const fn default_failure(self) -> StatusCode {
        match self {
            OperationKind::Read => StatusCode::ReadFault,
            OperationKind::Write | OperationKind::Flush => StatusCode::WriteFault,
            _ => StatusCode::Unsuccessful,
        }
    }

    /// True for requests that change volume contents.
    ///
    /// `Create` is mutating only for dispositions other than open-existing;
    /// the dispatcher decides that case itself.
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            OperationKind::Write
                | OperationKind::Flush
                | OperationKind::SetAttributes
                | OperationKind::SetTimes
                | OperationKind::DeleteFileCheck
                | OperationKind::DeleteDirectoryCheck
                | OperationKind::MoveFile
                | OperationKind::SetEndOfFile
                | OperationKind::SetAllocationSize
                | OperationKind::SetSecurity
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Translate a backend error for a given operation.
pub fn translate_error(err: &Error, op: OperationKind) -> StatusCode {
    match err.kind() {
        ErrorKind::IllegalPath => StatusCode::ObjectNameNotFound,
        // A file vanishing mid-transfer is a transfer fault.
        ErrorKind::NotFound if matches!(op, OperationKind::Read | OperationKind::Write) => {
            op.default_failure()
        }
        ErrorKind::NotFound => StatusCode::ObjectNameNotFound,
        ErrorKind::AlreadyExists => StatusCode::ObjectNameCollision,
        ErrorKind::AccessDenied => StatusCode::AccessDenied,
        ErrorKind::IsADirectory => StatusCode::FileIsADirectory,
        ErrorKind::NotADirectory => StatusCode::NotADirectory,
        ErrorKind::DirectoryNotEmpty => StatusCode::DirectoryNotEmpty,
        ErrorKind::LockConflict => StatusCode::FileLockConflict,
        ErrorKind::WriteProtected => StatusCode::MediaWriteProtected,
        ErrorKind::InvalidParameter => StatusCode::InvalidParameter,
        ErrorKind::ReadFault => StatusCode::ReadFault,
        ErrorKind::WriteFault => StatusCode::WriteFault,
        ErrorKind::Unsupported => StatusCode::NotImplemented,
        ErrorKind::GenericFailure => op.default_failure(),
    }
}

/// Translate a backend outcome for a given operation.
pub fn translate<T>(outcome: &Result<T>, op: OperationKind) -> StatusCode {
    match outcome {
        Ok(_) => StatusCode::Success,
        Err(err) => translate_error(err, op),
    }
}

/// What every dispatcher entry point returns.
pub type DispatchResult<T> = std::result::Result<T, StatusCode>;

/// Collapse a dispatch result to the single code the driver slot receives.
pub trait IntoStatus {
    fn status(&self) -> StatusCode;
}

impl<T> IntoStatus for DispatchResult<T> {
    fn status(&self) -> StatusCode {
        match self {
            Ok(_) => StatusCode::Success,
            Err(code) => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_on_transfer_is_a_fault() {
        let err = Error::not_found("/a");
        assert_eq!(
            translate_error(&err, OperationKind::Read),
            StatusCode::ReadFault
        );
        assert_eq!(
            translate_error(&err, OperationKind::Write),
            StatusCode::WriteFault
        );
        assert_eq!(
            translate_error(&err, OperationKind::GetMetadata),
            StatusCode::ObjectNameNotFound
        );
    }

    #[test]
    fn unsupported_is_always_not_implemented() {
        let err = Error::Unsupported("lock");
        for op in OperationKind::ALL {
            assert_eq!(translate_error(&err, op), StatusCode::NotImplemented);
        }
    }

    #[test]
    fn generic_failures_use_op_default() {
        let err = Error::Internal("boom".into());
        assert_eq!(
            translate_error(&err, OperationKind::Read),
            StatusCode::ReadFault
        );
        assert_eq!(
            translate_error(&err, OperationKind::Flush),
            StatusCode::WriteFault
        );
        assert_eq!(
            translate_error(&err, OperationKind::MoveFile),
            StatusCode::Unsuccessful
        );
    }

    #[test]
    fn illegal_paths_are_not_found() {
        let err: Error = crate::path::NormalizationError::EscapesRoot.into();
        for op in OperationKind::ALL {
            assert_eq!(translate_error(&err, op), StatusCode::ObjectNameNotFound);
        }
    }

    #[test]
    fn success_translates_to_success() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(translate(&ok, OperationKind::Read), StatusCode::Success);
        let dispatched: DispatchResult<u32> = Err(StatusCode::InvalidHandle);
        assert_eq!(dispatched.status(), StatusCode::InvalidHandle);
    }

    #[test]
    fn codes_match_driver_values() {
        assert_eq!(StatusCode::ObjectNameNotFound.code(), 0xC000_0034);
        assert_eq!(StatusCode::ObjectNameCollision.code(), 0xC000_0035);
        assert_eq!(StatusCode::ReadFault.code(), 30);
        assert_eq!(StatusCode::WriteFault.code(), 29);
        assert_eq!(StatusCode::Success.code(), 0);
    }
}
