//! Flag enumerations
//!
//! Every bitmask the driver passes is decoded into an [`EnumSet`] of one of
//! these enums. Discriminants are bit positions, so `as_u32` reproduces the
//! driver's raw mask. Unknown bits are dropped on decode.

use enumset::{EnumSet, EnumSetType};

/// Decode a raw driver mask, discarding bits with no variant.
pub fn decode<T: EnumSetType>(raw: u32) -> EnumSet<T> {
    EnumSet::from_u32_truncated(raw)
}

/// File attributes (`FILE_ATTRIBUTE_*`).
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum FileAttribute {
    ReadOnly = 0,
    Hidden = 1,
    System = 2,
    Directory = 4,
    Archive = 5,
    Device = 6,
    Normal = 7,
    Temporary = 8,
    SparseFile = 9,
    ReparsePoint = 10,
    Compressed = 11,
    Offline = 12,
    NotContentIndexed = 13,
    Encrypted = 14,
    IntegrityStream = 15,
    Virtual = 16,
    NoScrubData = 17,
}

/// Access rights requested on create.
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum FileAccess {
    ReadData = 0,
    WriteData = 1,
    AppendData = 2,
    ReadEa = 3,
    WriteEa = 4,
    Execute = 5,
    DeleteChild = 6,
    ReadAttributes = 7,
    WriteAttributes = 8,
    Delete = 16,
    ReadControl = 17,
    WriteDac = 18,
    WriteOwner = 19,
    Synchronize = 20,
    AccessSystemSecurity = 24,
    MaximumAllowed = 25,
    GenericAll = 28,
    GenericExecute = 29,
    GenericWrite = 30,
    GenericRead = 31,
}

/// Share modes requested on create.
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum FileShare {
    Read = 0,
    Write = 1,
    Delete = 2,
}

/// Create options (`FILE_*` create flags).
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum CreateOption {
    DirectoryFile = 0,
    WriteThrough = 1,
    SequentialOnly = 2,
    NoIntermediateBuffering = 3,
    SynchronousIoAlert = 4,
    SynchronousIoNonalert = 5,
    NonDirectoryFile = 6,
    CompleteIfOplocked = 8,
    RandomAccess = 11,
    DeleteOnClose = 12,
    OpenByFileId = 13,
    OpenForBackupIntent = 14,
    NoCompression = 15,
    OpenReparsePoint = 21,
}

/// Mount behavior switches.
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum MountOption {
    DebugMode = 0,
    StdErrOutput = 1,
    AltStream = 2,
    WriteProtection = 3,
    NetworkDrive = 4,
    RemovableDrive = 5,
    MountManager = 6,
    CurrentSession = 7,
    FileLockUserMode = 8,
}

/// Volume capabilities reported by get-volume-information.
#[derive(EnumSetType, Debug, Hash)]
#[enumset(serialize_repr = "u32")]
pub enum FileSystemFeature {
    CaseSensitiveSearch = 0,
    CasePreservedNames = 1,
    UnicodeOnDisk = 2,
    PersistentAcls = 3,
    FileCompression = 4,
    VolumeQuotas = 5,
    SupportsSparseFiles = 6,
    SupportsReparsePoints = 7,
    SupportsRemoteStorage = 8,
    VolumeIsCompressed = 15,
    SupportsObjectIds = 16,
    SupportsEncryption = 17,
    NamedStreams = 18,
    ReadOnlyVolume = 19,
    SequentialWriteOnce = 20,
    SupportsTransactions = 21,
}

/// What create should do depending on whether the target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationDisposition {
    /// Fail if it exists, else create.
    CreateNew = 1,
    /// Truncate if it exists, else create.
    CreateAlways = 2,
    /// Open if it exists, else fail.
    OpenExisting = 3,
    /// Open if it exists, else create.
    OpenAlways = 4,
    /// Truncate if it exists, else fail.
    TruncateExisting = 5,
}

impl CreationDisposition {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::CreateNew),
            2 => Some(Self::CreateAlways),
            3 => Some(Self::OpenExisting),
            4 => Some(Self::OpenAlways),
            5 => Some(Self::TruncateExisting),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    /// True if this disposition may create or modify the target.
    pub fn may_modify(self) -> bool {
        self != Self::OpenExisting
    }
}
