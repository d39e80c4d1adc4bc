//! Dokankit - User-mode filesystem adapter for Dokan-style drivers
//!
//! A virtual-filesystem driver issues callback requests (create, read, write,
//! enumerate, delete, ...). Dokankit normalizes each request's path, routes it
//! to a pluggable [`FileSystem`] backend, and translates the backend's result
//! into the [`StatusCode`] the driver expects.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dokankit::{
//!     CreateArgs, CreationDisposition, Dispatcher, IntoStatus, MemoryFs, RequestInfo, StatusCode,
//! };
//!
//! let fs = Arc::new(MemoryFs::new());
//! fs.add_dir("/docs").unwrap();
//! let dispatcher = Dispatcher::new(fs);
//!
//! let req = RequestInfo::new(1);
//! let is_dir = dispatcher
//!     .create(&req, "\\docs\\a.txt", &CreateArgs::new(CreationDisposition::CreateNew))
//!     .unwrap();
//! assert!(!is_dir);
//!
//! assert_eq!(dispatcher.write(&req, "\\docs\\a.txt", b"hello", 0), Ok(5));
//! let mut buf = [0u8; 16];
//! assert_eq!(dispatcher.read(&req, "\\docs\\a.txt", &mut buf, 0), Ok(5));
//!
//! assert_eq!(dispatcher.cleanup(&req, "\\docs\\a.txt").status(), StatusCode::Success);
//! assert_eq!(dispatcher.close(&req, "\\docs\\a.txt").status(), StatusCode::Success);
//! assert_eq!(dispatcher.open_handles(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`path`] | Canonical path form |
//! | [`wildcard`] | `?`/`*` matching for enumeration |
//! | [`status`] | Error to status-code translation |
//! | [`context`] | Per-handle state |
//! | [`dispatch`] | Request routing |
//! | [`backend`] | The backend trait |
//! | [`driver`] | Native driver seam and mount lifecycle |

pub mod backend;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod driver;
mod error;
pub mod flags;
pub mod fs;
mod logging_impl;
pub mod path;
pub mod status;
pub mod types;
pub mod wildcard;

pub use backend::{apply_disposition, CreateOutcome, CreateRequest, FileSystem};
pub use config::{AdapterConfig, DeviceOptions, FreeSpace, VolumeInformation};
pub use context::{
    BackendToken, FileContext, FileInfo, HandleId, HandleState, IoFlags, RequestInfo,
};
pub use dispatch::{CreateArgs, Dispatcher, DispatcherBuilder};
pub use driver::{init, Mount, MountError, NativeDriver};
pub use enumset::{EnumSet, enum_set};
pub use error::{Error, ErrorKind, Result};
pub use flags::{
    CreateOption, CreationDisposition, FileAccess, FileAttribute, FileShare, FileSystemFeature,
    MountOption,
};
pub use fs::MemoryFs;
#[cfg(feature = "realfs")]
pub use fs::MirrorFs;
pub use logging_impl::{sanitize_for_log, LogConfig};
pub use path::{normalize, normalize_directory, NormalizationError, NormalizedPath};
pub use status::{
    translate, translate_error, DispatchResult, IntoStatus, OperationKind, StatusCode,
};
pub use types::{DiskSpace, FileMetadata, FileTime, FileTimes, StreamInfo};
pub use wildcard::{matches, PatternError, WildcardPattern};
