//! Value types exchanged with backends

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::flags::FileAttribute;

/// 100-ns ticks between 1601-01-01 and 1970-01-01.
const EPOCH_DIFFERENCE_TICKS: u64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: u64 = 10_000_000;

/// A timestamp in 100-ns ticks since 1601-01-01 UTC. Zero means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTime(pub u64);

impl FileTime {
    pub const UNSET: FileTime = FileTime(0);

    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// `None` for the unset value.
    pub fn into_option(self) -> Option<FileTime> {
        (!self.is_unset()).then_some(self)
    }

    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= EPOCH_DIFFERENCE_TICKS {
            let ticks = self.0 - EPOCH_DIFFERENCE_TICKS;
            UNIX_EPOCH + ticks_to_duration(ticks)
        } else {
            UNIX_EPOCH - ticks_to_duration(EPOCH_DIFFERENCE_TICKS - self.0)
        }
    }
}

fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * 100) as u32,
    )
}

impl From<SystemTime> for FileTime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => {
                let ticks = since.as_secs() * TICKS_PER_SECOND + u64::from(since.subsec_nanos()) / 100;
                FileTime(EPOCH_DIFFERENCE_TICKS.saturating_add(ticks))
            }
            Err(before) => {
                let d = before.duration();
                let ticks = d.as_secs() * TICKS_PER_SECOND + u64::from(d.subsec_nanos()) / 100;
                FileTime(EPOCH_DIFFERENCE_TICKS.saturating_sub(ticks))
            }
        }
    }
}

/// Timestamps to apply in set-times; `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTimes {
    pub creation: Option<FileTime>,
    pub last_access: Option<FileTime>,
    pub last_write: Option<FileTime>,
}

impl FileTimes {
    /// Build from raw driver values, where zero means "unchanged".
    pub fn from_raw(creation: FileTime, last_access: FileTime, last_write: FileTime) -> Self {
        Self {
            creation: creation.into_option(),
            last_access: last_access.into_option(),
            last_write: last_write.into_option(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.creation.is_none() && self.last_access.is_none() && self.last_write.is_none()
    }
}

/// Metadata for one entry, used both by get-metadata and enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub attributes: EnumSet<FileAttribute>,
    pub creation_time: FileTime,
    pub last_access_time: FileTime,
    pub last_write_time: FileTime,
    pub size: u64,
    pub file_index: u64,
    pub volume_serial_number: u32,
    pub number_of_links: u32,
}

impl FileMetadata {
    /// Metadata for a regular file with all timestamps set to `time`.
    pub fn file(name: impl Into<String>, size: u64, time: FileTime) -> Self {
        Self {
            name: name.into(),
            attributes: EnumSet::only(FileAttribute::Normal),
            creation_time: time,
            last_access_time: time,
            last_write_time: time,
            size,
            file_index: 0,
            volume_serial_number: 0,
            number_of_links: 1,
        }
    }

    /// Metadata for a directory with all timestamps set to `time`.
    pub fn directory(name: impl Into<String>, time: FileTime) -> Self {
        Self {
            attributes: EnumSet::only(FileAttribute::Directory),
            ..Self::file(name, 0, time)
        }
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttribute::Directory)
    }
}

/// One named data stream of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Driver form, e.g. `::$DATA` or `:meta:$DATA`.
    pub name: String,
    pub size: u64,
}

/// Answer to get-disk-free-space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    pub free_bytes_available: u64,
    pub total_bytes: u64,
    pub total_free_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_conversion() {
        let t = FileTime::from(UNIX_EPOCH);
        assert_eq!(t.0, EPOCH_DIFFERENCE_TICKS);
        assert_eq!(t.to_system_time(), UNIX_EPOCH);
    }

    #[test]
    fn sub_second_precision() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_700);
        assert_eq!(FileTime::from(time).to_system_time(), time);
    }

    #[test]
    fn zero_times_are_unchanged() {
        let times = FileTimes::from_raw(FileTime(0), FileTime(5), FileTime::UNSET);
        assert_eq!(times.creation, None);
        assert_eq!(times.last_access, Some(FileTime(5)));
        assert_eq!(times.last_write, None);
        assert!(FileTimes::default().is_empty());
    }

    #[test]
    fn metadata_constructors() {
        let dir = FileMetadata::directory("docs", FileTime(1));
        assert!(dir.is_directory());
        let file = FileMetadata::file("a.txt", 3, FileTime(1));
        assert!(!file.is_directory());
        assert_eq!(file.size, 3);
    }
}
