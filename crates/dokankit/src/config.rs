//! Mount configuration
//!
//! These structs are passed through to the driver unchanged. They load from
//! JSON; missing fields take the defaults below.
//!
//! ```json
//! {
//!   "device": { "mount_point": "M:\\", "thread_count": 4, "mount_options": 8 },
//!   "volume": { "name": "SCRATCH" },
//!   "free_space": { "total_bytes": 1073741824, "used_bytes": 0 }
//! }
//! ```

use std::path::Path;

use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flags::{FileSystemFeature, MountOption};

/// Driver interface version these options target.
pub const DEVICE_OPTIONS_VERSION: u16 = 105;

/// Options handed to the driver at mount time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOptions {
    /// Default: 105
    pub version: u16,

    /// Drive letter or directory to mount on.
    pub mount_point: String,

    /// Driver worker threads; 0 lets the driver decide.
    pub thread_count: u16,

    pub mount_options: EnumSet<MountOption>,

    /// UNC name for network drives.
    pub unc_name: Option<String>,

    /// Request timeout in milliseconds; 0 uses the driver default.
    pub timeout_ms: u64,

    pub allocation_unit_size: u32,
    pub sector_size: u32,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            version: DEVICE_OPTIONS_VERSION,
            mount_point: String::new(),
            thread_count: 0,
            mount_options: EnumSet::new(),
            unc_name: None,
            timeout_ms: 0,
            allocation_unit_size: 0,
            sector_size: 0,
        }
    }
}

impl DeviceOptions {
    pub fn new(mount_point: impl Into<String>) -> Self {
        Self {
            mount_point: mount_point.into(),
            ..Self::default()
        }
    }

    pub fn thread_count(mut self, count: u16) -> Self {
        self.thread_count = count;
        self
    }

    /// Add a mount option.
    pub fn with_option(mut self, option: MountOption) -> Self {
        self.mount_options.insert(option);
        self
    }

    pub fn unc_name(mut self, name: impl Into<String>) -> Self {
        self.unc_name = Some(name.into());
        self
    }

    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout_ms = timeout;
        self
    }

    pub fn allocation_unit_size(mut self, size: u32) -> Self {
        self.allocation_unit_size = size;
        self
    }

    pub fn sector_size(mut self, size: u32) -> Self {
        self.sector_size = size;
        self
    }

    pub fn has(&self, option: MountOption) -> bool {
        self.mount_options.contains(option)
    }
}

/// Answer to get-volume-information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeInformation {
    /// Default: "VOLUME1"
    pub name: String,

    /// Default: 0x12345678
    pub serial_number: u32,

    /// Default: 256
    pub max_component_length: u32,

    /// Default: "DOKANY"
    pub file_system_name: String,

    /// Default: case-preserved names
    pub features: EnumSet<FileSystemFeature>,
}

impl Default for VolumeInformation {
    fn default() -> Self {
        Self {
            name: "VOLUME1".to_string(),
            serial_number: 0x1234_5678,
            max_component_length: 256,
            file_system_name: "DOKANY".to_string(),
            features: EnumSet::only(FileSystemFeature::CasePreservedNames),
        }
    }
}

impl VolumeInformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn serial_number(mut self, serial: u32) -> Self {
        self.serial_number = serial;
        self
    }

    pub fn max_component_length(mut self, len: u32) -> Self {
        self.max_component_length = len;
        self
    }

    pub fn file_system_name(mut self, name: impl Into<String>) -> Self {
        self.file_system_name = name.into();
        self
    }

    pub fn with_feature(mut self, feature: FileSystemFeature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn case_sensitive(&self) -> bool {
        self.features.contains(FileSystemFeature::CaseSensitiveSearch)
    }

    /// A copy with both names cut to the caller's buffer capacities (chars).
    pub fn truncated(&self, name_capacity: usize, file_system_name_capacity: usize) -> Self {
        Self {
            name: trim_to_size(&self.name, name_capacity),
            file_system_name: trim_to_size(&self.file_system_name, file_system_name_capacity),
            ..self.clone()
        }
    }
}

fn trim_to_size(value: &str, capacity: usize) -> String {
    value.chars().take(capacity).collect()
}

/// Capacity figures reported by get-disk-free-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSpace {
    /// Default: 1 GiB
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl Default for FreeSpace {
    fn default() -> Self {
        Self {
            total_bytes: 1 << 30,
            used_bytes: 0,
        }
    }
}

impl FreeSpace {
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        Self {
            total_bytes,
            used_bytes,
        }
    }

    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }
}

/// Everything a mount needs, loadable from one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub device: DeviceOptions,
    pub volume: VolumeInformation,
    pub free_space: FreeSpace,
}

impl AdapterConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let volume = VolumeInformation::default();
        assert_eq!(volume.name, "VOLUME1");
        assert_eq!(volume.serial_number, 0x1234_5678);
        assert_eq!(volume.max_component_length, 256);
        assert_eq!(volume.file_system_name, "DOKANY");
        assert!(!volume.case_sensitive());
        assert_eq!(DeviceOptions::default().version, 105);
    }

    #[test]
    fn free_space_never_underflows() {
        assert_eq!(FreeSpace::new(100, 30).free_bytes(), 70);
        assert_eq!(FreeSpace::new(10, 30).free_bytes(), 0);
    }

    #[test]
    fn names_truncate_by_chars() {
        let volume = VolumeInformation::new().name("ÄBCDEF");
        let cut = volume.truncated(3, 2);
        assert_eq!(cut.name, "ÄBC");
        assert_eq!(cut.file_system_name, "DO");
        assert_eq!(cut.serial_number, volume.serial_number);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = AdapterConfig::from_json_str(
            r#"{"device": {"mount_point": "M:\\", "mount_options": 9}, "volume": {"name": "SCRATCH"}}"#,
        )
        .unwrap();
        assert_eq!(config.device.mount_point, "M:\\");
        assert!(config.device.has(MountOption::DebugMode));
        assert!(config.device.has(MountOption::WriteProtection));
        assert_eq!(config.volume.name, "SCRATCH");
        assert_eq!(config.volume.file_system_name, "DOKANY");
        assert_eq!(config.free_space, FreeSpace::default());
    }

    #[test]
    fn json_round_trip() {
        let config = AdapterConfig {
            device: DeviceOptions::new("M:\\")
                .thread_count(4)
                .with_option(MountOption::AltStream),
            ..AdapterConfig::default()
        };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(AdapterConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = AdapterConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
