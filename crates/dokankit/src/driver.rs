//! Driver boundary
//!
//! The native driver is not implemented here. [`NativeDriver`] is the seam a
//! platform binding plugs into: it receives the device options and a shared
//! [`Dispatcher`], runs the request loop, and reports a signed status.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::info;

use crate::config::DeviceOptions;
use crate::dispatch::Dispatcher;

/// Why a mount could not be started.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountError {
    #[error("mount failed")]
    General,
    #[error("bad drive letter")]
    DriveLetter,
    #[error("cannot install driver")]
    DriverInstall,
    #[error("driver failed to start")]
    Start,
    #[error("cannot assign a drive letter or mount point")]
    CannotAssign,
    #[error("mount point is invalid")]
    MountPoint,
    #[error("driver version is not supported")]
    Version,
    /// A negative code outside the documented range.
    #[error("driver returned unknown status {0}")]
    Unknown(i32),
}

impl MountError {
    /// Map a driver return value. Non-negative values are not errors.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0.. => None,
            -1 => Some(MountError::General),
            -2 => Some(MountError::DriveLetter),
            -3 => Some(MountError::DriverInstall),
            -4 => Some(MountError::Start),
            -5 => Some(MountError::CannotAssign),
            -6 => Some(MountError::MountPoint),
            -7 => Some(MountError::Version),
            other => Some(MountError::Unknown(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            MountError::General => -1,
            MountError::DriveLetter => -2,
            MountError::DriverInstall => -3,
            MountError::Start => -4,
            MountError::CannotAssign => -5,
            MountError::MountPoint => -6,
            MountError::Version => -7,
            MountError::Unknown(code) => code,
        }
    }
}

/// A platform binding that serves a dispatcher from a kernel driver.
pub trait NativeDriver: Send + Sync {
    /// Library version of the binding.
    fn version(&self) -> u32;

    /// Version of the installed kernel driver.
    fn driver_version(&self) -> u32;

    /// Mount and serve requests until unmounted. Negative returns are
    /// [`MountError`] codes.
    fn run(&self, options: &DeviceOptions, dispatcher: Arc<Dispatcher>) -> i32;

    /// Ask the driver to unmount. Returns false if nothing was mounted there.
    fn unmount(&self, mount_point: &str) -> bool;
}

/// One mount of a dispatcher through a driver.
pub struct Mount<D: NativeDriver> {
    driver: D,
    options: DeviceOptions,
    dispatcher: Arc<Dispatcher>,
}

impl<D: NativeDriver> Mount<D> {
    pub fn new(driver: D, dispatcher: Arc<Dispatcher>) -> Self {
        let options = dispatcher.device_options().clone();
        Self {
            driver,
            options,
            dispatcher,
        }
    }

    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the driver loop. Blocks until the driver returns.
    pub fn start(&self) -> Result<(), MountError> {
        init();
        info!(
            mount_point = %self.options.mount_point,
            driver_version = self.driver.driver_version(),
            "starting mount"
        );
        let code = self.driver.run(&self.options, Arc::clone(&self.dispatcher));
        match MountError::from_code(code) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Unmount. Returns false if the driver had nothing mounted there.
    pub fn stop(&self) -> bool {
        info!(mount_point = %self.options.mount_point, "stopping mount");
        self.driver.unmount(&self.options.mount_point)
    }
}

static INIT: OnceLock<()> = OnceLock::new();

/// One-time global initialization. Safe to call any number of times.
pub fn init() {
    INIT.get_or_init(|| {
        info!(version = env!("CARGO_PKG_VERSION"), "dokankit initialized");
    });
}

/// True once [`init`] has run.
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
