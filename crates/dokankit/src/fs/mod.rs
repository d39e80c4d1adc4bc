//! Sample backends for dokankit
//!
//! - `MemoryFs`: In-memory volume, always available
//! - `MirrorFs`: Mirrors a host directory (feature `realfs`)

mod memory;
#[cfg(feature = "realfs")]
mod mirror;

pub use memory::MemoryFs;
#[cfg(feature = "realfs")]
pub use mirror::MirrorFs;
