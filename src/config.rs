//! Deployment configuration for the core.
//!
//! Sizing is decided once, when the core is built; nothing here can be
//! changed on a live table.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Table size for workstation and server deployments
pub const WORKSTATION_TT_BYTES: usize = 256 * 1024 * 1024;

/// Table size for memory-constrained embedded deployments
pub const EMBEDDED_TT_BYTES: usize = 64 * 1024;

/// Transposition table sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TtConfig {
    /// Memory budget in bytes; rounded down to whole buckets (minimum one)
    pub size_bytes: usize,
}

impl TtConfig {
    #[must_use]
    pub const fn workstation() -> Self {
        Self {
            size_bytes: WORKSTATION_TT_BYTES,
        }
    }

    #[must_use]
    pub const fn embedded() -> Self {
        Self {
            size_bytes: EMBEDDED_TT_BYTES,
        }
    }

    #[must_use]
    pub const fn with_megabytes(size_mb: usize) -> Self {
        Self {
            size_bytes: size_mb * 1024 * 1024,
        }
    }
}

impl Default for TtConfig {
    fn default() -> Self {
        if cfg!(feature = "embedded") {
            Self::embedded()
        } else {
            Self::workstation()
        }
    }
}

/// Everything needed to build a [`crate::Core`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoreConfig {
    pub tt: TtConfig,
    /// Weight file to load; `None` uses the embedded network
    pub network_path: Option<PathBuf>,
}
