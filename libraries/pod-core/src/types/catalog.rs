/// Catalog descriptors
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a sync a catalog represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Local mirror catalog; track paths are absolute
    Local,
    /// On-device catalog; track paths are relative to the mount point
    Device,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Device => write!(f, "device"),
        }
    }
}

/// Storage capacity of the filesystem backing a catalog, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub available: u64,
}
