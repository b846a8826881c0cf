//! Pattern-based track selection shared by delete, list, update and playlist commands

use pod_core::{Catalog, PodError, Track};
use regex::RegexBuilder;
use std::ops::BitOr;
use std::path::{Component, Path, PathBuf};

/// Which text fields a regex pattern is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMask(u8);

impl FieldMask {
    pub const TITLE: Self = Self(0x1);
    pub const ARTIST: Self = Self(0x2);
    pub const ALBUM: Self = Self(0x4);
    pub const ALL: Self = Self(0x7);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FieldMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive regex over the selected fields
    Fields(FieldMask),
    /// Prefix match of the catalog path against an absolute filesystem path
    Path,
}

impl MatchMode {
    /// Mask 0 selects path mode
    pub fn from_mask(mask: u8) -> Self {
        match mask & FieldMask::ALL.bits() {
            0 => Self::Path,
            bits => Self::Fields(FieldMask(bits)),
        }
    }
}

/// Tracks matching `pattern`, in catalog order
///
/// # Errors
/// `InvalidInput` if the pattern is not a valid regex in field mode
pub fn find_tracks<'a>(
    catalog: &'a dyn Catalog,
    pattern: &str,
    mode: MatchMode,
) -> pod_core::Result<Vec<&'a Track>> {
    match mode {
        MatchMode::Fields(mask) => {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| PodError::invalid_input(format!("bad pattern '{pattern}': {e}")))?;

            Ok(catalog
                .tracks()
                .iter()
                .filter(|t| {
                    (mask.contains(FieldMask::TITLE) && re.is_match(&t.title))
                        || (mask.contains(FieldMask::ARTIST)
                            && re.is_match(t.artist.as_deref().unwrap_or_default()))
                        || (mask.contains(FieldMask::ALBUM)
                            && re.is_match(t.album.as_deref().unwrap_or_default()))
                })
                .collect())
        }
        MatchMode::Path => {
            let prefix = absolutize(Path::new(pattern));
            Ok(catalog
                .tracks()
                .iter()
                .filter(|t| {
                    t.path
                        .as_deref()
                        .filter(|p| !p.is_empty())
                        .is_some_and(|p| Path::new(p).starts_with(&prefix))
                })
                .collect())
        }
    }
}

/// Make a path absolute against the current directory and drop `.`/`..`
/// components without touching the filesystem
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
