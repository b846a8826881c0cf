//! Extended metadata side-store for the local catalog
//!
//! Line-oriented `key=value` file compatible with gtkpod's extended info
//! format:
//!
//! ```text
//! itunesdb_hash=<sha1 of the catalog file>
//! version=0.99.1
//! id=1
//! filename_locale=/music/a.mp3
//! md5_hash=<sha1 of size + first 16 KiB>
//! transferred=1
//! id=xxx
//! ```

use crate::error::Result;
use crate::files::parent_dir;
use pod_core::{Catalog, TrackId};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const EXT_VERSION: &str = "0.99.1";
/// Bytes of file content covered by a track hash
pub const HASH_PREFIX_BYTES: u64 = 16_384;

const HEADER_HASH_KEY: &str = "itunesdb_hash";
const VERSION_KEY: &str = "version";
const ID_KEY: &str = "id";
const SENTINEL: &str = "xxx";

/// Per-track field of the extended store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtField {
    /// Mount-relative path of the transferred copy
    FilenameIpod,
    FilenameUtf8,
    /// Local path of the source file
    FilenameLocale,
    /// Content hash (SHA-1, the key name is historical)
    Md5Hash,
}

impl ExtField {
    pub const fn key(self) -> &'static str {
        match self {
            Self::FilenameIpod => "filename_ipod",
            Self::FilenameUtf8 => "filename_utf8",
            Self::FilenameLocale => "filename_locale",
            Self::Md5Hash => "md5_hash",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        [
            Self::FilenameIpod,
            Self::FilenameUtf8,
            Self::FilenameLocale,
            Self::Md5Hash,
        ]
        .into_iter()
        .find(|f| f.key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedRecord {
    pub filename_ipod: Option<String>,
    pub filename_utf8: Option<String>,
    pub filename_locale: Option<String>,
    pub md5_hash: Option<String>,
}

impl ExtendedRecord {
    fn slot(&mut self, field: ExtField) -> &mut Option<String> {
        match field {
            ExtField::FilenameIpod => &mut self.filename_ipod,
            ExtField::FilenameUtf8 => &mut self.filename_utf8,
            ExtField::FilenameLocale => &mut self.filename_locale,
            ExtField::Md5Hash => &mut self.md5_hash,
        }
    }

    pub fn get(&self, field: ExtField) -> Option<&str> {
        match field {
            ExtField::FilenameIpod => self.filename_ipod.as_deref(),
            ExtField::FilenameUtf8 => self.filename_utf8.as_deref(),
            ExtField::FilenameLocale => self.filename_locale.as_deref(),
            ExtField::Md5Hash => self.md5_hash.as_deref(),
        }
    }
}

/// Outcome of [`ExtendedMetadata::persist`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub records: usize,
    pub hashed: usize,
}

/// How the store's header checksum compared with the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HeaderCheck {
    #[default]
    Missing,
    Mismatch,
    Matches,
}

#[derive(Debug, Clone, Default)]
pub struct ExtendedMetadata {
    records: BTreeMap<TrackId, ExtendedRecord>,
    header: HeaderCheck,
    missing_paths: Vec<(TrackId, String)>,
}

impl ExtendedMetadata {
    /// Load the store and reconcile it with the local catalog
    ///
    /// A missing store is created empty. A header checksum that is absent or
    /// doesn't match `catalog_path` is logged, not fatal. Tracks without a
    /// record get one from their catalog path.
    pub fn load(store_path: &Path, catalog_path: &Path, local: &dyn Catalog) -> Result<Self> {
        let checksum = file_hash(catalog_path);
        let mut store = Self::default();

        match fs::read_to_string(store_path) {
            Ok(raw) => store.parse(&raw, checksum.as_deref()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No extended info file, will create");
            }
            Err(e) => return Err(e.into()),
        }

        for track in local.tracks() {
            let path = track.path.as_deref().unwrap_or_default();
            let record = store.records.entry(track.id).or_default();
            match &record.filename_locale {
                None => record.filename_locale = Some(path.to_string()),
                Some(locale) if path.is_empty() && !locale.is_empty() => {
                    store.missing_paths.push((track.id, locale.clone()));
                }
                Some(_) => {}
            }
        }

        Ok(store)
    }

    fn parse(&mut self, raw: &str, checksum: Option<&str>) {
        self.header = HeaderCheck::Missing;
        let mut current: Option<TrackId> = None;
        for line in raw.lines() {
            let Some((key, value)) = line.trim_end_matches('\r').split_once('=') else {
                continue;
            };
            match key {
                VERSION_KEY => {}
                HEADER_HASH_KEY if checksum == Some(value) => self.header = HeaderCheck::Matches,
                HEADER_HASH_KEY => {
                    self.header = HeaderCheck::Mismatch;
                    warn!("Checksum for local catalog doesn't match extended info");
                }
                ID_KEY if value == SENTINEL => break,
                ID_KEY => {
                    current = value.parse::<u32>().ok().map(TrackId::new);
                    match current {
                        Some(id) => {
                            self.records.insert(id, ExtendedRecord::default());
                        }
                        None => debug!("Bad record id in extended info: {}", value),
                    }
                }
                _ => {
                    let (Some(id), Some(field)) = (current, ExtField::from_key(key)) else {
                        continue;
                    };
                    if let Some(record) = self.records.get_mut(&id) {
                        *record.slot(field) = Some(value.to_string());
                    }
                }
            }
        }
        if self.header == HeaderCheck::Missing {
            warn!("Extended info has no local catalog checksum");
        }
    }

    /// Whether the header checksum matched the catalog at load time
    pub fn checksum_matches(&self) -> bool {
        self.header == HeaderCheck::Matches
    }

    /// Tracks with an empty catalog path but a recorded locale filename
    pub fn missing_paths(&self) -> &[(TrackId, String)] {
        &self.missing_paths
    }

    /// Put recorded locale filenames back on tracks that lost their path
    pub fn restore_paths(&mut self, local: &mut dyn Catalog) -> usize {
        let mut restored = 0;
        for (id, path) in self.missing_paths.drain(..) {
            if let Some(track) = local.track_mut(id) {
                debug!("Restoring path of track {} from extended info", id);
                track.path = Some(path);
                restored += 1;
            }
        }
        restored
    }

    pub fn record(&self, id: TrackId) -> Option<&ExtendedRecord> {
        self.records.get(&id)
    }

    pub fn get(&self, id: TrackId, field: ExtField) -> Option<&str> {
        self.records.get(&id).and_then(|r| r.get(field))
    }

    /// Set a field, creating the record if needed
    pub fn set(&mut self, id: TrackId, field: ExtField, value: impl Into<String>) {
        *self.records.entry(id).or_default().slot(field) = Some(value.into());
    }

    pub fn delete(&mut self, id: TrackId, field: ExtField) {
        if let Some(record) = self.records.get_mut(&id) {
            *record.slot(field) = None;
        }
    }

    pub fn remove_record(&mut self, id: TrackId) -> Option<ExtendedRecord> {
        self.records.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write one record per local track
    ///
    /// Existing hashes are kept unless `force_rehash`; missing ones are
    /// computed. Records of tracks no longer in the catalog are dropped.
    pub fn persist(
        &mut self,
        store_path: &Path,
        catalog_path: &Path,
        local: &dyn Catalog,
        force_rehash: bool,
        dry_run: bool,
    ) -> Result<PersistReport> {
        let mut report = PersistReport::default();
        if dry_run {
            report.records = local.tracks().len();
            debug!("Not writing extended info, {} tracks (dry-run)", report.records);
            return Ok(report);
        }

        let checksum = file_hash(catalog_path).unwrap_or_default();
        let dir = parent_dir(store_path);
        fs::create_dir_all(dir)?;
        let mut out = NamedTempFile::new_in(dir)?;
        writeln!(out, "{HEADER_HASH_KEY}={checksum}")?;
        writeln!(out, "{VERSION_KEY}={EXT_VERSION}")?;

        let mut kept = BTreeMap::new();
        for track in local.tracks() {
            let mut record = self.records.remove(&track.id).unwrap_or_default();
            if record.filename_locale.is_none() {
                record.filename_locale = track.path.clone();
            }
            if force_rehash || record.md5_hash.is_none() {
                let locale = record.filename_locale.as_deref().unwrap_or_default();
                record.md5_hash = file_hash(Path::new(locale));
                if record.md5_hash.is_some() {
                    debug!("Hashed {}", locale);
                    report.hashed += 1;
                }
            }

            writeln!(out, "{ID_KEY}={}", track.id)?;
            for field in [
                ExtField::FilenameIpod,
                ExtField::FilenameUtf8,
                ExtField::FilenameLocale,
                ExtField::Md5Hash,
            ] {
                if let Some(value) = record.get(field) {
                    writeln!(out, "{}={}", field.key(), value)?;
                }
            }
            writeln!(out, "transferred=1")?;
            report.records += 1;
            kept.insert(track.id, record);
        }
        writeln!(out, "{ID_KEY}={SENTINEL}")?;
        out.persist(store_path).map_err(|e| e.error)?;

        self.records = kept;
        self.header = HeaderCheck::Matches;
        info!("Wrote extended info, {} tracks", report.records);
        Ok(report)
    }
}

/// Hash of a file as used by the extended info format
///
/// SHA-1 over the file size as a little-endian u32 followed by the first
/// 16 KiB of content. `None` if the file can't be read.
pub fn file_hash(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    let mut file = File::open(path).ok()?;
    let size = file.metadata().ok()?.len();

    let mut hasher = Sha1::new();
    hasher.update((size as u32).to_le_bytes());
    let mut prefix = Vec::with_capacity(HASH_PREFIX_BYTES as usize);
    (&mut file)
        .take(HASH_PREFIX_BYTES)
        .read_to_end(&mut prefix)
        .ok()?;
    hasher.update(&prefix);
    Some(hex::encode(hasher.finalize()))
}
