/// Tag reader implementation using lofty
use crate::artwork;
use crate::error::TagError;
use lofty::{Accessor, AudioFile, Probe, TaggedFileExt};
use pod_core::{AudioTags, TagReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tag reader using the lofty library
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }

    fn read(path: &Path) -> crate::Result<AudioTags> {
        if !path.exists() {
            return Err(TagError::FileNotFound(path.to_path_buf()));
        }
        let tagged_file = Probe::open(path)?.read()?;

        let properties = tagged_file.properties();
        let mut tags = AudioTags {
            duration_ms: properties.duration().as_millis() as u32,
            bitrate: properties.audio_bitrate().unwrap_or(0),
            ..AudioTags::default()
        };

        if let Some(tag) = tagged_file.primary_tag().or(tagged_file.first_tag()) {
            tags.title = tag.title().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            tags.artist = tag.artist().map(|s| s.to_string());
            tags.album = tag.album().map(|s| s.to_string());
            tags.genre = tag.genre().map(|s| s.to_string());
            tags.track_number = tag.track();
            tags.year = tag.year();
        }

        Ok(tags)
    }
}

impl TagReader for LoftyTagReader {
    fn is_audio_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        match Probe::open(path).and_then(|p| p.guess_file_type().map_err(Into::into)) {
            Ok(probe) => probe.file_type().is_some(),
            Err(e) => {
                debug!("{} is not audio: {}", path.display(), e);
                false
            }
        }
    }

    fn read_tags(&self, path: &Path) -> pod_core::Result<AudioTags> {
        Ok(Self::read(path)?)
    }

    fn extract_artwork(&self, path: &Path, dest_dir: &Path) -> pod_core::Result<Option<PathBuf>> {
        Ok(artwork::extract_front_cover(path, dest_dir)?)
    }
}
