//! Front-cover extraction into content-named JPEG files

use crate::error::{Result, TagError};
use lofty::{MimeType, PictureType, TaggedFileExt};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum artwork size (5MB)
pub const MAX_ARTWORK_SIZE: usize = 5 * 1024 * 1024;

const JPEG_MAGIC: [u8; 3] = [0xff, 0xd8, 0xff];

pub(crate) fn extract_front_cover(path: &Path, dest_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Err(TagError::FileNotFound(path.to_path_buf()));
    }
    let tagged_file = lofty::read_from_path(path)?;
    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(None);
    };

    let pictures = tag.pictures();
    let Some(picture) = pictures
        .iter()
        .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
        .or_else(|| pictures.first())
    else {
        return Ok(None);
    };

    let declared_jpeg = matches!(picture.mime_type(), Some(MimeType::Jpeg) | None);
    if !declared_jpeg {
        debug!("Artwork in {} is not a jpeg, ignoring", path.display());
        return Ok(None);
    }

    save_jpeg(picture.data(), dest_dir)
}

/// Write JPEG bytes to `<sha256>.jpg` under `dest_dir`
///
/// Returns `Ok(None)` for data that is not a JPEG image. Identical images
/// share one file.
pub fn save_jpeg(data: &[u8], dest_dir: &Path) -> Result<Option<PathBuf>> {
    if !data.starts_with(&JPEG_MAGIC) {
        return Ok(None);
    }
    if data.len() > MAX_ARTWORK_SIZE {
        return Err(TagError::TooLarge(data.len(), MAX_ARTWORK_SIZE));
    }

    let name = format!("{}.jpg", hex::encode(Sha256::digest(data)));
    let dest = dest_dir.join(name);
    if !dest.exists() {
        fs::create_dir_all(dest_dir)?;
        fs::write(&dest, data)?;
    }
    Ok(Some(dest))
}
