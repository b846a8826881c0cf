/// Collaborator traits consumed by the sync engine
use crate::error::Result;
use crate::types::{
    AudioTags, CatalogKind, DiskSpace, Playlist, PlaylistId, PlaylistKind, Track, TrackId,
};
use std::path::{Path, PathBuf};

/// Track store adapter
///
/// Read/write façade over one catalog, either the local mirror or the
/// on-device catalog. All mutations stay in memory until `save` is called.
pub trait Catalog {
    /// Which side of a sync this catalog represents
    fn kind(&self) -> CatalogKind;

    /// Path of the persisted catalog file
    fn file_path(&self) -> &Path;

    /// All tracks in enumeration order
    fn tracks(&self) -> &[Track];

    /// Get a track by ID
    fn track(&self, id: TrackId) -> Option<&Track>;

    /// Get a mutable track by ID
    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track>;

    /// Add a track, assigning it a fresh ID
    ///
    /// The track is not added to any playlist.
    fn add_track(&mut self, track: Track) -> Result<TrackId>;

    /// Remove a track
    ///
    /// Also drops the track from every playlist and removes its thumbnail.
    /// The audio file itself is left alone.
    fn remove_track(&mut self, id: TrackId) -> Result<Track>;

    /// All playlists in enumeration order
    fn playlists(&self) -> &[Playlist];

    /// Get a playlist by ID
    fn playlist(&self, id: PlaylistId) -> Option<&Playlist>;

    /// Get a mutable playlist by ID
    fn playlist_mut(&mut self, id: PlaylistId) -> Option<&mut Playlist>;

    /// Find the first playlist with the given name
    fn playlist_by_name(&self, name: &str) -> Option<&Playlist> {
        self.playlists().iter().find(|p| p.name == name)
    }

    /// The master playlist
    fn master_playlist(&self) -> Option<&Playlist> {
        self.playlists()
            .iter()
            .find(|p| p.kind == PlaylistKind::Master)
    }

    /// The podcast playlist
    fn podcasts_playlist(&self) -> Option<&Playlist> {
        self.playlists()
            .iter()
            .find(|p| p.kind == PlaylistKind::Podcasts)
    }

    /// Add a playlist, assigning it a fresh ID
    fn add_playlist(&mut self, playlist: Playlist) -> Result<PlaylistId>;

    /// Remove a playlist (tracks stay in the catalog)
    fn remove_playlist(&mut self, id: PlaylistId) -> Result<Playlist>;

    /// Append a track to a playlist; no-op if already a member
    fn add_to_playlist(&mut self, playlist: PlaylistId, track: TrackId) -> Result<()>;

    /// Remove a track from a playlist, returning whether it was a member
    fn remove_from_playlist(&mut self, playlist: PlaylistId, track: TrackId) -> Result<bool>;

    /// Absolute on-disk location of a track's file
    fn resolve_path(&self, track: &Track) -> Option<PathBuf>;

    /// Directory holding the catalog's audio files, for the device variant
    fn music_dir(&self) -> Option<PathBuf>;

    /// Capacity of the backing filesystem, for the device variant
    fn space(&self) -> Result<Option<DiskSpace>>;

    /// Copy `source` into the catalog's storage for the given track
    ///
    /// On success the track's path, size and transferred flag are updated.
    fn transfer_file(&mut self, id: TrackId, source: &Path) -> Result<()>;

    /// Attach a thumbnail image to a track
    fn set_artwork(&mut self, id: TrackId, image: &Path) -> Result<()>;

    /// Re-evaluate the membership of every smart playlist
    fn update_smart_playlists(&mut self);

    /// Persist the catalog to its file
    fn save(&self) -> Result<()>;
}

/// Audio tag extractor
pub trait TagReader {
    /// Whether the file is a recognised audio format
    fn is_audio_file(&self, path: &Path) -> bool;

    /// Read title, artist, album and the other supported tags
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    fn read_tags(&self, path: &Path) -> Result<AudioTags>;

    /// Extract the embedded front cover into `dest_dir`
    ///
    /// Returns `Ok(None)` when the file has no usable JPEG cover.
    fn extract_artwork(&self, path: &Path, dest_dir: &Path) -> Result<Option<PathBuf>>;
}
