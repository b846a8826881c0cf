use crate::error::{CatalogError, Result};
use crate::spl;
use chrono::Utc;
use pod_core::{
    Catalog, CatalogKind, DiskSpace, Playlist, PlaylistId, PlaylistKind, PodError, Track, TrackId,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Catalog file location, relative to the device mount point
pub const DEVICE_CATALOG_PATH: &str = "iPod_Control/iTunes/catalog.json";
/// Audio directory, relative to the device mount point
pub const MUSIC_DIR: &str = "iPod_Control/Music";
/// Thumbnail directory, relative to the device mount point
pub const ARTWORK_DIR: &str = "iPod_Control/Artwork";

pub const MASTER_PLAYLIST_NAME: &str = "Library";
pub const PODCASTS_PLAYLIST_NAME: &str = "Podcasts";

/// Number of `Fnn` folders audio files are spread over
const MUSIC_FOLDERS: u32 = 20;
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogData {
    version: u32,
    next_track_id: u32,
    next_playlist_id: u64,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    playlists: Vec<Playlist>,
}

impl CatalogData {
    fn empty() -> Self {
        let mut data = Self {
            version: FORMAT_VERSION,
            next_track_id: 1,
            next_playlist_id: 1,
            tracks: Vec::new(),
            playlists: Vec::new(),
        };
        data.insert_playlist(Playlist::with_kind(
            MASTER_PLAYLIST_NAME,
            PlaylistKind::Master,
        ));
        data.insert_playlist(Playlist::with_kind(
            PODCASTS_PLAYLIST_NAME,
            PlaylistKind::Podcasts,
        ));
        data
    }

    fn insert_playlist(&mut self, mut playlist: Playlist) -> PlaylistId {
        let id = PlaylistId::new(self.next_playlist_id);
        self.next_playlist_id += 1;
        playlist.id = id;
        self.playlists.push(playlist);
        id
    }
}

/// JSON-backed catalog for either the local mirror or the device
#[derive(Debug)]
pub struct FileCatalog {
    kind: CatalogKind,
    path: PathBuf,
    mount: Option<PathBuf>,
    data: CatalogData,
}

impl FileCatalog {
    /// Create an empty local catalog with master and podcast playlists
    ///
    /// Nothing is written until `save` is called.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CatalogKind::Local,
            path: path.into(),
            mount: None,
            data: CatalogData::empty(),
        }
    }

    /// Open an existing local catalog
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = read_data(&path)?;
        info!("Opened local catalog {} ({} tracks)", path.display(), data.tracks.len());
        Ok(Self {
            kind: CatalogKind::Local,
            path,
            mount: None,
            data,
        })
    }

    /// Open a local catalog, creating an empty one if the file does not exist
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            Self::open(path)
        } else {
            debug!("No local catalog at {}, creating", path.display());
            Ok(Self::create(path))
        }
    }

    /// Open the catalog of a device mounted at `mount`
    ///
    /// A mount without a catalog file gets a fresh, empty catalog.
    pub fn open_device(mount: impl Into<PathBuf>) -> Result<Self> {
        let mount = mount.into();
        if !mount.is_dir() {
            return Err(CatalogError::MountNotFound(mount));
        }
        let path = mount.join(DEVICE_CATALOG_PATH);
        let data = if path.exists() {
            read_data(&path)?
        } else {
            warn!("No catalog on device at {}, starting empty", mount.display());
            CatalogData::empty()
        };
        info!("Opened device catalog {} ({} tracks)", path.display(), data.tracks.len());
        Ok(Self {
            kind: CatalogKind::Device,
            path,
            mount: Some(mount),
            data,
        })
    }

    /// Device mount point
    pub fn mount(&self) -> Option<&Path> {
        self.mount.as_deref()
    }

    fn artwork_dir(&self) -> PathBuf {
        match &self.mount {
            Some(mount) => mount.join(ARTWORK_DIR),
            None => self
                .path
                .parent()
                .map(|p| p.join("artwork"))
                .unwrap_or_else(|| PathBuf::from("artwork")),
        }
    }

    fn track_index(&self, id: TrackId) -> Option<usize> {
        self.data.tracks.iter().position(|t| t.id == id)
    }

    fn playlist_index(&self, id: PlaylistId) -> Option<usize> {
        self.data.playlists.iter().position(|p| p.id == id)
    }

    /// Pick an unused `Fnn/XXXX.ext` location under the device music directory
    fn device_destination(&self, mount: &Path, source: &Path) -> Result<(PathBuf, String)> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        let mut rng = rand::thread_rng();
        loop {
            let folder = format!("F{:02}", rng.gen_range(0..MUSIC_FOLDERS));
            let name: String = (0..4).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))).collect();
            let relative = format!("{MUSIC_DIR}/{folder}/{name}{ext}");
            let absolute = mount.join(&relative);
            if !absolute.exists() {
                if let Some(parent) = absolute.parent() {
                    fs::create_dir_all(parent)?;
                }
                return Ok((absolute, relative));
            }
        }
    }

    fn remove_artwork_file(&self, name: &str) {
        let still_used = self
            .data
            .tracks
            .iter()
            .any(|t| t.artwork.as_deref() == Some(name));
        if still_used {
            return;
        }
        let file = self.artwork_dir().join(name);
        if let Err(e) = fs::remove_file(&file) {
            debug!("Could not remove thumbnail {}: {}", file.display(), e);
        }
    }
}

fn read_data(path: &Path) -> Result<CatalogData> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

impl Catalog for FileCatalog {
    fn kind(&self) -> CatalogKind {
        self.kind
    }

    fn file_path(&self) -> &Path {
        &self.path
    }

    fn tracks(&self) -> &[Track] {
        &self.data.tracks
    }

    fn track(&self, id: TrackId) -> Option<&Track> {
        self.data.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.data.tracks.iter_mut().find(|t| t.id == id)
    }

    fn add_track(&mut self, mut track: Track) -> pod_core::Result<TrackId> {
        let id = TrackId::new(self.data.next_track_id);
        self.data.next_track_id += 1;
        track.id = id;
        self.data.tracks.push(track);
        Ok(id)
    }

    fn remove_track(&mut self, id: TrackId) -> pod_core::Result<Track> {
        let index = self
            .track_index(id)
            .ok_or(CatalogError::TrackNotFound(id))?;
        let track = self.data.tracks.remove(index);
        for playlist in &mut self.data.playlists {
            playlist.tracks.retain(|t| *t != id);
        }
        if let Some(name) = &track.artwork {
            self.remove_artwork_file(name);
        }
        Ok(track)
    }

    fn playlists(&self) -> &[Playlist] {
        &self.data.playlists
    }

    fn playlist(&self, id: PlaylistId) -> Option<&Playlist> {
        self.data.playlists.iter().find(|p| p.id == id)
    }

    fn playlist_mut(&mut self, id: PlaylistId) -> Option<&mut Playlist> {
        self.data.playlists.iter_mut().find(|p| p.id == id)
    }

    fn add_playlist(&mut self, playlist: Playlist) -> pod_core::Result<PlaylistId> {
        if playlist.kind != PlaylistKind::Standard
            && self.data.playlists.iter().any(|p| p.kind == playlist.kind)
        {
            return Err(PodError::Duplicate(format!(
                "{:?} playlist already exists",
                playlist.kind
            )));
        }
        Ok(self.data.insert_playlist(playlist))
    }

    fn remove_playlist(&mut self, id: PlaylistId) -> pod_core::Result<Playlist> {
        let index = self
            .playlist_index(id)
            .ok_or(CatalogError::PlaylistNotFound(id))?;
        if self.data.playlists[index].kind != PlaylistKind::Standard {
            return Err(CatalogError::BuiltinPlaylist(self.data.playlists[index].name.clone()).into());
        }
        Ok(self.data.playlists.remove(index))
    }

    fn add_to_playlist(&mut self, playlist: PlaylistId, track: TrackId) -> pod_core::Result<()> {
        if self.track_index(track).is_none() {
            return Err(CatalogError::TrackNotFound(track).into());
        }
        let playlist = self
            .playlist_mut(playlist)
            .ok_or(CatalogError::PlaylistNotFound(playlist))?;
        if !playlist.contains(track) {
            playlist.tracks.push(track);
        }
        Ok(())
    }

    fn remove_from_playlist(
        &mut self,
        playlist: PlaylistId,
        track: TrackId,
    ) -> pod_core::Result<bool> {
        let playlist = self
            .playlist_mut(playlist)
            .ok_or(CatalogError::PlaylistNotFound(playlist))?;
        let before = playlist.tracks.len();
        playlist.tracks.retain(|t| *t != track);
        Ok(playlist.tracks.len() != before)
    }

    fn resolve_path(&self, track: &Track) -> Option<PathBuf> {
        let path = track.path.as_deref().filter(|p| !p.is_empty())?;
        Some(match &self.mount {
            Some(mount) => mount.join(path),
            None => PathBuf::from(path),
        })
    }

    fn music_dir(&self) -> Option<PathBuf> {
        self.mount.as_ref().map(|m| m.join(MUSIC_DIR))
    }

    fn space(&self) -> pod_core::Result<Option<DiskSpace>> {
        let Some(mount) = &self.mount else {
            return Ok(None);
        };
        let total = fs2::total_space(mount)?;
        let available = fs2::available_space(mount)?;
        Ok(Some(DiskSpace { total, available }))
    }

    fn transfer_file(&mut self, id: TrackId, source: &Path) -> pod_core::Result<()> {
        let index = self
            .track_index(id)
            .ok_or(CatalogError::TrackNotFound(id))?;

        let (path, size) = match self.mount.clone() {
            Some(mount) => {
                let (dest, relative) = self.device_destination(&mount, source)?;
                let size = fs::copy(source, &dest).map_err(CatalogError::from)?;
                debug!("Copied {} -> {}", source.display(), dest.display());
                (relative, size)
            }
            None => {
                let size = fs::metadata(source)?.len();
                (source.to_string_lossy().into_owned(), size)
            }
        };

        let track = &mut self.data.tracks[index];
        track.path = Some(path);
        track.size = size;
        track.transferred = true;
        Ok(())
    }

    fn set_artwork(&mut self, id: TrackId, image: &Path) -> pod_core::Result<()> {
        let index = self
            .track_index(id)
            .ok_or(CatalogError::TrackNotFound(id))?;
        let name = image
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PodError::invalid_input(format!("bad image path {}", image.display())))?
            .to_string();

        let dir = self.artwork_dir();
        fs::create_dir_all(&dir)?;
        let dest = dir.join(&name);
        if !dest.exists() {
            fs::copy(image, &dest)?;
        }
        self.data.tracks[index].artwork = Some(name);
        Ok(())
    }

    fn update_smart_playlists(&mut self) {
        let now = Utc::now();
        for index in 0..self.data.playlists.len() {
            let Some(smart) = &self.data.playlists[index].smart else {
                continue;
            };
            let members = spl::evaluate(
                smart,
                self.data.playlists[index].id,
                &self.data.tracks,
                &self.data.playlists,
                now,
            );
            debug!(
                "Smart playlist '{}' now has {} tracks",
                self.data.playlists[index].name,
                members.len()
            );
            self.data.playlists[index].tracks = members;
        }
    }

    fn save(&self) -> pod_core::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &self.data)?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|e| PodError::Io(e.error))?;

        info!(
            "Saved {} catalog {} ({} tracks)",
            self.kind,
            self.path.display(),
            self.data.tracks.len()
        );
        Ok(())
    }
}
