mod test_helpers;

use pod_catalog::{CatalogError, FileCatalog, DEVICE_CATALOG_PATH, MUSIC_DIR};
use pod_core::{
    Catalog, CatalogKind, Playlist, RuleAction, RuleField, SmartPlaylist, SmartRule, Track,
};
use std::fs;
use test_helpers::setup_mount;

#[test]
fn missing_mount_is_a_setup_error() {
    let (dir, _) = setup_mount();
    let err = FileCatalog::open_device(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, CatalogError::MountNotFound(_)));
}

#[test]
fn transfer_places_files_under_the_music_dir() {
    let (dir, mount) = setup_mount();
    let source = dir.path().join("Song.MP3");
    fs::write(&source, vec![7u8; 4096]).unwrap();

    let mut device = FileCatalog::open_device(&mount).unwrap();
    assert_eq!(device.kind(), CatalogKind::Device);
    assert_eq!(device.music_dir(), Some(mount.join(MUSIC_DIR)));

    let mut track = Track::new("Song", "");
    track.path = None;
    let id = device.add_track(track).unwrap();
    device.transfer_file(id, &source).unwrap();

    let track = device.track(id).unwrap();
    let relative = track.path.clone().unwrap();
    assert!(relative.starts_with("iPod_Control/Music/F"));
    assert!(relative.ends_with(".mp3"));
    assert_eq!(track.size, 4096);
    assert!(track.transferred);
    assert_eq!(device.resolve_path(track), Some(mount.join(&relative)));
    assert!(mount.join(&relative).is_file());
}

#[test]
fn device_catalog_survives_a_save() {
    let (_dir, mount) = setup_mount();
    let mut device = FileCatalog::open_device(&mount).unwrap();
    let id = device
        .add_track(Track::new("Kept", "iPod_Control/Music/F01/ABCD.mp3"))
        .unwrap();
    let master = device.master_playlist().unwrap().id;
    device.add_to_playlist(master, id).unwrap();
    device.save().unwrap();
    assert!(mount.join(DEVICE_CATALOG_PATH).is_file());

    let reopened = FileCatalog::open_device(&mount).unwrap();
    assert_eq!(reopened.tracks().len(), 1);
    assert!(reopened.master_playlist().unwrap().contains(id));
    assert!(reopened.podcasts_playlist().is_some());
}

#[test]
fn smart_playlists_follow_the_tracks() {
    let (_dir, mount) = setup_mount();
    let mut device = FileCatalog::open_device(&mount).unwrap();
    let mut rule = SmartRule::new(RuleField::Rating, RuleAction::GreaterThan);
    rule.from_value = 60;
    let loved = device
        .add_playlist(Playlist::smart(
            "Loved",
            SmartPlaylist {
                rules: vec![rule],
                ..SmartPlaylist::default()
            },
        ))
        .unwrap();

    let mut hit = Track::new("Hit", "a.mp3");
    hit.rating = 100;
    let hit = device.add_track(hit).unwrap();
    let miss = device.add_track(Track::new("Miss", "b.mp3")).unwrap();
    device.update_smart_playlists();
    assert_eq!(device.playlist(loved).unwrap().tracks, vec![hit]);

    device.track_mut(miss).unwrap().rating = 80;
    device.remove_track(hit).unwrap();
    device.update_smart_playlists();
    assert_eq!(device.playlist(loved).unwrap().tracks, vec![miss]);
}

#[test]
fn builtin_playlists_cannot_be_removed() {
    let (_dir, mount) = setup_mount();
    let mut device = FileCatalog::open_device(&mount).unwrap();
    let master = device.master_playlist().unwrap().id;
    assert!(device.remove_playlist(master).is_err());
    assert!(device
        .add_playlist(Playlist::with_kind("Casts", pod_core::PlaylistKind::Podcasts))
        .is_err());
}
