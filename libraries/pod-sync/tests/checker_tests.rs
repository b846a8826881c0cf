//! Consistency checker fixed points


use pod_core::{Catalog, Track};
use pod_sync::{check_device, check_local, AssumeYes, ExtendedMetadata, IdentityMap, SyncOptions};
use std::fs;
use test_helpers::{add_local, Fixture};

#[test]
fn local_check_reaches_a_fixed_point() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let good = fx.audio_file("good.mp3", 4_000);
    add_local(&mut local, "Good", "X", &good);
    // Same file twice
    add_local(&mut local, "Good again", "X", &good);
    add_local(&mut local, "Stub", "X", &fx.audio_file("stub.mp3", 3));
    let gone = fx.audio_file("gone.mp3", 100);
    add_local(&mut local, "Gone", "X", &gone);
    fs::remove_file(&gone).unwrap();
    // Outside the master playlist, wrong size
    let mut loose = Track::new("Loose", fx.audio_file("loose.mp3", 700).to_string_lossy());
    loose.size = 1;
    local.add_track(loose).unwrap();

    let opts = SyncOptions::default();
    let mut ext = ExtendedMetadata::default();
    let first = check_local(&mut local, &mut ext, &opts).unwrap();
    assert!(first.modified);
    assert!(first.repairs >= 5);
    assert!(first.extended_changed);
    assert_eq!(local.tracks().len(), 2);

    let second = check_local(&mut local, &mut ext, &opts).unwrap();
    assert_eq!(second.repairs, 0);
    assert!(!second.modified);
    assert!(!second.extended_changed);
    assert!(second.in_sync);
    assert_eq!(second.files_in_catalog, 2);
}

#[test]
fn device_check_reaches_a_fixed_point() {
    let fx = Fixture::new();
    let local = fx.local();
    let mut device = fx.device();
    let folder = fx.paths.mountpoint.join("iPod_Control/Music/F00");
    fs::create_dir_all(&folder).unwrap();

    fs::write(folder.join("KEEP.mp3"), [1u8; 300]).unwrap();
    let mut kept = Track::new("Kept", "iPod_Control/Music/F00/KEEP.mp3");
    kept.size = 999;
    let kept = device.add_track(kept).unwrap();
    let missing = device
        .add_track(Track::new("Missing", "iPod_Control/Music/F00/GONE.mp3"))
        .unwrap();
    let orphan = folder.join("ORPHAN.mp3");
    fs::write(&orphan, [2u8; 50]).unwrap();

    let opts = SyncOptions::default();
    let mut map = IdentityMap::empty(fx.paths.map_file());
    let first = check_device(&mut device, &mut map, &local, &mut AssumeYes, &opts).unwrap();
    assert!(first.modified);
    assert!(first.repairs >= 4);
    assert!(device.track(missing).is_none());
    assert_eq!(device.track(kept).unwrap().size, 300);
    assert!(!orphan.exists());
    let master = device.master_playlist().unwrap();
    assert!(master.contains(kept));

    let second = check_device(&mut device, &mut map, &local, &mut AssumeYes, &opts).unwrap();
    assert_eq!(second.repairs, 0);
    assert!(!second.modified);
    assert!(second.in_sync);
}
