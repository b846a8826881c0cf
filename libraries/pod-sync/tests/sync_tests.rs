//! Sync engine scenarios and plan properties


use pod_catalog::FileCatalog;
use pod_core::{Catalog, Playlist, Track, TrackId};
use pod_sync::{
    AssumeYes, IdentityMap, ScriptedPrompt, SyncEngine, SyncMode, SyncOptions, SyncPlan, SyncState,
};
use proptest::prelude::*;
use std::fs;
use test_helpers::{Fixture, StubTagReader};

fn engine(fx: &Fixture, local: FileCatalog, device: FileCatalog, options: SyncOptions) -> SyncEngine {
    SyncEngine::new(
        Box::new(local),
        Box::new(device),
        Box::new(StubTagReader),
        fx.paths.clone(),
        options,
    )
    .unwrap()
}

/// Local catalog whose only live track has id 5, in playlist "Car"
fn local_with_track_five(fx: &Fixture) -> (FileCatalog, TrackId, String) {
    let mut local = fx.local();
    for n in 0..4 {
        let filler = local.add_track(Track::new(format!("filler {n}"), "")).unwrap();
        local.remove_track(filler).unwrap();
    }
    let file = fx.audio_file("a.mp3", 1000);
    let path = file.to_string_lossy().into_owned();
    let mut track = Track::new("A", path.clone());
    track.size = 1000;
    let id = local.add_track(track).unwrap();
    let car = local.add_playlist(Playlist::standard("Car")).unwrap();
    local.add_to_playlist(car, id).unwrap();
    local.save().unwrap();
    (local, id, path)
}

#[test]
fn copy_phase_creates_one_device_track_and_one_map_entry() {
    let fx = Fixture::new();
    let (local, id, path) = local_with_track_five(&fx);
    assert_eq!(id, TrackId::new(5));
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();

    let mut engine = engine(&fx, local, device, SyncOptions::default());
    engine.validate_smart_playlists();
    engine.merge_stats();
    engine.evaluate_local_playlists().unwrap();
    let plan = engine.plan();
    let copy_ids: Vec<TrackId> = plan.copy_set.iter().map(|c| c.local_id).collect();
    assert_eq!(copy_ids, vec![TrackId::new(5)]);
    assert!(plan.delete_set.is_empty());

    assert_eq!(engine.apply_deletes(&plan), 0);
    let outcome = engine.apply_copies(&plan).unwrap();
    assert_eq!(outcome.copied, 1);
    engine.finalize().unwrap();
    assert_eq!(engine.state(), SyncState::Done);

    let device = engine.device();
    assert_eq!(device.tracks().len(), 1);
    let dtrack = &device.tracks()[0];
    let device_path = dtrack.path.clone().unwrap();
    assert!(device_path.starts_with("iPod_Control/Music/F"));
    assert!(device.resolve_path(dtrack).unwrap().is_file());
    assert!(device.playlist_by_name("Car").is_some());

    let entries: Vec<(String, String)> = engine
        .map()
        .entries()
        .map(|(l, d)| (l.to_string(), d.to_string()))
        .collect();
    assert_eq!(entries, vec![(path, device_path)]);
}

#[test]
fn second_sync_copies_nothing() {
    let fx = Fixture::new();
    let (local, _, _) = local_with_track_five(&fx);
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();
    device.save().unwrap();

    let mut first = engine(&fx, local, device, SyncOptions::default());
    first.run(SyncMode::Full, &mut AssumeYes).unwrap();

    let local = FileCatalog::open(&fx.paths.local_db).unwrap();
    let mut second = engine(&fx, local, fx.device(), SyncOptions::default());
    let summary = second.run(SyncMode::Full, &mut AssumeYes).unwrap();
    let plan = summary.plan.unwrap();
    assert!(plan.is_empty());
    assert_eq!(summary.copies.copied, 0);
    assert_eq!(second.device().tracks().len(), 1);
    assert!(fx.paths.device_backup_file().exists());
}

#[test]
fn unmapped_device_track_is_deleted() {
    let fx = Fixture::new();
    let (local, _, _) = local_with_track_five(&fx);
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();
    let stray_file = fx.paths.mountpoint.join("iPod_Control/Music/F03/STRAY.mp3");
    fs::create_dir_all(stray_file.parent().unwrap()).unwrap();
    fs::write(&stray_file, [0u8; 64]).unwrap();
    let mut stray = Track::new("Stray", "iPod_Control/Music/F03/STRAY.mp3");
    stray.size = 64;
    let stray = device.add_track(stray).unwrap();

    let mut engine = engine(&fx, local, device, SyncOptions::default());
    let plan = engine.plan();
    assert_eq!(plan.delete_set, vec![stray]);
    assert_eq!(plan.stale_bytes, 64);

    assert_eq!(engine.apply_deletes(&plan), 1);
    assert!(engine.device().track(stray).is_none());
    assert!(!engine.map().is_mapped(stray));
    assert!(engine
        .map()
        .entries()
        .all(|(_, d)| d != "iPod_Control/Music/F03/STRAY.mp3"));
    assert!(!stray_file.exists());
}

#[test]
fn dry_run_leaves_the_device_untouched() {
    let fx = Fixture::new();
    let (local, _, _) = local_with_track_five(&fx);
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();

    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let mut engine = engine(&fx, local, device, options);
    let summary = engine.run(SyncMode::Full, &mut AssumeYes).unwrap();
    assert_eq!(summary.copies.copied, 1);
    assert!(!fx.paths.mountpoint.join("iPod_Control/Music").exists());
    assert!(!fx.paths.map_file().exists());
}

#[test]
fn limit_stops_the_copy_phase() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let car = local.add_playlist(Playlist::standard("Car")).unwrap();
    for n in 0..3 {
        let file = fx.audio_file(&format!("{n}.mp3"), 100 + n);
        let id = local
            .add_track(Track::new(format!("Song {n}"), file.to_string_lossy()))
            .unwrap();
        local.add_to_playlist(car, id).unwrap();
    }
    local.save().unwrap();
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();

    let options = SyncOptions {
        limit: Some(2),
        ..SyncOptions::default()
    };
    let mut engine = engine(&fx, local, device, options);
    let summary = engine.run(SyncMode::Full, &mut ScriptedPrompt::new([], true)).unwrap();
    assert_eq!(summary.copies.copied, 2);
    assert!(summary.copies.stopped_at_limit);
    assert_eq!(engine.device().tracks().len(), 2);
}

#[test]
fn checkpoint_persists_copies_before_finalize() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let car = local.add_playlist(Playlist::standard("Car")).unwrap();
    let mut files = Vec::new();
    for n in 0..3 {
        let file = fx.audio_file(&format!("{n}.mp3"), 100 + n);
        let id = local
            .add_track(Track::new(format!("Song {n}"), file.to_string_lossy()))
            .unwrap();
        local.add_to_playlist(car, id).unwrap();
        files.push(file);
    }
    local.save().unwrap();
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();

    let options = SyncOptions {
        checkpoint_interval: 2,
        ..SyncOptions::default()
    };
    let mut engine = engine(&fx, local, device, options);
    engine.evaluate_local_playlists().unwrap();
    let plan = engine.plan();
    assert_eq!(plan.pending.len(), 3);

    // The third copy fails, so only the checkpoint reaches the disk
    fs::remove_file(&files[2]).unwrap();
    let outcome = engine.apply_copies(&plan).unwrap();
    assert_eq!(outcome.copied, 2);
    assert_eq!(outcome.failed, 1);

    let on_disk = FileCatalog::open_device(&fx.paths.mountpoint).unwrap();
    let mut titles: Vec<&str> = on_disk.tracks().iter().map(|t| t.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Song 0", "Song 1"]);
    assert!(on_disk.playlist_by_name("Car").is_some());
}

#[test]
fn checkpoint_is_skipped_below_the_interval() {
    let fx = Fixture::new();
    let (local, _, _) = local_with_track_five(&fx);
    let mut device = fx.device();
    device.add_playlist(Playlist::standard("Car")).unwrap();
    device.save().unwrap();

    let options = SyncOptions {
        checkpoint_interval: 2,
        ..SyncOptions::default()
    };
    let mut engine = engine(&fx, local, device, options);
    engine.evaluate_local_playlists().unwrap();
    let plan = engine.plan();
    assert_eq!(engine.apply_copies(&plan).unwrap().copied, 1);

    let on_disk = FileCatalog::open_device(&fx.paths.mountpoint).unwrap();
    assert!(on_disk.tracks().is_empty());
}

#[test]
fn merge_copies_device_statistics() {
    let fx = Fixture::new();
    let (local, id, path) = local_with_track_five(&fx);
    let mut device = fx.device();
    let mut dtrack = Track::new("A", "iPod_Control/Music/F00/A.mp3");
    dtrack.rating = 80;
    dtrack.play_count = 7;
    let dev_id = device.add_track(dtrack).unwrap();
    fs::create_dir_all(fx.paths.state_dir.clone()).unwrap();
    fs::write(fx.paths.map_file(), format!("{path};iPod_Control/Music/F00/A.mp3\n")).unwrap();

    let mut engine = engine(&fx, local, device, SyncOptions::default());
    assert_eq!(engine.map().local_for(dev_id), Some(id));
    assert_eq!(engine.merge_stats(), 1);
    let merged = engine.local().track(id).unwrap();
    assert_eq!(merged.rating, 80);
    assert_eq!(merged.play_count, 7);
}

fn arbitrary_setup() -> impl Strategy<Value = (Vec<bool>, usize, Vec<(usize, usize)>)> {
    (1usize..12, 0usize..12).prop_flat_map(|(locals, devices)| {
        (
            prop::collection::vec(any::<bool>(), locals),
            Just(devices),
            prop::collection::vec((0..devices.max(1), 0..locals), 0..devices + 1),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No device counterpart of a copy set member is ever scheduled for deletion
    #[test]
    fn plan_sets_are_disjoint((mirrored, devices, links) in arbitrary_setup()) {
        let mut local = FileCatalog::create("/tmp/local.json");
        let car = local.add_playlist(Playlist::standard("Car")).unwrap();
        let local_ids: Vec<TrackId> = mirrored
            .iter()
            .enumerate()
            .map(|(n, &in_car)| {
                let id = local.add_track(Track::new(format!("L{n}"), format!("/m/{n}.mp3"))).unwrap();
                if in_car {
                    local.add_to_playlist(car, id).unwrap();
                }
                id
            })
            .collect();

        let mut device = FileCatalog::create("/tmp/device.json");
        device.add_playlist(Playlist::standard("Car")).unwrap();
        let device_ids: Vec<TrackId> = (0..devices)
            .map(|n| device.add_track(Track::new(format!("D{n}"), format!("d/{n}.mp3"))).unwrap())
            .collect();

        let mut map = IdentityMap::empty("/tmp/unused-map");
        for (d, l) in links {
            if let Some(&dev) = device_ids.get(d) {
                map.set_link(dev, local_ids[l]);
            }
        }

        let plan = SyncPlan::build(&local, &device, &map);
        prop_assert!(plan.is_disjoint(&map));
        for item in &plan.copy_set {
            for dev in &plan.delete_set {
                prop_assert_ne!(map.local_for(*dev), Some(item.local_id));
            }
        }
        prop_assert!(plan.pending.len() <= plan.copy_set.len());
    }
}
