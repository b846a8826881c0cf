//! Operator commands against on-disk fixtures


use pod_catalog::FileCatalog;
use pod_core::{Catalog, Playlist, RuleAction, RuleField, SmartPlaylist, SmartRule, Track};
use pod_sync::commands::{self, playlist, Target, NOT_IN_LOCAL};
use pod_sync::{AssumeYes, ScriptedPrompt, SyncError, SyncOptions};
use std::fs;
use test_helpers::{add_local, Fixture, StubTagReader};

fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn add_skips_known_untagged_and_non_audio_files() {
    let fx = Fixture::new();
    fx.audio_file("inbox/Band - One.mp3", 300);
    fx.audio_file("inbox/Band - Two.mp3", 300);
    fx.audio_file("inbox/untagged.mp3", 300);
    fx.audio_file("inbox/cover.jpg", 300);
    let inbox = fx.dir.path().join("music/inbox");
    let ctx = fx.context_with(SyncOptions {
        rating: 4,
        ..SyncOptions::default()
    });

    let report = commands::add(&ctx, Target::Local, &[inbox.clone()], false, &StubTagReader).unwrap();
    assert_eq!(report.added.len(), 2);
    assert_eq!(report.skipped, 2);

    let local = FileCatalog::open(&fx.paths.local_db).unwrap();
    let one = local.tracks().iter().find(|t| t.title == "One").unwrap();
    assert_eq!(one.artist.as_deref(), Some("Band"));
    assert_eq!(one.rating, 80);
    assert_eq!(one.size, 300);
    assert!(local.master_playlist().unwrap().contains(one.id));
    assert!(fx.paths.extended_file().exists());

    let again = commands::add(&ctx, Target::Local, &[inbox], false, &StubTagReader).unwrap();
    assert!(again.added.is_empty());
    assert_eq!(again.skipped, 4);
}

#[test]
fn podcast_add_marks_episodes_pending() {
    let fx = Fixture::new();
    let file = fx.audio_file("Show - Episode 1.mp3", 100);
    let ctx = fx.context();
    commands::add(&ctx, Target::Local, &[file], true, &StubTagReader).unwrap();

    let local = FileCatalog::open(&fx.paths.local_db).unwrap();
    let episode = &local.tracks()[0];
    assert!(episode.podcast);
    assert!(episode.is_pending_podcast());
    assert!(local.podcasts_playlist().unwrap().contains(episode.id));
}

#[test]
fn device_add_transfers_files() {
    let fx = Fixture::new();
    let file = fx.audio_file("Band - Live.mp3", 2_048);
    let ctx = fx.context();
    let report = commands::add(&ctx, Target::Device, &[file], false, &StubTagReader).unwrap();
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.no_space, 0);

    let device = fx.device();
    let track = device.track(report.added[0]).unwrap();
    assert!(track.transferred);
    let on_device = device.resolve_path(track).unwrap();
    assert!(on_device.starts_with(fx.paths.mountpoint.join("iPod_Control/Music")));
    assert_eq!(fs::metadata(on_device).unwrap().len(), 2_048);
}

#[test]
fn local_delete_keeps_files_unless_asked() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let keep = fx.audio_file("keep.mp3", 100);
    let drop = fx.audio_file("drop.mp3", 100);
    add_local(&mut local, "Keep", "X", &keep);
    add_local(&mut local, "Drop", "Y", &drop);
    local.save().unwrap();

    let ctx = fx.context();
    let mut declined = ScriptedPrompt::new([], false);
    let report = commands::delete(&ctx, Target::Local, &patterns(&["drop"]), &mut declined).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.matched.len(), 1);
    assert_eq!(fx.local().tracks().len(), 2);

    let report = commands::delete(&ctx, Target::Local, &patterns(&["drop"]), &mut AssumeYes).unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(fx.local().tracks().len(), 1);
    assert!(drop.exists());

    let ctx = fx.context_with(SyncOptions {
        delete_files: true,
        ..SyncOptions::default()
    });
    let path = keep.to_string_lossy().into_owned();
    let report = commands::delete(&ctx, Target::Local, &[path], &mut AssumeYes).unwrap();
    assert_eq!(report.deleted, 1);
    assert!(!keep.exists());
}

#[test]
fn device_delete_notdb_removes_unmapped_tracks() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let file = fx.audio_file("a.mp3", 100);
    add_local(&mut local, "A", "X", &file);
    local.save().unwrap();

    let mut device = fx.device();
    let mut mapped = Track::new("A", "iPod_Control/Music/F00/A.mp3");
    mapped.artist = Some("X".into());
    let mapped = device.add_track(mapped).unwrap();
    let stray = device
        .add_track(Track::new("Stray", "iPod_Control/Music/F00/S.mp3"))
        .unwrap();
    device.save().unwrap();
    fs::create_dir_all(&fx.paths.state_dir).unwrap();
    fs::write(
        fx.paths.map_file(),
        format!("{};iPod_Control/Music/F00/A.mp3\n", file.display()),
    )
    .unwrap();

    let ctx = fx.context();
    let report =
        commands::delete(&ctx, Target::Device, &patterns(&[NOT_IN_LOCAL]), &mut AssumeYes).unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.matched[0].id, stray);

    let device = fx.device();
    assert!(device.track(mapped).is_some());
    assert!(device.track(stray).is_none());
    assert_eq!(
        fs::read_to_string(fx.paths.map_file()).unwrap(),
        format!("{};iPod_Control/Music/F00/A.mp3\n", file.display())
    );
}

#[test]
fn device_commands_need_a_local_catalog() {
    let fx = Fixture::new();
    let err = commands::diff(&fx.context()).unwrap_err();
    assert!(err.is_setup());
}

#[test]
fn list_defaults_to_everything() {
    let fx = Fixture::new();
    let mut local = fx.local();
    add_local(&mut local, "A", "X", &fx.audio_file("a.mp3", 10));
    add_local(&mut local, "B", "Y", &fx.audio_file("b.mp3", 10));
    local.save().unwrap();

    let ctx = fx.context();
    assert_eq!(commands::list(&ctx, Target::Local, &[]).unwrap().len(), 2);
    let only_b = commands::list(&ctx, Target::Local, &patterns(&["^b$"])).unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0].title, "B");
    assert!(matches!(
        commands::list(&ctx, Target::Local, &patterns(&["["])),
        Err(ref e) if e.is_usage()
    ));
}

#[test]
fn diff_reports_changed_statistics() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let a = fx.audio_file("a.mp3", 10);
    let b = fx.audio_file("b.mp3", 10);
    add_local(&mut local, "A", "X", &a);
    add_local(&mut local, "B", "X", &b);
    local.save().unwrap();

    let mut device = fx.device();
    let mut da = Track::new("A", "iPod_Control/Music/F00/A.mp3");
    da.artist = Some("X".into());
    da.play_count = 3;
    device.add_track(da).unwrap();
    let mut db = Track::new("B", "iPod_Control/Music/F00/B.mp3");
    db.artist = Some("X".into());
    device.add_track(db).unwrap();
    device.save().unwrap();
    fs::create_dir_all(&fx.paths.state_dir).unwrap();
    fs::write(
        fx.paths.map_file(),
        format!(
            "{};iPod_Control/Music/F00/A.mp3\n{};iPod_Control/Music/F00/B.mp3\n",
            a.display(),
            b.display()
        ),
    )
    .unwrap();

    let diffs = commands::diff(&fx.context()).unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].title, "A");
    assert_eq!(diffs[0].plays, Some((0, 3)));
    assert_eq!(diffs[0].rating, None);
}

#[test]
fn update_refreshes_sizes() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let file = fx.audio_file("Band - Grown.mp3", 10);
    let id = add_local(&mut local, "Grown", "Band", &file);
    local.save().unwrap();
    fs::write(&file, [0u8; 500]).unwrap();

    let updated =
        commands::update(&fx.context(), &patterns(&["grown"]), &mut AssumeYes, &StubTagReader).unwrap();
    assert_eq!(updated, vec![id]);
    let track = fx.local().track(id).cloned().unwrap();
    assert_eq!(track.size, 500);
    assert_eq!(track.duration_ms, 180_000);
}

#[test]
fn dump_copies_device_files_into_the_music_tree() {
    let fx = Fixture::new();
    let mut device = fx.device();
    let folder = fx.paths.mountpoint.join("iPod_Control/Music/F02");
    fs::create_dir_all(&folder).unwrap();
    for (name, n) in [("ABCD", 1), ("EFGH", 1)] {
        fs::write(folder.join(format!("{name}.mp3")), [n as u8; 40]).unwrap();
        let mut t = Track::new("Song", format!("iPod_Control/Music/F02/{name}.mp3"));
        t.artist = Some("AC/DC".into());
        t.album = Some("Live".into());
        t.track_number = Some(n);
        device.add_track(t).unwrap();
    }
    device
        .add_track(Track::new("Ghost", "iPod_Control/Music/F02/NONE.mp3"))
        .unwrap();
    device
        .add_playlist(Playlist::smart(
            "Loved",
            SmartPlaylist {
                rules: vec![SmartRule::new(RuleField::Rating, RuleAction::GreaterThan)],
                ..SmartPlaylist::default()
            },
        ))
        .unwrap();
    device.save().unwrap();

    let ctx = fx.context();
    let report = commands::dump(&ctx).unwrap();
    assert_eq!(report.copied, 2);
    assert_eq!(report.missing, 1);
    assert_eq!(report.playlists.copied, vec!["Loved"]);

    let album = fx.paths.music_dir.join("AC_DC/Live");
    assert!(album.join("1-Song.mp3").is_file());
    assert!(album.join("1-Song-1.mp3").is_file());

    let local = FileCatalog::open(&fx.paths.local_db).unwrap();
    assert_eq!(local.tracks().len(), 2);
    assert!(local.playlist_by_name("Loved").is_some());

    // Everything is mapped now, so a second dump only finds duplicates
    let again = commands::dump(&ctx).unwrap();
    assert_eq!(again.copied, 0);
    assert_eq!(again.duplicates, 2);
}

#[test]
fn make_map_rebuilds_from_catalogs() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let file = fx.audio_file("a.mp3", 1_000);
    add_local(&mut local, "A", "X", &file);
    local.save().unwrap();

    let mut device = fx.device();
    let rel = "iPod_Control/Music/F00/A.mp3";
    fs::create_dir_all(fx.paths.mountpoint.join("iPod_Control/Music/F00")).unwrap();
    fs::copy(&file, fx.paths.mountpoint.join(rel)).unwrap();
    let mut t = Track::new("A", rel);
    t.artist = Some("X".into());
    device.add_track(t).unwrap();
    device.save().unwrap();

    let report = commands::make_map(&fx.context()).unwrap();
    assert_eq!((report.matched, report.scanned), (1, 1));
    assert_eq!(
        fs::read_to_string(fx.paths.map_file()).unwrap(),
        format!("{};{rel}\n", file.display())
    );
}

#[test]
fn check_command_saves_repairs() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let gone = fx.audio_file("gone.mp3", 100);
    add_local(&mut local, "Gone", "X", &gone);
    local.save().unwrap();
    fs::remove_file(&gone).unwrap();

    let report = commands::check(&fx.context(), Target::Local, &mut AssumeYes).unwrap();
    assert_eq!(report.repairs, 1);
    assert!(fx.local().tracks().is_empty());
}

#[test]
fn playlist_lifecycle() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let a = fx.audio_file("a.mp3", 2 * 1024 * 1024);
    add_local(&mut local, "Alpha", "X", &a);
    add_local(&mut local, "Beta", "Y", &fx.audio_file("b.mp3", 10));
    local.save().unwrap();
    let ctx = fx.context();

    playlist::create(&ctx, Target::Local, "Road", false).unwrap();
    assert!(matches!(
        playlist::create(&ctx, Target::Local, "Road", false),
        Err(SyncError::PlaylistExists(_))
    ));

    let added = playlist::add(&ctx, Target::Local, "Road", &patterns(&["alpha", "x"])).unwrap();
    assert_eq!(added.len(), 1);
    assert!(playlist::add(&ctx, Target::Local, "Road", &patterns(&["alpha"]))
        .unwrap()
        .is_empty());

    let summaries = playlist::list(&ctx, Target::Local).unwrap();
    let road = summaries.iter().find(|s| s.name == "Road").unwrap();
    assert_eq!(road.items, 1);
    assert_eq!(road.size_bytes, 2 * 1024 * 1024);
    assert!(!road.smart);

    assert!(matches!(
        playlist::rules(&ctx, Target::Local, Some("Road")),
        Err(SyncError::NotSmart(_))
    ));
    assert!(matches!(
        playlist::tracks(&ctx, Target::Local, "Nope"),
        Err(SyncError::UnknownPlaylist(_))
    ));

    let mut declined = ScriptedPrompt::new([], false);
    assert!(!playlist::delete(&ctx, Target::Local, "Road", &mut declined).unwrap());
    assert_eq!(declined.asked.len(), 1);

    let removed = playlist::remove(&ctx, Target::Local, "Road", &patterns(&["alpha"])).unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(fx.local().tracks().len(), 2);
    assert!(playlist::delete(&ctx, Target::Local, "Road", &mut declined).unwrap());
    assert!(fx.local().playlist_by_name("Road").is_none());
}

#[test]
fn smart_playlist_rules_are_rendered() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let mut rule = SmartRule::new(RuleField::Artist, RuleAction::Contains);
    rule.string = "Beatles".into();
    local
        .add_playlist(Playlist::smart(
            "Fab",
            SmartPlaylist {
                rules: vec![rule],
                ..SmartPlaylist::default()
            },
        ))
        .unwrap();
    local.save().unwrap();

    let views = playlist::rules(&fx.context(), Target::Local, None).unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name, "Fab");
    assert_eq!(views[0].prefs[0], "Live update: True");
    assert_eq!(views[0].rules, vec!["Artist          contains \"Beatles\""]);
}
