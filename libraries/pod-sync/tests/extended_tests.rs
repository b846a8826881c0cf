//! Extended metadata store: hashing and parse tolerance


use pod_core::Catalog;
use pod_sync::{file_hash, ExtField, ExtendedMetadata};
use std::fs;
use test_helpers::{add_local, Fixture};

#[test]
fn persist_keeps_existing_hash_and_fills_missing_ones() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let a = add_local(&mut local, "A", "X", &fx.audio_file("a.mp3", 20_000));
    let b_file = fx.audio_file("b.mp3", 3_000);
    let b = add_local(&mut local, "B", "Y", &b_file);
    local.save().unwrap();

    let store = fx.paths.extended_file();
    let mut ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    ext.set(a, ExtField::Md5Hash, "feedface");
    let report = ext.persist(&store, &fx.paths.local_db, &local, false, false).unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.hashed, 1);

    let reloaded = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    assert!(reloaded.checksum_matches());
    assert_eq!(reloaded.get(a, ExtField::Md5Hash), Some("feedface"));
    assert_eq!(reloaded.get(b, ExtField::Md5Hash), file_hash(&b_file).as_deref());
}

#[test]
fn forced_rehash_replaces_stale_hashes() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let file = fx.audio_file("a.mp3", 500);
    let a = add_local(&mut local, "A", "X", &file);
    local.save().unwrap();

    let store = fx.paths.extended_file();
    let mut ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    ext.set(a, ExtField::Md5Hash, "stale");
    ext.persist(&store, &fx.paths.local_db, &local, true, false).unwrap();
    assert_eq!(ext.get(a, ExtField::Md5Hash), file_hash(&file).as_deref());
}

#[test]
fn hash_depends_on_size_and_prefix_only() {
    let fx = Fixture::new();
    let a = fx.audio_file("a.bin", 40_000);
    let b = fx.dir.path().join("b.bin");
    let mut bytes = fs::read(&a).unwrap();
    // Past the hashed prefix
    bytes[30_000] ^= 0xff;
    fs::write(&b, &bytes).unwrap();
    assert_eq!(file_hash(&a), file_hash(&b));

    bytes.push(0);
    fs::write(&b, &bytes).unwrap();
    assert_ne!(file_hash(&a), file_hash(&b));
    assert_eq!(file_hash(&fx.dir.path().join("missing")), None);
}

#[test]
fn tolerant_parse() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let a = add_local(&mut local, "A", "X", &fx.audio_file("a.mp3", 100));
    local.save().unwrap();

    let store = fx.paths.extended_file();
    fs::create_dir_all(store.parent().unwrap()).unwrap();
    fs::write(
        &store,
        format!(
            "itunesdb_hash=0000\nversion=0.99.1\nnot a pair\nid={}\ncolour=blue\nmd5_hash=abc\nid=oops\nmd5_hash=lost\n",
            a
        ),
    )
    .unwrap();

    let ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    assert!(!ext.checksum_matches());
    assert_eq!(ext.get(a, ExtField::Md5Hash), Some("abc"));
    assert_eq!(
        ext.get(a, ExtField::FilenameLocale),
        local.track(a).unwrap().path.as_deref()
    );
}

#[test]
fn lost_paths_are_restored() {
    let fx = Fixture::new();
    let mut local = fx.local();
    let file = fx.audio_file("a.mp3", 100);
    let a = add_local(&mut local, "A", "X", &file);
    local.save().unwrap();

    let store = fx.paths.extended_file();
    let mut ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    ext.persist(&store, &fx.paths.local_db, &local, false, false).unwrap();

    local.track_mut(a).unwrap().path = Some(String::new());
    let mut ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    assert_eq!(ext.missing_paths().len(), 1);
    assert_eq!(ext.restore_paths(&mut local), 1);
    assert_eq!(local.track(a).unwrap().path.as_deref(), Some(&*file.to_string_lossy()));
}

#[test]
fn dry_run_writes_nothing() {
    let fx = Fixture::new();
    let mut local = fx.local();
    add_local(&mut local, "A", "X", &fx.audio_file("a.mp3", 100));
    let store = fx.paths.extended_file();
    let mut ext = ExtendedMetadata::load(&store, &fx.paths.local_db, &local).unwrap();
    let report = ext.persist(&store, &fx.paths.local_db, &local, false, true).unwrap();
    assert_eq!(report.records, 1);
    assert!(!store.exists());
}
