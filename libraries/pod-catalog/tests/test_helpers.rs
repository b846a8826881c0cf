use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Temp directory with an empty device mount inside, logging initialised
pub fn setup_mount() -> (TempDir, std::path::PathBuf) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mount = dir.path().join("ipod");
    std::fs::create_dir_all(&mount).expect("Failed to create mount");
    (dir, mount)
}
