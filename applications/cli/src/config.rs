/// Settings loading for the podsync binary
use config::{Config, Environment, File};
use pod_sync::{StatePaths, SyncOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Persistent settings
///
/// Layered as defaults, then the config file, then `PODSYNC_*` environment
/// variables. Command line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Where the device is mounted
    #[serde(default = "default_mountpoint")]
    pub mountpoint: PathBuf,

    /// Directory for the local catalog, identity map and backups
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Local catalog file, `<state_dir>/local.json` when unset
    #[serde(default)]
    pub local_db: Option<PathBuf>,

    /// Destination of `dump`, `<state_dir>/music` when unset
    #[serde(default)]
    pub music_dir: Option<PathBuf>,

    /// Stop a sync after this many copies
    #[serde(default)]
    pub transfer_limit: Option<usize>,

    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
}

fn default_mountpoint() -> PathBuf {
    PathBuf::from("/mnt/ipod")
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".podsync")
}

fn default_checkpoint_interval() -> usize {
    pod_sync::options::DEFAULT_CHECKPOINT_INTERVAL
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mountpoint: default_mountpoint(),
            state_dir: default_state_dir(),
            local_db: None,
            music_dir: None,
            transfer_limit: None,
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

/// `$HOME/.podsync/config.toml`
pub fn default_config_path() -> PathBuf {
    default_state_dir().join("config.toml")
}

impl Settings {
    /// Load settings from `path` (or the default location) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);
        Self::load_with(&path, Environment::with_prefix("PODSYNC"))
    }

    fn load_with(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Keys contain underscores, so nesting uses a double separator
        builder = builder.add_source(
            env.prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::Invalid(
                "checkpoint_interval must be at least 1".to_string(),
            ));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("state_dir is empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the on-disk layout
    pub fn paths(&self) -> StatePaths {
        let mut paths = StatePaths::new(&self.state_dir, &self.mountpoint);
        if let Some(db) = &self.local_db {
            paths.local_db = db.clone();
        }
        if let Some(dir) = &self.music_dir {
            paths.music_dir = dir.clone();
        }
        paths
    }

    /// Options seeded from the settings; flags are layered on by the caller
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            limit: self.transfer_limit,
            checkpoint_interval: self.checkpoint_interval,
            ..SyncOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix("PODSYNC").source(Some(source))
    }

    #[test]
    fn defaults_without_file_or_environment() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load_with(&dir.path().join("absent.toml"), env(&[])).unwrap();
        assert_eq!(settings.mountpoint, PathBuf::from("/mnt/ipod"));
        assert_eq!(settings.checkpoint_interval, 50);
        assert!(settings.local_db.is_none());
        assert!(settings.state_dir.ends_with(".podsync"));
    }

    #[test]
    fn file_then_environment() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(
            &file,
            "mountpoint = \"/media/pod\"\nstate_dir = \"/var/podsync\"\ntransfer_limit = 20\n",
        )
        .unwrap();

        let settings =
            Settings::load_with(&file, env(&[("PODSYNC_TRANSFER_LIMIT", "5")])).unwrap();
        assert_eq!(settings.mountpoint, PathBuf::from("/media/pod"));
        assert_eq!(settings.transfer_limit, Some(5));

        let paths = settings.paths();
        assert_eq!(paths.local_db, PathBuf::from("/var/podsync/local.json"));
        assert_eq!(paths.map_file(), PathBuf::from("/var/podsync/map"));
        assert_eq!(settings.options().limit, Some(5));
    }

    #[test]
    fn explicit_paths_override_the_layout() {
        let settings = Settings {
            local_db: Some(PathBuf::from("/data/lib.json")),
            music_dir: Some(PathBuf::from("/data/music")),
            ..Settings::default()
        };
        let paths = settings.paths();
        assert_eq!(paths.local_db, PathBuf::from("/data/lib.json"));
        assert_eq!(paths.extended_file(), PathBuf::from("/data/lib.json.ext"));
        assert_eq!(paths.music_dir, PathBuf::from("/data/music"));
    }

    #[test]
    fn zero_checkpoint_interval_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Settings::load_with(
            &dir.path().join("absent.toml"),
            env(&[("PODSYNC_CHECKPOINT_INTERVAL", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
