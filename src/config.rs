use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::thumbnail::DEFAULT_SAMPLE_SIZE;

/// Top-level configuration for photo-stamp.
///
/// Controls where the library lives, how long a capture waits for a location
/// fix, and how the catalog reads containers back.
///
/// # Loading
///
/// ```rust,no_run
/// use photo_stamp::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.location.require_permission = false;
/// config.catalog.max_parallel_reads = 8;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub location: LocationConfig,
    pub catalog: CatalogConfig,
    pub staging: StagingConfig,
}

/// Where the image library is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Library root. Relative paths resolve against the working directory.
    pub root: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("library"),
        }
    }
}

/// Location behaviour during capture.
///
/// # Example
///
/// ```rust
/// use photo_stamp::config::LocationConfig;
///
/// let location = LocationConfig {
///     timeout_secs: 5,
///     require_permission: false, // capture without GPS when location is denied
/// };
/// assert_eq!(location.timeout().as_secs(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// How long a location request may take before it counts as "no fix".
    pub timeout_secs: u64,
    /// If `true`, a denied location permission fails the capture. If `false`,
    /// the photo is taken without GPS tags.
    pub require_permission: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            require_permission: true,
        }
    }
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Catalog listing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Containers read concurrently while listing.
    pub max_parallel_reads: usize,
    /// Preview downsample factor per dimension.
    pub thumbnail_sample_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_parallel_reads: 4,
            thumbnail_sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Scratch space for annotating stream-only containers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Defaults to the system temp directory.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// `config.json` in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Staging directory for stream-only containers.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
