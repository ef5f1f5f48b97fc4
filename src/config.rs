use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::composer::MAX_DURATION_SECS;

/// User preferences, read from `config.json` in the platform config dir.
/// Any field left out of the file takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Ring the terminal bell when a timer finishes
    pub bell: bool,
    /// Persist the playback history to the history database
    pub record_history: bool,
    /// Duration given to timers added in the composer
    pub default_timer_secs: u64,
    /// How far one +/- press moves a duration in the composer
    pub duration_step_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bell: true,
            record_history: true,
            default_timer_secs: 5,
            duration_step_secs: 60,
        }
    }
}

impl Config {
    /// Pull hand-edited values back into the range the composer accepts
    pub fn sanitized(mut self) -> Self {
        self.default_timer_secs = self.default_timer_secs.min(MAX_DURATION_SECS);
        self.duration_step_secs = self.duration_step_secs.clamp(1, MAX_DURATION_SECS);
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = match ProjectDirs::from("", "", "tsq") {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("tsq_config.json"),
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, first writing the defaults out if there is no file yet so the
    /// user has something to edit
    pub fn load_or_init(&self) -> Config {
        if !self.path.exists() {
            match self.save(&Config::default()) {
                Ok(()) => info!("wrote default config to {}", self.path.display()),
                Err(e) => warn!("could not write {}: {e}", self.path.display()),
            }
        }
        self.load()
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
