use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::geometry::CellScale;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tuning: Tuning,
    /// surface units per terminal column
    pub cell_width: f64,
    /// surface units per terminal row
    pub cell_height: f64,
    pub haptics: bool,
    pub bell: bool,
    pub blind: bool,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let scale = CellScale::default();
        Self {
            tuning: Tuning::default(),
            cell_width: scale.cell_width,
            cell_height: scale.cell_height,
            haptics: true,
            bell: true,
            blind: false,
            tick_rate_ms: 33,
        }
    }
}

impl Config {
    pub fn cell_scale(&self) -> CellScale {
        CellScale::new(self.cell_width, self.cell_height)
    }

    /// Pull hand-edited values back into a range the game can run with
    pub fn sanitized(self) -> Self {
        let d = Config::default();
        Self {
            tuning: self.tuning.sanitized(),
            cell_width: cell_size("cell_width", self.cell_width, d.cell_width),
            cell_height: cell_size("cell_height", self.cell_height, d.cell_height),
            ..self
        }
    }
}

fn cell_size(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("{name} {value} must be a positive number, using {default}");
        default
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "homing") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("homing_config.json")
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
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(err) => {
                log::warn!(
                    "ignoring malformed config {}: {err}",
                    self.path.display()
                );
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
