use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::settings::types::Settings;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "LIVE_DETECT_CONFIG";

const DEFAULT_FILE_NAME: &str = "live-detect.json";

/// Persistent settings store backed by a JSON file.
pub struct SettingsStore {
    path: PathBuf,
    data: Mutex<Settings>,
}

impl SettingsStore {
    /// Open the store at `path` and keep the path for [`save`](Self::save).
    ///
    /// Loads through [`load`](Self::load): a missing file yields the defaults
    /// and a malformed one is an error.
    pub fn open(path: PathBuf) -> Result<Self, String> {
        let data = Self::load(&path)?;
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Settings path from `LIVE_DETECT_CONFIG`, or `live-detect.json` in the
    /// working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
    }

    /// Load settings from a JSON file, returning default on missing file.
    pub fn load(path: &Path) -> Result<Settings, String> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&contents).map_err(|e| format!("{}: {e}", path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings.
    pub fn get(&self) -> Settings {
        self.data.lock().clone()
    }

    /// Replace the in-memory settings. Call [`save`](Self::save) to persist.
    pub fn set(&self, settings: Settings) {
        *self.data.lock() = settings;
    }

    /// Write the current settings if no file exists yet.
    ///
    /// Returns `true` when a file was written.
    pub fn write_defaults_if_missing(&self) -> Result<bool, String> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Save current settings to disk atomically (write .tmp then rename).
    pub fn save(&self) -> Result<(), String> {
        let data = self.data.lock().clone();
        let json = serde_json::to_string_pretty(&data).map_err(|e| e.to_string())?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| e.to_string())?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| e.to_string())?;

        Ok(())
    }
}
