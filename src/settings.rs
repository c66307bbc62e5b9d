//! Remembered settings for the interactive menu
//!
//! The last answers given in the menu are stored as TOML and offered as
//! defaults next time. The transform never reads this file; the CLI flags
//! are always taken as given.

use crate::codec::Mode;
use crate::constants::{DEFAULT_DST_DIR, DEFAULT_SRC_DIR, SETTINGS_DIR_NAME, SETTINGS_FILE_NAME};
use crate::pipeline::TransformConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Last-used menu answers stored in settings.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Source directory
    pub src: PathBuf,
    /// Destination directory
    pub dst: PathBuf,
    /// Payload encoding
    pub mode: Mode,
    /// Light minify before encoding
    pub minify: bool,
    /// Inject the protection script
    pub protect: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            src: PathBuf::from(DEFAULT_SRC_DIR),
            dst: PathBuf::from(DEFAULT_DST_DIR),
            mode: Mode::Percent,
            minify: true,
            protect: true,
        }
    }
}

impl Settings {
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig::new(self.mode, self.minify, self.protect)
    }

    /// Get the standard settings file path
    ///
    /// - macOS: `~/Library/Application Support/dualcrypt/settings.toml`
    /// - Linux: `~/.config/dualcrypt/settings.toml`
    /// - Windows: `%APPDATA%\dualcrypt\settings.toml`
    pub fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(SETTINGS_DIR_NAME);

        Ok(config_dir.join(SETTINGS_FILE_NAME))
    }

    /// Load settings from the standard location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::settings_path()?)
    }

    /// Load settings from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be read or isn't
    /// valid TOML. Missing keys fall back to their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Load settings, falling back to defaults when there are none yet
    ///
    /// A corrupt file is reported and ignored rather than blocking the menu.
    pub fn load_or_default() -> Self {
        let path = match Self::settings_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{:#}", e);
                return Self::default();
            }
        };
        Self::load_from_path_or_default(&path)
    }

    pub fn load_from_path_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from_path(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring saved settings: {:#}", e);
                Self::default()
            }
        }
    }

    /// Save settings to the standard location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::settings_path()?)
    }

    /// Save settings to a specific path, creating its directory
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

        log::info!("Settings saved to: {}", path.display());
        Ok(())
    }
}
