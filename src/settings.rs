use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dsp::noise::DEFAULT_SEED;

const SETTINGS_DIR: &str = "rustfry";
const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Frames per processing block.
    pub block_size: usize,
    /// Rate used for meter hold timing when the source does not carry one.
    pub sample_rate: u32,
    /// Seed for the noisy-circuit generator.
    pub noise_seed: u32,
    /// Where rendered files go when no output path is given.
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_size: 512,
            sample_rate: 48_000,
            noise_seed: DEFAULT_SEED,
            output_dir: ".".to_string(),
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Block Size: {}", self.block_size)?;
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        writeln!(f, "Noise Seed: {:#010x}", self.noise_seed)?;
        writeln!(f, "Output Directory: {}", self.output_dir)?;
        Ok(())
    }
}

impl Settings {
    /// Loads from the default location, falling back to defaults when no
    /// file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_settings_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Self =
            serde_json::from_str(&contents).context("Failed to parse settings")?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// A zero block size or sample rate would stall rendering.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.block_size == 0 {
            self.block_size = defaults.block_size;
        }
        if self.sample_rate == 0 {
            self.sample_rate = defaults.sample_rate;
        }
        self
    }

    pub fn get_settings_path() -> PathBuf {
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join(SETTINGS_DIR)
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join(SETTINGS_DIR)
                .join(SETTINGS_FILENAME)
        } else {
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }
}
