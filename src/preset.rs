use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dsp::DistortionType;
use crate::params::{
    DEFAULT_AMOUNT, DEFAULT_GAIN, ParamSnapshot, clamp_amount, clamp_gain,
};

/// A named set of control values stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preset {
    pub name: String,
    pub description: Option<String>,
    pub distortion_type: DistortionType,
    pub amount: f32,
    pub pre_gain: f32,
    pub post_gain: f32,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "New Preset".to_string(),
            description: None,
            distortion_type: DistortionType::default(),
            amount: DEFAULT_AMOUNT,
            pre_gain: DEFAULT_GAIN,
            post_gain: DEFAULT_GAIN,
        }
    }
}

impl Preset {
    pub fn new(name: &str, snapshot: &ParamSnapshot) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            distortion_type: snapshot.distortion_type,
            amount: snapshot.amount,
            pre_gain: snapshot.pre_gain,
            post_gain: snapshot.post_gain,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Control values with every field pulled into range.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            pre_gain: clamp_gain(self.pre_gain),
            post_gain: clamp_gain(self.post_gain),
            amount: clamp_amount(self.amount),
            distortion_type: self.distortion_type,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preset file {}", path.display()))?;
        let preset: Self =
            serde_json::from_str(&content).context("Failed to parse preset JSON")?;
        debug!("Loaded preset '{}' from {}", preset.name, path.display());
        Ok(preset)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create preset directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize preset")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write preset file {}", path.display()))?;
        debug!("Saved preset '{}' to {}", self.name, path.display());
        Ok(())
    }
}
