//! Configuration management.

use anyhow::{Context, Result};
use contourwall_hw::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Wall configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Serial ports: none for auto-discovery, one for a single tile, six for
    /// a full wall (top-left first)
    #[serde(default)]
    pub ports: Vec<String>,

    /// Baud rate shared by all tiles
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Minimum time between two frames on one tile, in milliseconds
    #[serde(default = "default_frame_time")]
    pub frame_time_ms: u64,

    /// Delay after each shown frame in animations, in milliseconds
    #[serde(default = "default_delay")]
    pub delay_ms: u64,

    /// Skip uploading tiles whose content did not change
    #[serde(default)]
    pub optimize: bool,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_frame_time() -> u64 {
    33
}

fn default_delay() -> u64 {
    0
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            baud_rate: default_baud_rate(),
            frame_time_ms: default_frame_time(),
            delay_ms: default_delay(),
            optimize: false,
        }
    }
}
