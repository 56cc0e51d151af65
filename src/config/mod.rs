// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for chordline.
//!
//! This module provides the song file format (a YAML `song:` block plus
//! optional `player:` settings), TOML player settings, and the hot-reload
//! watcher.

pub mod watcher;

pub use watcher::{validate_song_file, SongWatcher, WatchEvent};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::arrangement::Song;

/// Root of a song file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongFile {
    /// The song itself
    pub song: Song,
    /// Player settings stored alongside the song
    #[serde(default)]
    pub player: PlayerConfig,
}

impl SongFile {
    /// Wrap a song with default player settings
    pub fn new(song: Song) -> Self {
        Self {
            song,
            player: PlayerConfig::default(),
        }
    }

    /// Load a song file from YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a song file from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML song file")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song file to YAML")
    }

    /// Save to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write song file: {:?}", path.as_ref()))
    }
}

/// Player settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// How often the player ticks the scheduler
    pub frame_rate_hz: u32,
    /// Metronome on at start
    pub metronome: bool,
    /// Chord volume (0.0 - 1.0)
    pub song_volume: f32,
    /// Click volume (0.0 - 1.0)
    pub click_volume: f32,
    /// MIDI output port index (None = no live output)
    pub midi_port: Option<usize>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            metronome: true,
            song_volume: 0.75,
            click_volume: 0.75,
            midi_port: None,
        }
    }
}

impl PlayerConfig {
    /// Load player settings from a TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read player config: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse player settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML player config")
    }

    /// Frame interval, never faster than 1 kHz nor slower than 1 Hz
    pub fn frame_interval(&self) -> std::time::Duration {
        let hz = self.frame_rate_hz.clamp(1, 1000);
        std::time::Duration::from_micros(1_000_000 / hz as u64)
    }
}
