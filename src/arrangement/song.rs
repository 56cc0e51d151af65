// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song model: ordered sections of chord/rest events with repeats.
//!
//! The song is owned and edited elsewhere; the playback core reads it as a
//! snapshot. Raw fields are kept as entered and every accessor used for
//! timing normalizes them, so malformed values never reach the clock.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chord::ChordRef;

/// Lowest tempo used for any time mapping
pub const MIN_TEMPO: f64 = 1.0;

/// Default tempo for new songs
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Shortest event length in beats (one tick at 480 PPQN)
pub const MIN_DURATION_BEATS: f64 = 1.0 / 480.0;

/// Clamp a tempo to a usable positive value
pub fn normalize_tempo(bpm: f64) -> f64 {
    if bpm.is_finite() && bpm >= MIN_TEMPO {
        bpm
    } else {
        MIN_TEMPO
    }
}

/// Clamp an event length to a usable positive value
pub fn normalize_duration(beats: f64) -> f64 {
    if beats.is_finite() && beats >= MIN_DURATION_BEATS {
        beats
    } else {
        MIN_DURATION_BEATS
    }
}

/// Most passes a section can make
pub const MAX_REPEAT: u32 = 1024;

/// Most instances a valid song may flatten to
pub const MAX_INSTANCES: usize = 100_000;

/// Problems found by [`Song::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SongError {
    /// Two sections share an id
    #[error("duplicate section id {0:?}")]
    DuplicateSectionId(String),
    /// Two events in one section share an id
    #[error("duplicate event id {event_id:?} in section {section_id:?}")]
    DuplicateEventId {
        section_id: String,
        event_id: String,
    },
    /// Repeats expand to more instances than playback will hold
    #[error("song expands to {count} instances (limit {limit})")]
    TooManyInstances { count: usize, limit: usize },
}

/// Time signature (numerator, denominator)
///
/// The denominator is always a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

impl TimeSignature {
    /// Create a time signature, normalizing invalid parts
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator: numerator.max(1),
            denominator: denominator.max(1).checked_next_power_of_two().unwrap_or(128),
        }
    }

    /// Beats per measure
    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    /// Beat unit
    pub fn denominator(&self) -> u8 {
        self.denominator
    }

    /// Denominator as a power of two exponent (4 -> 2)
    pub fn denominator_log2(&self) -> u8 {
        self.denominator.trailing_zeros() as u8
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl From<(u8, u8)> for TimeSignature {
    fn from((numerator, denominator): (u8, u8)) -> Self {
        Self::new(numerator, denominator)
    }
}

impl From<TimeSignature> for (u8, u8) {
    fn from(sig: TimeSignature) -> Self {
        (sig.numerator, sig.denominator)
    }
}

/// One chord or rest with a length in beats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongEvent {
    /// Unique key within the section
    pub id: String,
    /// Chord to play, or None for a rest
    #[serde(default)]
    pub chord: Option<ChordRef>,
    /// Length in beats as entered
    pub duration: f64,
}

impl SongEvent {
    /// Create a chord event
    pub fn chord(id: impl Into<String>, chord: ChordRef, duration: f64) -> Self {
        Self {
            id: id.into(),
            chord: Some(chord),
            duration,
        }
    }

    /// Create a rest
    pub fn rest(id: impl Into<String>, duration: f64) -> Self {
        Self {
            id: id.into(),
            chord: None,
            duration,
        }
    }

    /// Length in beats, never below [`MIN_DURATION_BEATS`]
    pub fn duration_beats(&self) -> f64 {
        normalize_duration(self.duration)
    }

    /// Check if this event is a rest
    pub fn is_rest(&self) -> bool {
        self.chord.is_none()
    }
}

/// A named, repeatable block of events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongSection {
    /// Unique key within the song
    pub id: String,
    /// Display label ("Verse", "Chorus", ...)
    pub name: String,
    /// Events in play order
    #[serde(default)]
    pub events: Vec<SongEvent>,
    /// Times the section plays, as entered
    #[serde(default)]
    pub repeat: Option<f64>,
}

impl SongSection {
    /// Create an empty section that plays once
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            events: Vec::new(),
            repeat: None,
        }
    }

    /// Builder: set repeat count
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = Some(repeat as f64);
        self
    }

    /// Builder: append an event
    pub fn with_event(mut self, event: SongEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Number of passes, between 1 and [`MAX_REPEAT`]
    pub fn repeat_count(&self) -> u32 {
        match self.repeat {
            Some(r) if r.is_finite() && r >= 1.0 => r.floor().min(MAX_REPEAT as f64) as u32,
            _ => 1,
        }
    }

    /// Length of one pass in beats
    pub fn pass_beats(&self) -> f64 {
        self.events.iter().map(SongEvent::duration_beats).sum()
    }

    /// Length of all passes in beats
    pub fn total_beats(&self) -> f64 {
        self.pass_beats() * self.repeat_count() as f64
    }
}

/// A complete song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Song title (also written as the track name on export)
    pub title: String,
    /// Tempo in BPM as entered
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Time signature
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Sections in play order
    #[serde(default)]
    pub sections: Vec<SongSection>,
}

fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}

impl Song {
    /// Create an empty song at the default tempo in 4/4
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::default(),
            sections: Vec::new(),
        }
    }

    /// Builder: set tempo
    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = bpm;
        self
    }

    /// Builder: set time signature
    pub fn with_time_signature(mut self, numerator: u8, denominator: u8) -> Self {
        self.time_signature = TimeSignature::new(numerator, denominator);
        self
    }

    /// Builder: append a section
    pub fn with_section(mut self, section: SongSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Tempo in BPM, never below [`MIN_TEMPO`]
    pub fn effective_tempo(&self) -> f64 {
        normalize_tempo(self.tempo)
    }

    /// Total length in beats with repeats expanded
    pub fn total_beats(&self) -> f64 {
        self.sections.iter().map(SongSection::total_beats).sum()
    }

    /// Total length in seconds at the song tempo
    pub fn total_seconds(&self) -> f64 {
        self.total_beats() * 60.0 / self.effective_tempo()
    }

    /// Number of instances the song flattens to
    pub fn instance_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.events.len().saturating_mul(s.repeat_count() as usize))
            .fold(0, usize::saturating_add)
    }

    /// Check the id uniqueness that playback tracking relies on, and that
    /// the expanded song stays a playable size
    pub fn validate(&self) -> Result<(), SongError> {
        let count = self.instance_count();
        if count > MAX_INSTANCES {
            return Err(SongError::TooManyInstances {
                count,
                limit: MAX_INSTANCES,
            });
        }

        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if !section_ids.insert(section.id.as_str()) {
                return Err(SongError::DuplicateSectionId(section.id.clone()));
            }

            let mut event_ids = HashSet::new();
            for event in &section.events {
                if !event_ids.insert(event.id.as_str()) {
                    return Err(SongError::DuplicateEventId {
                        section_id: section.id.clone(),
                        event_id: event.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
