// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord library types as seen by the playback core.
//!
//! Chord definitions are produced by the chord library (outside this crate);
//! the core only reads fingerings to turn them into pitches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Open-string MIDI pitches for standard tuning, low to high (E2 A2 D3 G3 B3 E4)
pub const OPEN_STRING_PITCHES: [u8; 6] = [40, 45, 50, 55, 59, 64];

/// Highest valid MIDI pitch
const MAX_PITCH: u8 = 127;

/// State of a single string in a fingering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFret", into = "RawFret")]
pub enum Fret {
    /// String is not played ("x" in the chord library)
    Muted,
    /// String is played at this fret (0 = open)
    At(u8),
}

impl Fret {
    /// Fret number, or None if muted
    pub fn number(&self) -> Option<u8> {
        match self {
            Fret::Muted => None,
            Fret::At(n) => Some(*n),
        }
    }

    /// Check if the string is muted
    pub fn is_muted(&self) -> bool {
        matches!(self, Fret::Muted)
    }
}

impl fmt::Display for Fret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fret::Muted => write!(f, "x"),
            Fret::At(n) => write!(f, "{}", n),
        }
    }
}

/// Wire form of a fret: a number or the string "x"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFret {
    Number(u8),
    Text(String),
}

impl TryFrom<RawFret> for Fret {
    type Error = String;

    fn try_from(raw: RawFret) -> Result<Self, Self::Error> {
        match raw {
            RawFret::Number(n) => Ok(Fret::At(n)),
            RawFret::Text(s) if s.eq_ignore_ascii_case("x") => Ok(Fret::Muted),
            RawFret::Text(s) => s
                .trim()
                .parse::<u8>()
                .map(Fret::At)
                .map_err(|_| format!("invalid fret value: {:?}", s)),
        }
    }
}

impl From<Fret> for RawFret {
    fn from(fret: Fret) -> Self {
        match fret {
            Fret::Muted => RawFret::Text("x".to_string()),
            Fret::At(n) => RawFret::Number(n),
        }
    }
}

/// One fingering of a chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordPosition {
    /// Fret per string, low to high
    pub frets: Vec<Fret>,
    /// Finger per string (None = no finger)
    #[serde(default)]
    pub fingers: Vec<Option<u8>>,
    /// Frets covered by a barre
    #[serde(default)]
    pub barres: Vec<u8>,
    /// Lowest fret shown in the diagram
    #[serde(default = "default_base_fret")]
    pub base_fret: u8,
    /// Whether the barre is drawn as a capo
    #[serde(default)]
    pub capo: bool,
}

fn default_base_fret() -> u8 {
    1
}

impl ChordPosition {
    /// Create a position from frets only
    pub fn new(frets: Vec<Fret>) -> Self {
        Self {
            frets,
            fingers: Vec::new(),
            barres: Vec::new(),
            base_fret: default_base_fret(),
            capo: false,
        }
    }

    /// Parse a compact fret string such as "x32010"
    ///
    /// Each character is one string; only single-digit frets are supported.
    pub fn from_shape(shape: &str) -> Option<Self> {
        let frets = shape
            .chars()
            .map(|c| match c {
                'x' | 'X' => Some(Fret::Muted),
                d => d.to_digit(10).map(|n| Fret::At(n as u8)),
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(frets))
    }

    /// MIDI pitches of every sounding string, low to high
    pub fn pitches(&self) -> Vec<u8> {
        self.frets
            .iter()
            .zip(OPEN_STRING_PITCHES.iter())
            .filter_map(|(fret, open)| {
                fret.number()
                    .map(|n| open.saturating_add(n).min(MAX_PITCH))
            })
            .collect()
    }
}

/// A chord from the library with all its fingerings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordDefinition {
    /// Root key (e.g. "C", "F#")
    pub key: String,
    /// Quality suffix (e.g. "major", "m7")
    #[serde(default)]
    pub suffix: String,
    /// Available fingerings
    #[serde(default)]
    pub positions: Vec<ChordPosition>,
}

impl ChordDefinition {
    /// Create a new chord definition
    pub fn new(key: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            suffix: suffix.into(),
            positions: Vec::new(),
        }
    }

    /// Builder: add a fingering
    pub fn with_position(mut self, position: ChordPosition) -> Self {
        self.positions.push(position);
        self
    }

    /// Display name
    pub fn name(&self) -> String {
        format!("{}{}", self.key, self.suffix)
    }
}

/// Reference from a song event to a chord and the chosen fingering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordRef {
    /// The chord definition
    pub chord: ChordDefinition,
    /// Index into `chord.positions`
    #[serde(default)]
    pub position_index: usize,
}

impl ChordRef {
    /// Create a reference to a fingering
    pub fn new(chord: ChordDefinition, position_index: usize) -> Self {
        Self {
            chord,
            position_index,
        }
    }

    /// The selected fingering, or None if the index does not exist
    pub fn position(&self) -> Option<&ChordPosition> {
        self.chord.positions.get(self.position_index)
    }

    /// Display name of the chord
    pub fn name(&self) -> String {
        self.chord.name()
    }
}
