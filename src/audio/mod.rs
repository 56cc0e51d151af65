// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sound sources for playback.
//!
//! This module provides:
//! - The `NoteSource` trait the scheduler triggers chords and clicks through
//! - A silent source for when no output is available
//! - A logging source for headless runs
//! - A MIDI-backed source for live output

pub mod midi_source;

pub use midi_source::MidiNoteSource;

use std::time::Instant;

use tracing::info;

use crate::arrangement::ChordPosition;

/// Destination for triggered chords and metronome clicks.
///
/// Calls are fire-and-forget: implementations must return promptly and
/// must swallow their own failures. A source that is not ready yet simply
/// does nothing.
pub trait NoteSource {
    /// Sound every string of a fingering for `duration_secs`
    fn play_chord(&mut self, position: &ChordPosition, duration_secs: f64);

    /// Sound one metronome click
    fn play_click(&mut self, downbeat: bool);

    /// Called once per scheduler tick before any trigger
    fn update(&mut self, _now: Instant) {}
}

impl<N: NoteSource + ?Sized> NoteSource for Box<N> {
    fn play_chord(&mut self, position: &ChordPosition, duration_secs: f64) {
        (**self).play_chord(position, duration_secs)
    }

    fn play_click(&mut self, downbeat: bool) {
        (**self).play_click(downbeat)
    }

    fn update(&mut self, now: Instant) {
        (**self).update(now)
    }
}

/// Note source that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNoteSource;

impl NoteSource for SilentNoteSource {
    fn play_chord(&mut self, _position: &ChordPosition, _duration_secs: f64) {}

    fn play_click(&mut self, _downbeat: bool) {}
}

/// Note source that reports triggers through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNoteSource;

impl NoteSource for LogNoteSource {
    fn play_chord(&mut self, position: &ChordPosition, duration_secs: f64) {
        let frets: Vec<String> = position.frets.iter().map(ToString::to_string).collect();
        info!(
            frets = %frets.join(""),
            pitches = ?position.pitches(),
            duration_secs,
            "chord"
        );
    }

    fn play_click(&mut self, downbeat: bool) {
        info!(downbeat, "click");
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_source_accepts_calls() {
        let mut source = SilentNoteSource;
        let position = ChordPosition::from_shape("x32010").unwrap();
        source.play_chord(&position, 1.0);
        source.play_click(true);
        source.update(Instant::now());
    }

    #[test]
    fn test_boxed_source_forwards() {
        let mut source: Box<recording::RecordingSource> = Box::default();
        source.play_click(false);
        NoteSource::update(&mut source, Instant::now());
        assert_eq!(source.clicks(), vec![false]);
        assert_eq!(source.updates, 1);
    }
}
