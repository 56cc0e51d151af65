// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song and chord model.
//!
//! This module provides:
//! - Songs: titled, tempo-bearing lists of sections
//! - Sections: named, repeatable runs of chord/rest events
//! - Chords: library definitions and fingerings referenced by events

pub mod chord;
pub mod song;

pub use chord::{ChordDefinition, ChordPosition, ChordRef, Fret, OPEN_STRING_PITCHES};
pub use song::{
    normalize_duration, normalize_tempo, Song, SongError, SongEvent, SongSection, TimeSignature,
    DEFAULT_TEMPO, MAX_INSTANCES, MAX_REPEAT, MIN_DURATION_BEATS, MIN_TEMPO,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_creation() {
        let song = Song::new("My Song");
        assert_eq!(song.title, "My Song");
        assert!(song.sections.is_empty());
        assert_eq!(song.effective_tempo(), DEFAULT_TEMPO);
    }

    #[test]
    fn test_section_creation() {
        let section = SongSection::new("s1", "Chorus");
        assert_eq!(section.name, "Chorus");
        assert_eq!(section.repeat_count(), 1);
    }
}
