// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Writes a song as a single-track Type 0 file by walking the flattened
//! timeline. Chords are block voiced on channel 0; rests become empty text
//! events whose delta carries the gap.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::writer::{ByteWriter, MAX_VAR_LEN};
use crate::arrangement::Song;
use crate::midi::{self, messages};
use crate::sequencer::{TimedInstance, Timeline};

/// File resolution
pub const TICKS_PER_BEAT: u16 = 480;
/// Largest tempo value the 3-byte meta event can hold
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;
/// Note-on velocity for every chord note
const NOTE_VELOCITY: u8 = 100;
/// Channel all notes go to
const CHANNEL: u8 = 0;
/// Nylon guitar
const PROGRAM: u8 = 24;

/// Convert a beat length to file ticks, rounded
pub fn beats_to_ticks(beats: f64) -> u32 {
    let ticks = (beats * TICKS_PER_BEAT as f64).round();
    if ticks.is_nan() || ticks <= 0.0 {
        0
    } else {
        (ticks as u32).min(MAX_VAR_LEN)
    }
}

/// Tempo as microseconds per quarter note, clamped to 24 bits
pub fn tempo_micros(bpm: f64) -> u32 {
    let micros = (60_000_000.0 / bpm).round();
    if micros.is_finite() {
        (micros as u32).clamp(1, MAX_TEMPO_MICROS)
    } else {
        MAX_TEMPO_MICROS
    }
}

/// Song to MIDI file writer
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceFileWriter;

impl SequenceFileWriter {
    /// Create a writer
    pub fn new() -> Self {
        Self
    }

    /// Encode a song as file bytes
    pub fn write(&self, song: &Song) -> Vec<u8> {
        let timeline = Timeline::build(song);
        let track = self.track_events(song, &timeline);

        let mut file = ByteWriter::new();
        // Header chunk
        file.text("MThd")
            .u32_be(6)
            .u16_be(0) // Format 0
            .u16_be(1) // One track
            .u16_be(TICKS_PER_BEAT);
        // Track chunk
        file.text("MTrk")
            .u32_be(track.len() as u32)
            .bytes(track.as_slice());
        file.into_bytes()
    }

    /// Encode a song into any writer
    pub fn write_to<W: Write>(&self, song: &Song, mut writer: W) -> Result<()> {
        writer
            .write_all(&self.write(song))
            .context("Failed to write MIDI data")?;
        writer.flush().context("Failed to flush MIDI data")?;
        Ok(())
    }

    /// Encode a song to a file
    pub fn save<P: AsRef<Path>>(&self, song: &Song, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create MIDI file: {:?}", path))?;
        self.write_to(song, BufWriter::new(file))?;
        info!(path = ?path, title = %song.title, "exported MIDI file");
        Ok(())
    }

    fn track_events(&self, song: &Song, timeline: &Timeline) -> ByteWriter {
        let mut track = ByteWriter::new();

        // Track name
        meta_text(&mut track, messages::META_TRACK_NAME, &song.title);

        // Tempo
        let micros = tempo_micros(song.effective_tempo());
        track
            .var_len(0)
            .bytes(&[messages::META, messages::META_TEMPO, 0x03])
            .bytes(&micros.to_be_bytes()[1..]);

        // Time signature: 24 clocks per click, 8 32nds per quarter
        let sig = song.time_signature;
        track.var_len(0).bytes(&[
            messages::META,
            messages::META_TIME_SIGNATURE,
            0x04,
            sig.numerator(),
            sig.denominator_log2(),
            0x18,
            0x08,
        ]);

        track.var_len(0).bytes(&midi::program_change(CHANNEL, PROGRAM));

        for instance in timeline.instances() {
            write_instance(&mut track, instance);
        }

        track
            .var_len(TICKS_PER_BEAT as u32)
            .bytes(&[messages::META, messages::META_END_OF_TRACK, 0x00]);
        track
    }
}

fn meta_text(track: &mut ByteWriter, kind: u8, text: &str) {
    let len = text.len().min(MAX_VAR_LEN as usize) as u32;
    track
        .var_len(0)
        .bytes(&[messages::META, kind])
        .var_len(len)
        .bytes(&text.as_bytes()[..len as usize]);
}

fn write_instance(track: &mut ByteWriter, instance: &TimedInstance) {
    if instance.is_section_start() {
        meta_text(track, messages::META_MARKER, &instance.section_name);
    }

    let ticks = beats_to_ticks(instance.duration_beats);
    let pitches = instance
        .chord
        .as_ref()
        .and_then(|chord| chord.position())
        .map(|position| position.pitches())
        .unwrap_or_default();

    if pitches.is_empty() {
        // Spacer so the gap survives
        track
            .var_len(ticks)
            .bytes(&[messages::META, messages::META_TEXT, 0x00]);
        return;
    }

    for &pitch in &pitches {
        track
            .var_len(0)
            .bytes(&midi::note_on(CHANNEL, pitch, NOTE_VELOCITY));
    }
    for (i, &pitch) in pitches.iter().enumerate() {
        let delta = if i == 0 { ticks } else { 0 };
        track.var_len(delta).bytes(&midi::note_off(CHANNEL, pitch));
    }
}
