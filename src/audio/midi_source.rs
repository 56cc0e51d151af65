// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note source that plays through a MIDI output.
//!
//! Note-offs are queued with a deadline and released from `update`, so
//! triggering never waits on the length of a chord.

use std::time::{Duration, Instant};

use tracing::warn;

use super::NoteSource;
use crate::arrangement::ChordPosition;
use crate::midi::{self, MidiOutput};

/// Channel chords play on
pub const CHORD_CHANNEL: u8 = 0;
/// General MIDI percussion channel
pub const CLICK_CHANNEL: u8 = 9;
/// Nylon guitar
pub const GUITAR_PROGRAM: u8 = 24;
/// Hi wood block
const CLICK_NOTE_DOWNBEAT: u8 = 76;
/// Low wood block
const CLICK_NOTE: u8 = 77;
/// How long a click sounds
const CLICK_LENGTH: Duration = Duration::from_millis(50);
/// Velocity at full volume
const BASE_VELOCITY: f32 = 100.0;

/// A note waiting to be released
#[derive(Debug, Clone, Copy)]
struct PendingOff {
    deadline: Instant,
    channel: u8,
    note: u8,
}

/// MIDI-backed note source
pub struct MidiNoteSource<O: MidiOutput> {
    /// Output port (None = not connected, every call is a no-op)
    output: Option<O>,
    /// Notes still sounding
    pending: Vec<PendingOff>,
    /// Time of the last update, used as "now" for new deadlines
    now: Option<Instant>,
    /// Chord volume (0.0 - 1.0)
    song_volume: f32,
    /// Click volume (0.0 - 1.0)
    click_volume: f32,
}

impl<O: MidiOutput> MidiNoteSource<O> {
    /// Create a source, selecting the guitar program if connected
    pub fn new(output: Option<O>) -> Self {
        let mut source = Self {
            output,
            pending: Vec::new(),
            now: None,
            song_volume: 0.75,
            click_volume: 0.75,
        };
        source.send(&midi::program_change(CHORD_CHANNEL, GUITAR_PROGRAM));
        source
    }

    /// Create a source with no output
    pub fn disconnected() -> Self {
        Self::new(None)
    }

    /// Check if an output is attached
    pub fn is_connected(&self) -> bool {
        self.output.is_some()
    }

    /// Set chord volume (0.0 - 1.0)
    pub fn set_song_volume(&mut self, volume: f32) {
        self.song_volume = volume.clamp(0.0, 1.0);
    }

    /// Set click volume (0.0 - 1.0)
    pub fn set_click_volume(&mut self, volume: f32) {
        self.click_volume = volume.clamp(0.0, 1.0);
    }

    /// Chord volume
    pub fn song_volume(&self) -> f32 {
        self.song_volume
    }

    /// Click volume
    pub fn click_volume(&self) -> f32 {
        self.click_volume
    }

    /// Number of notes still sounding
    pub fn sounding(&self) -> usize {
        self.pending.len()
    }

    /// Release every sounding note now
    pub fn release_all(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for off in pending {
            self.send(&midi::note_off(off.channel, off.note));
        }
    }

    fn send(&mut self, message: &[u8]) {
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.send(message) {
                warn!("MIDI send failed: {:#}", e);
            }
        }
    }

    fn start_note(&mut self, channel: u8, note: u8, velocity: u8, length: Duration) {
        let now = self.now.unwrap_or_else(Instant::now);
        self.send(&midi::note_on(channel, note, velocity));
        self.pending.push(PendingOff {
            deadline: now + length,
            channel,
            note,
        });
    }

    fn release_channel(&mut self, channel: u8) {
        let (release, keep): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|off| off.channel == channel);
        self.pending = keep;
        for off in release {
            self.send(&midi::note_off(off.channel, off.note));
        }
    }
}

fn velocity(volume: f32) -> Option<u8> {
    let v = (BASE_VELOCITY * volume).round();
    if v < 1.0 {
        None
    } else {
        Some(v.min(127.0) as u8)
    }
}

impl<O: MidiOutput> NoteSource for MidiNoteSource<O> {
    fn play_chord(&mut self, position: &ChordPosition, duration_secs: f64) {
        if self.output.is_none() {
            return;
        }
        // A new chord replaces whatever is still ringing
        self.release_channel(CHORD_CHANNEL);

        let Some(vel) = velocity(self.song_volume) else {
            return;
        };
        let length = Duration::try_from_secs_f64(duration_secs).unwrap_or(Duration::ZERO);
        for pitch in position.pitches() {
            self.start_note(CHORD_CHANNEL, pitch, vel, length);
        }
    }

    fn play_click(&mut self, downbeat: bool) {
        if self.output.is_none() {
            return;
        }
        let Some(vel) = velocity(self.click_volume) else {
            return;
        };
        let note = if downbeat { CLICK_NOTE_DOWNBEAT } else { CLICK_NOTE };
        self.start_note(CLICK_CHANNEL, note, vel, CLICK_LENGTH);
    }

    fn update(&mut self, now: Instant) {
        self.now = Some(now);
        if self.pending.iter().all(|off| off.deadline > now) {
            return;
        }
        let (due, keep): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|off| off.deadline <= now);
        self.pending = keep;
        for off in due {
            self.send(&midi::note_off(off.channel, off.note));
        }
    }
}

impl<O: MidiOutput> Drop for MidiNoteSource<O> {
    fn drop(&mut self) {
        self.release_all();
    }
}
