// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback scheduler.
//!
//! Cooperative per-frame driver: the host calls [`PlaybackScheduler::tick`]
//! repeatedly while playing. Each tick reads the clock, emits metronome
//! clicks on whole-beat crossings and triggers the instance under the
//! playhead exactly once per instance id.

use std::time::Instant;

use tracing::debug;

use super::timeline::{TimedInstance, Timeline};
use crate::arrangement::{Song, TimeSignature};
use crate::audio::NoteSource;
use crate::timing::{ClockState, TransportClock};

/// Result of a tick, telling the host whether to keep ticking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Not playing; nothing happened
    Idle,
    /// Still playing; request another tick
    Continue,
    /// Playback reached the end (or there was nothing to play) and stopped
    Finished,
}

/// Seek direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Drives a note source from the timeline and the transport clock
pub struct PlaybackScheduler<N: NoteSource> {
    /// Flattened song
    timeline: Timeline,
    /// Wall time to beat mapping
    clock: TransportClock,
    /// Time signature for downbeat detection
    time_signature: TimeSignature,
    /// Where chords and clicks go
    note_source: N,
    /// Id of the instance triggered most recently
    last_triggered: Option<String>,
    /// Last whole beat a click was considered for
    last_whole_beat: i64,
    /// Index of the instance under the playhead
    active_index: usize,
    /// Whether whole beats produce clicks
    metronome_enabled: bool,
}

impl<N: NoteSource> PlaybackScheduler<N> {
    /// Create a scheduler for a song snapshot
    pub fn new(song: &Song, note_source: N) -> Self {
        let timeline = Timeline::build(song);
        let clock = TransportClock::new(song.effective_tempo(), timeline.total_beats());
        Self {
            timeline,
            clock,
            time_signature: song.time_signature,
            note_source,
            last_triggered: None,
            last_whole_beat: -1,
            active_index: 0,
            metronome_enabled: true,
        }
    }

    /// The flattened song
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The transport clock
    pub fn clock(&self) -> &TransportClock {
        &self.clock
    }

    /// Transport state
    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Current tempo in BPM
    pub fn tempo(&self) -> f64 {
        self.clock.tempo()
    }

    /// Time signature in use
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Index of the instance under the playhead
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Instance under the playhead
    pub fn active_instance(&self) -> Option<&TimedInstance> {
        self.timeline.get(self.active_index)
    }

    /// Name of the next different section after the active instance
    pub fn next_section_name(&self) -> Option<&str> {
        self.timeline.next_section_name(self.active_index)
    }

    /// Id of the last triggered instance
    pub fn last_triggered(&self) -> Option<&str> {
        self.last_triggered.as_deref()
    }

    /// Beat position at `now`
    pub fn current_beat(&self, now: Instant) -> f64 {
        self.clock.beat(now)
    }

    /// Position as a fraction in `[0, 1]`
    pub fn progress(&self, now: Instant) -> f64 {
        self.clock.progress(now)
    }

    /// Check if clicks are emitted
    pub fn metronome_enabled(&self) -> bool {
        self.metronome_enabled
    }

    /// Enable or disable clicks (beat tracking continues either way)
    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.metronome_enabled = enabled;
    }

    /// The note source
    pub fn note_source(&self) -> &N {
        &self.note_source
    }

    /// Mutable access to the note source
    pub fn note_source_mut(&mut self) -> &mut N {
        &mut self.note_source
    }

    /// Consume the scheduler, returning the note source
    pub fn into_note_source(self) -> N {
        self.note_source
    }

    /// Start or resume playback
    ///
    /// Returns true if the host should start ticking.
    pub fn play(&mut self, now: Instant) -> bool {
        if self.timeline.is_empty() {
            return false;
        }
        if let ClockState::Paused { at_beat } = self.clock.state() {
            if at_beat >= self.timeline.total_beats() {
                // Finished run: restart from the top
                self.reset_tracking();
                self.active_index = 0;
            }
        }
        self.clock.play(now);
        self.clock.is_playing()
    }

    /// Freeze the position
    pub fn pause(&mut self, now: Instant) {
        self.clock.pause(now);
    }

    /// Pause if playing, otherwise rewind to the start
    pub fn stop(&mut self, now: Instant) {
        if self.clock.is_playing() {
            self.clock.stop(now);
        } else {
            self.clock.stop(now);
            self.reset_tracking();
            self.active_index = 0;
        }
    }

    /// Toggle between playing and paused
    pub fn toggle_play(&mut self, now: Instant) -> bool {
        if self.clock.is_playing() {
            self.pause(now);
            false
        } else {
            self.play(now)
        }
    }

    /// Change tempo from `now` on
    pub fn set_tempo(&mut self, bpm: f64, now: Instant) {
        self.clock.set_tempo(bpm, now);
        debug!(tempo = self.clock.tempo(), "tempo changed");
    }

    /// Jump to the start of an instance, clamped into range
    ///
    /// The instance at the new position triggers on the next tick.
    pub fn seek_to_instance(&mut self, index: usize, now: Instant) {
        let Some(index) = self.timeline.clamp_index(index) else {
            return;
        };
        let start = self.timeline.instances()[index].start_beat;
        self.clock.seek(start, now);
        self.reset_tracking();
        self.active_index = index;
        debug!(index, start, "seek to instance");
    }

    /// Jump one instance backward or forward
    pub fn seek_to_adjacent_instance(&mut self, direction: Direction, now: Instant) {
        let target = match direction {
            Direction::Backward => self.active_index.saturating_sub(1),
            Direction::Forward => self.active_index.saturating_add(1),
        };
        self.seek_to_instance(target, now);
    }

    /// Jump to a section boundary
    ///
    /// Backward goes to the start of the current section, or to the start of
    /// the previous section when already on the first instance. Forward goes
    /// to the next section, or to the last instance when there is none.
    pub fn seek_to_adjacent_section(&mut self, direction: Direction, now: Instant) {
        let Some(current) = self.timeline.clamp_index(self.active_index) else {
            return;
        };
        let target = match direction {
            Direction::Backward => match self.timeline.section_start(current) {
                Some(start) if current > start => start,
                _ => self.timeline.previous_section_start(current).unwrap_or(0),
            },
            Direction::Forward => self
                .timeline
                .next_section_start(current)
                .unwrap_or(self.timeline.len() - 1),
        };
        self.seek_to_instance(target, now);
    }

    /// Swap in an edited song
    ///
    /// The timeline is rebuilt from scratch. Instance ids are stable for
    /// unchanged content, so an instance already sounding is not retriggered.
    pub fn replace_song(&mut self, song: &Song, now: Instant) {
        self.timeline = Timeline::build(song);
        self.time_signature = song.time_signature;
        self.clock.set_tempo(song.effective_tempo(), now);
        self.clock.set_total_beats(self.timeline.total_beats());

        match self.timeline.clamp_index(self.active_index) {
            Some(index) => self.active_index = index,
            None => {
                self.clock.finish();
                self.reset_tracking();
                self.active_index = 0;
            }
        }
        debug!(
            instances = self.timeline.len(),
            total_beats = self.timeline.total_beats(),
            "timeline rebuilt"
        );
    }

    /// Advance playback to `now`
    pub fn tick(&mut self, now: Instant) -> TickStatus {
        if !self.clock.is_playing() {
            return TickStatus::Idle;
        }
        if self.timeline.is_empty() {
            self.finish();
            return TickStatus::Finished;
        }

        self.note_source.update(now);
        let elapsed = self.clock.beat(now);

        let whole_beat = elapsed.floor() as i64;
        if whole_beat > self.last_whole_beat {
            if self.metronome_enabled {
                let beats_per_measure = self.time_signature.numerator() as i64;
                self.note_source
                    .play_click(whole_beat.rem_euclid(beats_per_measure) == 0);
            }
            self.last_whole_beat = whole_beat;
        }

        if let Some(index) = self.timeline.instance_at(elapsed) {
            let instance = &self.timeline.instances()[index];
            if self.last_triggered.as_deref() != Some(instance.instance_id.as_str()) {
                if let Some(position) = instance.chord.as_ref().and_then(|c| c.position()) {
                    let duration_secs = instance.duration_seconds(self.clock.tempo());
                    self.note_source.play_chord(position, duration_secs);
                }
                self.last_triggered = Some(instance.instance_id.clone());
                self.active_index = index;
            }
        }

        if elapsed >= self.timeline.total_beats() {
            self.finish();
            return TickStatus::Finished;
        }
        TickStatus::Continue
    }

    fn finish(&mut self) {
        self.clock.finish();
        self.reset_tracking();
        self.active_index = 0;
    }

    fn reset_tracking(&mut self) {
        self.last_triggered = None;
        self.last_whole_beat = -1;
    }
}
