// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport clock.
//!
//! Maps a monotonic wall clock onto song beats. The position while playing
//! is always derived from the absolute time since the last rebase, never
//! accumulated per call, so irregular polling cannot drift.

use std::time::Instant;

use tracing::debug;

use crate::arrangement::{normalize_tempo, DEFAULT_TEMPO};

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockState {
    /// Nothing loaded or playback ran to the end
    Stopped,
    /// Holding a position
    Paused { at_beat: f64 },
    /// Running from `origin_beat` at wall time `origin`
    Playing { origin: Instant, origin_beat: f64 },
}

/// Wall time to beat time mapping with rebasing
#[derive(Debug, Clone)]
pub struct TransportClock {
    /// Current state
    state: ClockState,
    /// Tempo in BPM (always normalized)
    tempo: f64,
    /// Song length in beats
    total_beats: f64,
}

impl TransportClock {
    /// Create a stopped clock
    pub fn new(tempo: f64, total_beats: f64) -> Self {
        Self {
            state: ClockState::Stopped,
            tempo: normalize_tempo(tempo),
            total_beats: clamp_total(total_beats),
        }
    }

    /// Current state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Check if running
    pub fn is_playing(&self) -> bool {
        matches!(self.state, ClockState::Playing { .. })
    }

    /// Tempo in BPM
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Song length in beats
    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }

    /// Beats advanced per second of wall time
    pub fn beats_per_second(&self) -> f64 {
        self.tempo / 60.0
    }

    /// Beat position at `now`
    pub fn beat(&self, now: Instant) -> f64 {
        match self.state {
            ClockState::Stopped => 0.0,
            ClockState::Paused { at_beat } => at_beat,
            ClockState::Playing { origin, origin_beat } => {
                let elapsed = now.saturating_duration_since(origin).as_secs_f64();
                origin_beat + elapsed * self.beats_per_second()
            }
        }
    }

    /// Position as a fraction of the song in `[0, 1]`
    pub fn progress(&self, now: Instant) -> f64 {
        if self.total_beats <= 0.0 {
            return 0.0;
        }
        (self.beat(now) / self.total_beats).clamp(0.0, 1.0)
    }

    /// Start or resume playback
    ///
    /// Resuming from a position at or past the end restarts from the top.
    /// Does nothing when already playing or when there is nothing to play.
    pub fn play(&mut self, now: Instant) {
        if self.total_beats <= 0.0 {
            return;
        }
        let origin_beat = match self.state {
            ClockState::Playing { .. } => return,
            ClockState::Stopped => 0.0,
            ClockState::Paused { at_beat } if at_beat >= self.total_beats => 0.0,
            ClockState::Paused { at_beat } => at_beat,
        };
        debug!(origin_beat, "transport play");
        self.state = ClockState::Playing {
            origin: now,
            origin_beat,
        };
    }

    /// Freeze the current position
    pub fn pause(&mut self, now: Instant) {
        if self.is_playing() {
            let at_beat = self.beat(now).min(self.total_beats);
            debug!(at_beat, "transport pause");
            self.state = ClockState::Paused { at_beat };
        }
    }

    /// Pause if playing, otherwise rewind to the start
    pub fn stop(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause(now);
        } else {
            debug!("transport reset");
            self.state = ClockState::Paused { at_beat: 0.0 };
        }
    }

    /// Mark playback as finished
    pub fn finish(&mut self) {
        debug!("transport finished");
        self.state = ClockState::Stopped;
    }

    /// Move to a beat, clamped into `[0, total_beats]`
    pub fn seek(&mut self, target_beat: f64, now: Instant) {
        let target = if target_beat.is_nan() {
            0.0
        } else {
            target_beat.clamp(0.0, self.total_beats)
        };
        self.state = match self.state {
            ClockState::Playing { .. } => ClockState::Playing {
                origin: now,
                origin_beat: target,
            },
            _ => ClockState::Paused { at_beat: target },
        };
    }

    /// Change tempo from `now` on without warping elapsed beats
    pub fn set_tempo(&mut self, bpm: f64, now: Instant) {
        if let ClockState::Playing { .. } = self.state {
            // Rebase under the old tempo first
            let origin_beat = self.beat(now);
            self.state = ClockState::Playing {
                origin: now,
                origin_beat,
            };
        }
        self.tempo = normalize_tempo(bpm);
    }

    /// Update the song length after a timeline rebuild
    ///
    /// A held position past the new end is pulled back to the end. A running
    /// clock keeps running; the scheduler notices the overrun on its next tick.
    pub fn set_total_beats(&mut self, total_beats: f64) {
        self.total_beats = clamp_total(total_beats);
        if let ClockState::Paused { at_beat } = self.state {
            if at_beat > self.total_beats {
                self.state = ClockState::Paused {
                    at_beat: self.total_beats,
                };
            }
        }
    }
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO, 0.0)
    }
}

fn clamp_total(total_beats: f64) -> f64 {
    if total_beats.is_finite() {
        total_beats.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::MIN_TEMPO;
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_clock_creation() {
        let clock = TransportClock::new(120.0, 16.0);
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.tempo(), 120.0);
        assert_eq!(clock.total_beats(), 16.0);
        assert_eq!(clock.beat(Instant::now()), 0.0);
    }

    #[test]
    fn test_tempo_clamping() {
        assert_eq!(TransportClock::new(0.0, 4.0).tempo(), MIN_TEMPO);
        assert_eq!(TransportClock::new(f64::NAN, 4.0).tempo(), MIN_TEMPO);
    }

    #[test]
    fn test_beat_mapping() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(120.0, 16.0);
        clock.play(t0);
        assert!(clock.is_playing());
        assert!((clock.beat(t0) - 0.0).abs() < EPS);
        assert!((clock.beat(t0 + secs(1.0)) - 2.0).abs() < EPS);
        assert!((clock.beat(t0 + secs(2.25)) - 4.5).abs() < EPS);
    }

    #[test]
    fn test_beat_is_monotonic() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(97.0, 100.0);
        clock.play(t0);
        let mut last = clock.beat(t0);
        for ms in (1..5000).step_by(7) {
            let beat = clock.beat(t0 + Duration::from_millis(ms));
            assert!(beat > last);
            last = beat;
        }
    }

    #[test]
    fn test_play_on_empty_is_noop() {
        let mut clock = TransportClock::new(120.0, 0.0);
        clock.play(Instant::now());
        assert_eq!(clock.state(), ClockState::Stopped);
    }

    #[test]
    fn test_pause_and_resume() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 16.0);
        clock.play(t0);
        clock.pause(t0 + secs(3.0));
        assert_eq!(clock.state(), ClockState::Paused { at_beat: 3.0 });

        // Paused position does not move with time
        assert_eq!(clock.beat(t0 + secs(10.0)), 3.0);

        clock.play(t0 + secs(10.0));
        assert!((clock.beat(t0 + secs(11.0)) - 4.0).abs() < EPS);
    }

    #[test]
    fn test_resume_after_end_restarts() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 4.0);
        clock.seek(4.0, t0);
        clock.play(t0);
        assert!((clock.beat(t0) - 0.0).abs() < EPS);
    }

    #[test]
    fn test_stop_dual_behavior() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 16.0);
        clock.play(t0);

        // First stop while playing freezes the position
        clock.stop(t0 + secs(5.0));
        assert_eq!(clock.state(), ClockState::Paused { at_beat: 5.0 });

        // Second stop rewinds
        clock.stop(t0 + secs(6.0));
        assert_eq!(clock.state(), ClockState::Paused { at_beat: 0.0 });
    }

    #[test]
    fn test_seek_then_read() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(120.0, 16.0);

        clock.seek(6.5, t0);
        assert_eq!(clock.beat(t0), 6.5);

        clock.play(t0);
        let t1 = t0 + secs(1.3);
        clock.seek(9.25, t1);
        assert!(clock.is_playing());
        assert!((clock.beat(t1) - 9.25).abs() < EPS);
        assert!((clock.beat(t1 + secs(0.5)) - 10.25).abs() < EPS);
    }

    #[test]
    fn test_seek_clamps() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(120.0, 16.0);
        clock.seek(-3.0, t0);
        assert_eq!(clock.beat(t0), 0.0);
        clock.seek(99.0, t0);
        assert_eq!(clock.beat(t0), 16.0);
        clock.seek(f64::NAN, t0);
        assert_eq!(clock.beat(t0), 0.0);
    }

    #[test]
    fn test_tempo_change_rebases() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 100.0);
        clock.play(t0);

        // 4 beats at 60 BPM, then double speed
        let t1 = t0 + secs(4.0);
        clock.set_tempo(120.0, t1);
        assert!((clock.beat(t1) - 4.0).abs() < EPS);
        assert!((clock.beat(t1 + secs(1.0)) - 6.0).abs() < EPS);
    }

    #[test]
    fn test_tempo_change_while_paused() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 100.0);
        clock.seek(10.0, t0);
        clock.set_tempo(240.0, t0);
        assert_eq!(clock.beat(t0 + secs(3.0)), 10.0);
        assert_eq!(clock.tempo(), 240.0);
    }

    #[test]
    fn test_progress() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 8.0);
        assert_eq!(clock.progress(t0), 0.0);
        clock.play(t0);
        assert!((clock.progress(t0 + secs(2.0)) - 0.25).abs() < EPS);
        assert_eq!(clock.progress(t0 + secs(20.0)), 1.0);
    }

    #[test]
    fn test_shrinking_total_clamps_paused_position() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 16.0);
        clock.seek(12.0, t0);
        clock.set_total_beats(8.0);
        assert_eq!(clock.beat(t0), 8.0);
    }

    #[test]
    fn test_finish() {
        let t0 = Instant::now();
        let mut clock = TransportClock::new(60.0, 16.0);
        clock.play(t0);
        clock.finish();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.beat(t0 + secs(3.0)), 0.0);
    }
}
