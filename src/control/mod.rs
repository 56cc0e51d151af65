// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Player controls.
//!
//! This module provides:
//! - Transport actions and how they drive the scheduler
//! - Keyboard shortcut handling

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, Shortcut};

use std::time::Instant;

use crate::audio::NoteSource;
use crate::sequencer::{Direction, PlaybackScheduler};

/// BPM change per tempo step
pub const TEMPO_STEP: f64 = 1.0;

/// Action that can be triggered by controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    // Transport
    /// Toggle play/pause
    TogglePlay,
    /// Pause, or rewind when already stopped
    Stop,

    // Navigation
    /// Previous instance
    PrevBar,
    /// Next instance
    NextBar,
    /// Start of this section, or the previous one
    PrevSection,
    /// Start of the next section
    NextSection,

    // Tempo
    /// Tempo up one step
    TempoUp,
    /// Tempo down one step
    TempoDown,

    /// Toggle the metronome
    ToggleMetronome,
    /// Quit application
    Quit,
}

impl PlayerAction {
    /// Check if this is a transport action
    pub fn is_transport(&self) -> bool {
        matches!(self, PlayerAction::TogglePlay | PlayerAction::Stop)
    }

    /// Check if this moves the playhead
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            PlayerAction::PrevBar
                | PlayerAction::NextBar
                | PlayerAction::PrevSection
                | PlayerAction::NextSection
        )
    }

    /// Check if this is a tempo action
    pub fn is_tempo(&self) -> bool {
        matches!(self, PlayerAction::TempoUp | PlayerAction::TempoDown)
    }

    /// Apply the action to a scheduler
    ///
    /// `Quit` is left to the caller.
    pub fn apply<N: NoteSource>(&self, scheduler: &mut PlaybackScheduler<N>, now: Instant) {
        match self {
            PlayerAction::TogglePlay => {
                scheduler.toggle_play(now);
            }
            PlayerAction::Stop => scheduler.stop(now),
            PlayerAction::PrevBar => scheduler.seek_to_adjacent_instance(Direction::Backward, now),
            PlayerAction::NextBar => scheduler.seek_to_adjacent_instance(Direction::Forward, now),
            PlayerAction::PrevSection => {
                scheduler.seek_to_adjacent_section(Direction::Backward, now)
            }
            PlayerAction::NextSection => {
                scheduler.seek_to_adjacent_section(Direction::Forward, now)
            }
            PlayerAction::TempoUp => {
                let tempo = scheduler.tempo() + TEMPO_STEP;
                scheduler.set_tempo(tempo, now);
            }
            PlayerAction::TempoDown => {
                let tempo = scheduler.tempo() - TEMPO_STEP;
                scheduler.set_tempo(tempo, now);
            }
            PlayerAction::ToggleMetronome => {
                let enabled = scheduler.metronome_enabled();
                scheduler.set_metronome_enabled(!enabled);
            }
            PlayerAction::Quit => {}
        }
    }
}
