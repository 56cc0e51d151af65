// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord-chart playback engine.
//!
//! Songs are sections of timed chord and rest events. They are flattened into
//! a timeline, played against a wall-clock transport, and exported as
//! Standard MIDI Files.

pub mod arrangement;
pub mod audio;
pub mod config;
pub mod control;
pub mod export;
pub mod midi;
pub mod sequencer;
pub mod timing;
pub mod ui;
