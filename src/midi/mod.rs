// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output abstraction.
//!
//! This module provides a trait for sending raw MIDI messages so the
//! playback note source can drive any backend, plus the byte constants
//! shared with the sequence file writer.

#[cfg(feature = "midi-out")]
pub mod midir_backend;

use anyhow::Result;

#[cfg(feature = "midi-out")]
pub use midir_backend::{list_ports, print_ports, MidirOutput};

/// Sink for raw MIDI bytes, such as a hardware port or a virtual cable.
pub trait MidiOutput {
    /// Write one complete message, for example `[0x90, 48, 100]`.
    ///
    /// Errors are reported, never retried; callers on the playback path
    /// log and move on.
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

/// MIDI message constants
pub mod messages {
    // Status bytes; OR in the channel
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    // Meta events (file only)
    pub const META: u8 = 0xFF;
    pub const META_TEXT: u8 = 0x01;
    pub const META_TRACK_NAME: u8 = 0x03;
    pub const META_MARKER: u8 = 0x06;
    pub const META_END_OF_TRACK: u8 = 0x2F;
    pub const META_TEMPO: u8 = 0x51;
    pub const META_TIME_SIGNATURE: u8 = 0x58;
}

/// Build a note on message
pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [messages::NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Build a note off message
pub fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [messages::NOTE_OFF | (channel & 0x0F), note & 0x7F, 0]
}

/// Build a program change message
pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [messages::PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F]
}
