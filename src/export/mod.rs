// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song export.
//!
//! This module provides:
//! - A big-endian byte builder with variable-length quantities
//! - Standard MIDI file export of a song

pub mod midi_file;
pub mod writer;

pub use midi_file::{beats_to_ticks, tempo_micros, SequenceFileWriter, TICKS_PER_BEAT};
pub use writer::ByteWriter;

/// File name for an exported song: lower-case, non-alphanumerics as `_`
pub fn export_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "untitled.mid".to_string()
    } else {
        format!("{}.mid", stem)
    }
}
