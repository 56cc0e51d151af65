// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core for turning a song into timed chord triggers.
//!
//! This module provides the playback infrastructure:
//! - Timeline flattening of sections, repeats and events into instances
//! - A playback scheduler driven by per-frame ticks

pub mod scheduler;
pub mod timeline;

pub use scheduler::{Direction, PlaybackScheduler, TickStatus};
pub use timeline::{instance_id, TimedInstance, Timeline};
