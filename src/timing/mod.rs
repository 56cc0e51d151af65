// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the transport clock that maps wall time onto
//! song beats for playback.

pub mod clock;

pub use clock::{ClockState, TransportClock};
