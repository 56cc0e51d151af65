// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midir backend.
//!
//! This module provides a cross-platform implementation of the `MidiOutput`
//! trait so playback can drive an external synth or a software port.

use anyhow::{anyhow, Result};
use midir::{MidiOutput as MidirClient, MidiOutputConnection};

use super::MidiOutput;

const CLIENT_NAME: &str = "chordline";

/// MIDI port output via midir.
pub struct MidirOutput {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirOutput {
    /// Connect to the output port at `port_index`.
    ///
    /// # Returns
    /// * `Ok(MidirOutput)` on success
    /// * `Err` if the client could not be created or the port does not exist
    pub fn connect(port_index: usize) -> Result<Self> {
        let client = MidirClient::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

        let ports = client.ports();
        let port = ports.get(port_index).ok_or_else(|| {
            anyhow!(
                "MIDI output {} not found (only {} available)",
                port_index,
                ports.len()
            )
        })?;
        let port_name = client
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", port_index));

        let connection = client
            .connect(port, "chordline-out")
            .map_err(|e| anyhow!("Failed to connect to {}: {}", port_name, e))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    /// Name of the connected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiOutput for MidirOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message: {}", e))
    }
}

/// List all available MIDI outputs.
///
/// # Returns
/// A vector of (index, name) tuples.
pub fn list_ports() -> Result<Vec<(usize, String)>> {
    let client = MidirClient::new(CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

    Ok(client
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = client
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect())
}

/// Print all available MIDI outputs to stdout.
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No MIDI outputs found.");
    } else {
        println!("Available MIDI outputs:");
        for (i, name) in ports {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
