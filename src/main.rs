// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use anyhow::{bail, Context, Result};
use chordline::arrangement::Song;
use chordline::audio::{LogNoteSource, NoteSource, SilentNoteSource};
use chordline::config::{validate_song_file, PlayerConfig};
use chordline::export::{export_file_name, SequenceFileWriter};
use chordline::sequencer::Timeline;
use chordline::ui::{format_clock, run_headless, run_player};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("chordline - Chord chart player");
    println!();
    println!("Usage: chordline [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --info <song.yaml>                  Show song structure and length");
    println!("  --export <song.yaml> [out.mid]      Write a Standard MIDI File");
    println!("  --play <song.yaml> [--headless] [--config player.toml]");
    println!("                                      Play a song (TUI, or logged with --headless)");
    #[cfg(feature = "midi-out")]
    println!("  --list-midi                         List available MIDI outputs");
    println!("  --help                              Show this help message");
}

/// Log to stderr, filtered by RUST_LOG (default: info)
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_song(path: &Path) -> Result<chordline::config::SongFile> {
    validate_song_file(path).with_context(|| format!("Failed to load song {:?}", path))
}

fn show_info(path: &Path) -> Result<()> {
    let file = load_song(path)?;
    let song = &file.song;
    let timeline = Timeline::build(song);
    let signature = song.time_signature;

    println!("Title:          {}", song.title);
    println!("Tempo:          {:.0} BPM", song.effective_tempo());
    println!(
        "Time signature: {}/{}",
        signature.numerator(),
        signature.denominator()
    );
    println!(
        "Length:         {} beats ({})",
        timeline.total_beats(),
        format_clock(song.total_seconds())
    );
    println!("Chords played:  {}", timeline.len());
    println!();
    println!("Sections:");
    for section in &song.sections {
        let repeat = section.repeat_count();
        let suffix = if repeat > 1 {
            format!(" x{}", repeat)
        } else {
            String::new()
        };
        println!(
            "  {}{}  ({} events, {} beats)",
            section.name,
            suffix,
            section.events.len(),
            section.total_beats()
        );
    }
    Ok(())
}

fn export(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = load_song(path)?;
    let output = output.unwrap_or_else(|| {
        let name = export_file_name(&file.song.title);
        match path.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    });
    SequenceFileWriter::new().save(&file.song, &output)?;
    println!("Exported {:?}", output);
    Ok(())
}

fn drive<N: NoteSource>(
    path: &Path,
    song: &Song,
    config: &PlayerConfig,
    headless: bool,
    source: N,
) -> Result<()> {
    if headless {
        run_headless(song, config, source);
        Ok(())
    } else {
        run_player(path, song, config, source)
    }
}

fn play(path: &Path, headless: bool, config_path: Option<PathBuf>) -> Result<()> {
    let file = load_song(path)?;
    let config = match config_path {
        Some(config_path) => PlayerConfig::load_toml(&config_path)?,
        None => file.player.clone(),
    };

    #[cfg(feature = "midi-out")]
    if let Some(port) = config.midi_port {
        use chordline::audio::MidiNoteSource;
        use chordline::midi::MidirOutput;

        let output = MidirOutput::connect(port)
            .with_context(|| format!("Failed to open MIDI output {}", port))?;
        tracing::info!(port = output.port_name(), "MIDI output connected");
        let mut source = MidiNoteSource::new(Some(output));
        source.set_song_volume(config.song_volume);
        source.set_click_volume(config.click_volume);
        return drive(path, &file.song, &config, headless, source);
    }

    #[cfg(not(feature = "midi-out"))]
    if config.midi_port.is_some() {
        tracing::warn!("midi_port is set but this build has no MIDI output; playing silently");
    }

    if headless {
        drive(path, &file.song, &config, true, LogNoteSource)
    } else {
        drive(path, &file.song, &config, false, SilentNoteSource)
    }
}

fn require_path(args: &[String], option: &str) -> PathBuf {
    match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Error: {} requires a song file", option);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("chordline - Chord chart player");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--info" => {
            init_logging();
            show_info(&require_path(&args, "--info"))?;
        }
        "--export" => {
            init_logging();
            let path = require_path(&args, "--export");
            export(&path, args.get(3).map(PathBuf::from))?;
        }
        "--play" => {
            let path = require_path(&args, "--play");
            let mut headless = false;
            let mut config_path = None;
            let mut rest = args[3..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--headless" => headless = true,
                    "--config" => match rest.next() {
                        Some(p) => config_path = Some(PathBuf::from(p)),
                        None => bail!("--config requires a file"),
                    },
                    other => bail!("Unknown play option: {}", other),
                }
            }
            // The TUI owns the terminal; only headless runs log
            if headless {
                init_logging();
            }
            play(&path, headless, config_path)?;
        }
        #[cfg(feature = "midi-out")]
        "--list-midi" => {
            chordline::midi::print_ports()?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
