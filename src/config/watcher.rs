// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reloading a song while it plays.
//!
//! The parent directory is watched so editors that save by writing a temp
//! file and renaming it over the original are still picked up. Only events
//! touching the song file itself are considered.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::SongFile;

/// Events emitted by the song watcher
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The song file changed and parsed cleanly
    Reloaded(Box<SongFile>),
    /// The song file changed but could not be used
    Error(String),
}

/// Debounced watcher for a single song file
pub struct SongWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<WatchEvent>,
    watched_path: PathBuf,
}

impl SongWatcher {
    /// Start watching a song file
    ///
    /// # Arguments
    /// * `path` - The song YAML file
    /// * `debounce_ms` - Quiet period before reloading (default: 300)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce = Duration::from_millis(debounce_ms.unwrap_or(300));

        let file_name = watched_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| anyhow!("Not a file path: {:?}", watched_path))?;
        let directory = match watched_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx): (Sender<WatchEvent>, Receiver<WatchEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", directory, e))?;
        debug!(path = ?watched_path, "watching song file");

        let reload_path = watched_path.clone();
        std::thread::spawn(move || debounce_loop(notify_rx, event_tx, reload_path, file_name, debounce));

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next event (non-blocking)
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn recv_all(&self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn debounce_loop(
    notify_rx: Receiver<Event>,
    event_tx: Sender<WatchEvent>,
    path: PathBuf,
    file_name: OsString,
    debounce: Duration,
) {
    let mut last_change: Option<Instant> = None;

    loop {
        match notify_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                if touches(&event, &file_name) {
                    last_change = Some(Instant::now());
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let Some(changed) = last_change else {
                    continue;
                };
                if changed.elapsed() < debounce {
                    continue;
                }
                last_change = None;

                let event = match validate_song_file(&path) {
                    Ok(file) => WatchEvent::Reloaded(Box::new(file)),
                    Err(e) => {
                        warn!("Rejected reload of {:?}: {:#}", path, e);
                        WatchEvent::Error(format!("Failed to load {:?}: {:#}", path, e))
                    }
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            // Watcher dropped
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Load a song file and check it is safe to play
pub fn validate_song_file<P: AsRef<Path>>(path: P) -> Result<SongFile> {
    let file = SongFile::load(path)?;
    file.song.validate()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::MAX_REPEAT;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    const SONG: &str = r#"
song:
  title: "Initial"
  tempo: 120
  sections:
    - id: a
      name: A
      events:
        - id: "1"
          duration: 4
"#;

    #[test]
    fn test_validate_song_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("song.yaml");
        fs::write(&file_path, SONG).unwrap();

        let file = validate_song_file(&file_path).unwrap();
        assert_eq!(file.song.title, "Initial");
        assert_eq!(file.song.total_beats(), 4.0);
    }

    #[test]
    fn test_validate_invalid_yaml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.yaml");
        fs::write(&file_path, "this is not valid yaml: [").unwrap();

        assert!(validate_song_file(&file_path).is_err());
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("dupes.yaml");
        fs::write(
            &file_path,
            r#"
song:
  title: "Dupes"
  sections:
    - id: a
      name: A
    - id: a
      name: B
"#,
        )
        .unwrap();

        let err = validate_song_file(&file_path).unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate section id"));
    }

    #[test]
    fn test_validate_huge_repeat() {
        let dir = tempdir().unwrap();

        // A single event is capped, not rejected
        let capped = dir.path().join("capped.yaml");
        fs::write(&capped, SONG.replace("name: A", "name: A\n      repeat: 1e12")).unwrap();
        let file = validate_song_file(&capped).unwrap();
        assert_eq!(file.song.instance_count(), MAX_REPEAT as usize);

        // Enough events that the capped repeat still overflows the limit
        let mut yaml = String::from("song:\n  title: Huge\n  sections:\n    - id: a\n      name: A\n      repeat: 1e12\n      events:\n");
        for i in 0..100 {
            yaml.push_str(&format!("        - id: \"{}\"\n          duration: 1\n", i));
        }
        let huge = dir.path().join("huge.yaml");
        fs::write(&huge, yaml).unwrap();

        let err = validate_song_file(&huge).unwrap_err();
        assert!(format!("{:#}", err).contains("instances"));
    }

    #[test]
    fn test_watcher_creation() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("watch_test.yaml");
        fs::write(&file_path, SONG).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        assert_eq!(watcher.watched_path(), file_path.as_path());
        assert!(watcher.try_recv().is_none());
    }

    #[test]
    fn test_watcher_detects_changes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("detect_test.yaml");
        fs::write(&file_path, SONG).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&file_path)
            .unwrap();
        file.write_all(SONG.replace("Initial", "Modified").as_bytes())
            .unwrap();
        file.flush().unwrap();
        drop(file);

        std::thread::sleep(Duration::from_millis(400));

        let events = watcher.recv_all();
        let reloaded = events.iter().find(|e| matches!(e, WatchEvent::Reloaded(_)));
        if let Some(WatchEvent::Reloaded(file)) = reloaded {
            assert_eq!(file.song.title, "Modified");
        }
        // File events are not guaranteed to arrive in time on every CI
        // filesystem, so absence is tolerated.
    }
}
