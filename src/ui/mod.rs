// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal player.
//!
//! Provides a ratatui-based player view with transport, chord and progress
//! display, plus the frame loops that drive the scheduler (interactive and
//! headless).

mod transport;

pub use transport::{PositionWidget, TransportWidget};

use std::io::{self, Stdout};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use tracing::info;

use crate::arrangement::Song;
use crate::audio::NoteSource;
use crate::config::{PlayerConfig, SongWatcher, WatchEvent};
use crate::control::{format_shortcut, KeyboardController, PlayerAction};
use crate::sequencer::{PlaybackScheduler, TickStatus, TimedInstance};
use crate::timing::ClockState;

/// How long a status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Snapshot of everything the player view shows
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub title: String,
    pub state: ClockState,
    /// Beat position
    pub beat: f64,
    pub beats_per_measure: u8,
    pub beat_unit: u8,
    pub tempo: f64,
    pub elapsed_secs: f64,
    pub total_secs: f64,
    /// Fraction played (0.0 - 1.0)
    pub progress: f64,
    pub metronome: bool,
    /// Section of the active instance
    pub section: Option<String>,
    /// Pass through the section as (current, total), 1-indexed
    pub pass: Option<(u32, u32)>,
    /// Name of the active chord ("Rest" for a rest)
    pub chord: Option<String>,
    /// Fret diagram of the active chord, low to high
    pub frets: Option<String>,
    pub previous_chord: Option<String>,
    pub next_chord: Option<String>,
    pub next_section: Option<String>,
    /// Active instance as (index, count)
    pub instance: (usize, usize),
}

impl Default for PlayerView {
    fn default() -> Self {
        Self {
            title: String::new(),
            state: ClockState::Stopped,
            beat: 0.0,
            beats_per_measure: 4,
            beat_unit: 4,
            tempo: 120.0,
            elapsed_secs: 0.0,
            total_secs: 0.0,
            progress: 0.0,
            metronome: true,
            section: None,
            pass: None,
            chord: None,
            frets: None,
            previous_chord: None,
            next_chord: None,
            next_section: None,
            instance: (0, 0),
        }
    }
}

impl PlayerView {
    /// Capture the scheduler state at `now`
    pub fn capture<N: NoteSource>(
        scheduler: &PlaybackScheduler<N>,
        title: &str,
        now: Instant,
    ) -> Self {
        let timeline = scheduler.timeline();
        let tempo = scheduler.tempo();
        let beat = scheduler.current_beat(now);
        let index = scheduler.active_index();
        let active = scheduler.active_instance();
        let signature = scheduler.time_signature();

        let previous = index
            .checked_sub(1)
            .and_then(|i| timeline.get(i))
            .map(chord_label);

        Self {
            title: title.to_string(),
            state: scheduler.state(),
            beat,
            beats_per_measure: signature.numerator(),
            beat_unit: signature.denominator(),
            tempo,
            elapsed_secs: beat * 60.0 / tempo,
            total_secs: timeline.total_seconds(tempo),
            progress: scheduler.progress(now),
            metronome: scheduler.metronome_enabled(),
            section: active.map(|i| i.section_name.clone()),
            pass: active.map(|i| (i.repeat_index + 1, i.repeat_count)),
            chord: active.map(chord_label),
            frets: active.and_then(fret_diagram),
            previous_chord: previous,
            next_chord: timeline.get(index + 1).map(chord_label),
            next_section: scheduler.next_section_name().map(str::to_string),
            instance: (index, timeline.len()),
        }
    }
}

fn chord_label(instance: &TimedInstance) -> String {
    match &instance.chord {
        Some(chord) => chord.name(),
        None => "Rest".to_string(),
    }
}

fn fret_diagram(instance: &TimedInstance) -> Option<String> {
    let position = instance.chord.as_ref()?.position()?;
    let frets: Vec<String> = position.frets.iter().map(ToString::to_string).collect();
    Some(frets.join(" "))
}

/// Format seconds as m:ss
pub fn format_clock(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// UI-only state that is not part of playback
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>, now: Instant) {
        self.status_message = Some(message.into());
        self.status_time = Some(now);
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self, now: Instant) {
        if let Some(time) = self.status_time {
            if now.saturating_duration_since(time) > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }
}

/// Terminal handle with raw mode and the alternate screen active
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Take over the terminal
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    /// Wait up to `timeout` for an input event
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw one frame
    pub fn draw(&mut self, view: &PlayerView, ui: &UiState, help: &str) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, view, ui, help))?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render the whole player
pub fn render(frame: &mut Frame, view: &PlayerView, ui: &UiState, help: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport
            Constraint::Min(7),    // Chords
            Constraint::Length(3), // Progress
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let title = if view.title.is_empty() {
        " chordline ".to_string()
    } else {
        format!(" {} ", view.title)
    };
    frame.render_widget(
        TransportWidget::new(view).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );
    render_chords(frame, chunks[1], view);
    render_progress(frame, chunks[2], view);
    render_status_bar(frame, chunks[3], ui, help);
}

fn render_chords(frame: &mut Frame, area: Rect, view: &PlayerView) {
    let section = match (&view.section, view.pass) {
        (Some(name), Some((pass, total))) if total > 1 => format!(" {} ({}/{}) ", name, pass, total),
        (Some(name), _) => format!(" {} ", name),
        _ => " - ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(section);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.instance.1 == 0 {
        frame.render_widget(
            Paragraph::new("Nothing to play").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(inner);

    let dim = Style::default().fg(Color::DarkGray);
    let side = |label: &Option<String>| Paragraph::new(label.clone().unwrap_or_default()).style(dim);
    frame.render_widget(side(&view.previous_chord), columns[0]);
    frame.render_widget(side(&view.next_chord), columns[2]);

    let mut lines = vec![Line::from(Span::styled(
        view.chord.clone().unwrap_or_default(),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    if let Some(frets) = &view.frets {
        lines.push(Line::from(Span::styled(
            frets.clone(),
            Style::default().fg(Color::White),
        )));
    }
    lines.push(Line::from(""));
    if let Some(next) = &view.next_section {
        lines.push(Line::from(Span::styled(
            format!("Up next: {}", next),
            Style::default().fg(Color::Cyan),
        )));
    }
    frame.render_widget(Paragraph::new(lines), columns[1]);
}

fn render_progress(frame: &mut Frame, area: Rect, view: &PlayerView) {
    let label = format!("{} / {}", view.instance.0 + 1, view.instance.1.max(1));
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(view.progress.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, ui: &UiState, help: &str) {
    let text = match &ui.status_message {
        Some(msg) => Span::styled(msg.clone(), Style::default().fg(Color::Yellow)),
        None => Span::styled(help.to_string(), Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(Paragraph::new(text), area);
}

/// One-line key summary for the status bar
pub fn help_line(keyboard: &KeyboardController) -> String {
    let order = ["Transport", "Navigation", "Tempo", "UI"];
    let grouped = keyboard.bindings_by_category();
    let mut parts = Vec::new();
    for category in order {
        let Some(bindings) = grouped.get(category) else {
            continue;
        };
        // One key per description, shortest shortcut first
        let mut entries: Vec<(&str, String)> = bindings
            .iter()
            .map(|b| (b.description.as_str(), format_shortcut(&b.shortcut)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0).then(a.1.len().cmp(&b.1.len())).then(a.1.cmp(&b.1)));
        entries.dedup_by(|a, b| a.0 == b.0);
        for (description, key) in entries {
            parts.push(format!("{}: {}", key, description));
        }
    }
    format!(" {}", parts.join(" | "))
}

/// Run the interactive player until the user quits
///
/// The song file is watched and reloaded into the running scheduler.
pub fn run_player<N: NoteSource>(
    path: &Path,
    song: &Song,
    config: &PlayerConfig,
    note_source: N,
) -> Result<()> {
    let mut scheduler = PlaybackScheduler::new(song, note_source);
    scheduler.set_metronome_enabled(config.metronome);
    let mut title = song.title.clone();
    let mut ui = UiState::default();

    let watcher = match SongWatcher::new(path, None) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            ui.set_status(format!("Hot reload unavailable: {:#}", e), Instant::now());
            None
        }
    };
    let keyboard = KeyboardController::with_defaults();
    let help = help_line(&keyboard);
    let frame_interval = config.frame_interval();

    let mut app = App::new().context("Failed to initialize terminal")?;

    loop {
        let now = Instant::now();

        if let Some(watcher) = &watcher {
            for event in watcher.recv_all() {
                match event {
                    WatchEvent::Reloaded(file) => {
                        scheduler.replace_song(&file.song, now);
                        title = file.song.title.clone();
                        ui.set_status("Song reloaded", now);
                    }
                    WatchEvent::Error(message) => ui.set_status(message, now),
                }
            }
        }

        scheduler.tick(now);
        ui.clear_expired_status(now);

        let view = PlayerView::capture(&scheduler, &title, now);
        app.draw(&view, &ui, &help).context("Failed to draw")?;

        if let Some(Event::Key(key)) = app.poll_event(frame_interval)? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match keyboard.get_action(key.code, key.modifiers) {
                Some(PlayerAction::Quit) => break,
                Some(action) => action.apply(&mut scheduler, Instant::now()),
                None => {}
            }
        }
    }

    Ok(())
}

/// Play a song start to finish without a terminal UI
///
/// Returns the note source once playback finishes.
pub fn run_headless<N: NoteSource>(song: &Song, config: &PlayerConfig, note_source: N) -> N {
    let mut scheduler = PlaybackScheduler::new(song, note_source);
    scheduler.set_metronome_enabled(config.metronome);
    let frame_interval = config.frame_interval();

    if !scheduler.play(Instant::now()) {
        info!(title = %song.title, "nothing to play");
        return scheduler.into_note_source();
    }
    info!(
        title = %song.title,
        instances = scheduler.timeline().len(),
        seconds = scheduler.timeline().total_seconds(scheduler.tempo()),
        "playing"
    );

    while scheduler.tick(Instant::now()) != TickStatus::Finished {
        std::thread::sleep(frame_interval);
    }

    info!(title = %song.title, "finished");
    scheduler.into_note_source()
}
