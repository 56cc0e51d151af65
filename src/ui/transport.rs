// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph, Widget},
};

use super::{format_clock, PlayerView};
use crate::timing::ClockState;

/// Transport widget for displaying playback state
pub struct TransportWidget<'a> {
    view: &'a PlayerView,
    block: Option<Block<'a>>,
}

impl<'a> TransportWidget<'a> {
    /// Create a new transport widget
    pub fn new(view: &'a PlayerView) -> Self {
        Self { view, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(10), // Play/Pause/Stop indicator
                Constraint::Length(2),
                Constraint::Length(9), // Position
                Constraint::Length(2),
                Constraint::Length(13), // Elapsed / total
                Constraint::Length(2),
                Constraint::Length(10), // Tempo
                Constraint::Length(2),
                Constraint::Length(6), // Time signature
                Constraint::Length(2),
                Constraint::Min(0), // Metronome
            ])
            .split(area);

        let (indicator, style) = match self.view.state {
            ClockState::Playing { .. } => (
                "▶ PLAY",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            ClockState::Paused { .. } => ("‖ PAUSE", Style::default().fg(Color::Yellow)),
            ClockState::Stopped => ("■ STOP", Style::default().fg(Color::Yellow)),
        };
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        PositionWidget::from_beat(self.view.beat, self.view.beats_per_measure).render(chunks[2], buf);

        let clock = format!(
            "{} / {}",
            format_clock(self.view.elapsed_secs),
            format_clock(self.view.total_secs)
        );
        Paragraph::new(clock)
            .style(Style::default().fg(Color::White))
            .render(chunks[4], buf);

        Paragraph::new(format!("{:.0} BPM", self.view.tempo))
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[6], buf);

        Paragraph::new(format!("{}/{}", self.view.beats_per_measure, self.view.beat_unit))
            .style(Style::default().fg(Color::White))
            .render(chunks[8], buf);

        let (click, click_style) = if self.view.metronome {
            ("♪ click", Style::default().fg(Color::Blue))
        } else {
            ("♪ off", Style::default().fg(Color::DarkGray))
        };
        Paragraph::new(click).style(click_style).render(chunks[10], buf);
    }
}

/// Bar and beat display
pub struct PositionWidget {
    bar: u64,
    beat: u64,
}

impl PositionWidget {
    /// Create a new position widget (both 1-indexed)
    pub fn new(bar: u64, beat: u64) -> Self {
        Self { bar, beat }
    }

    /// Create from a song beat position
    pub fn from_beat(position: f64, beats_per_measure: u8) -> Self {
        let whole = if position.is_finite() && position > 0.0 {
            position.floor() as u64
        } else {
            0
        };
        let per_bar = beats_per_measure.max(1) as u64;
        Self {
            bar: whole / per_bar + 1,
            beat: whole % per_bar + 1,
        }
    }
}

impl Widget for PositionWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let position = format!("{:03}:{:02}", self.bar, self.beat);
        Paragraph::new(position)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_beat() {
        let pos = PositionWidget::from_beat(0.0, 4);
        assert_eq!((pos.bar, pos.beat), (1, 1));

        let pos = PositionWidget::from_beat(1.5, 4);
        assert_eq!((pos.bar, pos.beat), (1, 2));

        let pos = PositionWidget::from_beat(4.0, 4);
        assert_eq!((pos.bar, pos.beat), (2, 1));

        let pos = PositionWidget::from_beat(7.0, 3);
        assert_eq!((pos.bar, pos.beat), (3, 2));
    }

    #[test]
    fn test_position_ignores_bad_input() {
        let pos = PositionWidget::from_beat(f64::NAN, 0);
        assert_eq!((pos.bar, pos.beat), (1, 1));
        let pos = PositionWidget::new(2, 3);
        assert_eq!((pos.bar, pos.beat), (2, 3));
    }

    #[test]
    fn test_transport_renders() {
        let view = PlayerView::default();
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(&view).render(area, &mut buf);

        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(line.contains("STOP"));
        assert!(line.contains("001:01"));
        assert!(line.contains("120 BPM"));
    }
}
