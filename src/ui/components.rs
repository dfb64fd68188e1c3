//! Panels of the import TUI

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Level, Phase, Progress};

/// Phase and unit tallies
pub struct StatusPanel {
    pub phase: Phase,
    pub imported: u64,
    pub skipped: u64,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Starting,
            imported: 0,
            skipped: 0,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let color = match self.phase {
            Phase::Complete => Color::Green,
            _ => Color::Cyan,
        };
        let phase_style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let indicator = match self.phase {
            Phase::Starting => "◐",
            Phase::Roster => "☰",
            Phase::Tournaments => "↓",
            Phase::Aggregating => "Σ",
            Phase::Complete => "✓",
        };

        let skipped_style = if self.skipped > 0 {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", indicator), phase_style),
                Span::styled(self.phase.to_string(), phase_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(format!("{} units imported", self.imported), Style::default().fg(Color::Gray)),
                Span::raw("  ·  "),
                Span::styled(format!("{} skipped", self.skipped), skipped_style),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Sumo History Import ")
            .border_style(Style::default().fg(Color::Blue));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Gauge over the current phase's work list
#[derive(Default)]
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn set(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = format!(
            "{} ({}/{}, {:.0}%)",
            progress.label,
            progress.current,
            progress.total,
            progress.ratio() * 100.0
        );

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio())
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Bounded activity history; the newest entries are shown
pub struct LogPanel {
    entries: VecDeque<(Level, String)>,
    capacity: usize,
}

impl LogPanel {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, level: Level, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((level, message.into()));
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .skip(skip)
            .map(|(level, message)| {
                let style = match level {
                    Level::Info => Style::default().fg(Color::Gray),
                    Level::Warn => Style::default().fg(Color::Yellow),
                    Level::Error => Style::default().fg(Color::Red),
                };
                ListItem::new(Span::styled(format!(" {}", message), style))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_panel_is_bounded() {
        let mut panel = LogPanel::new(3);
        for i in 0..5 {
            panel.add(Level::Info, format!("line {}", i));
        }
        assert_eq!(panel.entries.len(), 3);
        assert_eq!(panel.entries.front().unwrap().1, "line 2");
    }
}
