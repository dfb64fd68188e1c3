//! Terminal UI module using ratatui
//!
//! Shows the state of an import run:
//! - Current phase and imported/skipped unit tallies
//! - Progress through the tournament list
//! - Activity log, colored by severity

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use components::{LogPanel, ProgressPanel, StatusPanel};

/// Stages of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Roster,
    Tournaments,
    Aggregating,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Starting => write!(f, "Opening store"),
            Phase::Roster => write!(f, "Importing wrestler roster"),
            Phase::Tournaments => write!(f, "Importing tournaments"),
            Phase::Aggregating => write!(f, "Computing tournament records"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Position in the current phase's work list
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Progress sink for the pipeline: the full TUI, plain log lines, or nothing
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn set_tally(&mut self, imported: u64, skipped: u64);
    fn log(&mut self, level: Level, message: impl Into<String>);

    /// Polled between units; returning true stops scheduling new work
    fn should_quit(&mut self) -> bool {
        false
    }
}

/// Full-screen TUI
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    log: LogPanel,
    quit_requested: bool,
}

impl UiApp {
    /// Enter raw mode and the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::default(),
            log: LogPanel::new(200),
            quit_requested: false,
        })
    }

    /// 'q', Esc or Ctrl+C (raw mode swallows SIGINT)
    fn poll_quit(&mut self) -> bool {
        while event::poll(Duration::from_millis(0)).unwrap_or(false) {
            if let Ok(CrosstermEvent::Key(KeyEvent { code, modifiers, .. })) = event::read() {
                let ctrl_c = code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || code == KeyCode::Char('q') || code == KeyCode::Esc {
                    if !self.quit_requested {
                        self.log.add(Level::Warn, "Stopping after in-flight units; rerun to resume");
                    }
                    self.quit_requested = true;
                }
            }
        }
        self.quit_requested
    }

    fn draw(&mut self) -> Result<()> {
        let status = &self.status;
        let progress = &self.progress;
        let log = &self.log;

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(5),
                    Constraint::Length(3),
                    Constraint::Min(5),
                ])
                .split(frame.area());

            status.render(frame, chunks[0]);
            progress.render(frame, chunks[1]);
            log.render(frame, chunks[2]);
        })?;

        Ok(())
    }

    /// Show the summary, wait for a key, then restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.progress.clear();
        for line in summary.lines() {
            self.log.add(Level::Info, line);
        }
        self.log.add(Level::Info, "Press any key to exit...");
        self.draw()?;

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(_) = event::read()? {
                    break;
                }
            }
        }

        self.restore()
    }

    /// Restore the terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.phase = phase;
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress.set(Progress {
            current,
            total,
            label: label.into(),
        });
        self.draw().ok();
    }

    fn set_tally(&mut self, imported: u64, skipped: u64) {
        self.status.imported = imported;
        self.status.skipped = skipped;
        self.draw().ok();
    }

    fn log(&mut self, level: Level, message: impl Into<String>) {
        self.log.add(level, message);
        self.draw().ok();
    }

    fn should_quit(&mut self) -> bool {
        let quit = self.poll_quit();
        self.draw().ok();
        quit
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Discards everything; for tests and library callers
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn set_tally(&mut self, _imported: u64, _skipped: u64) {}
    fn log(&mut self, _level: Level, _message: impl Into<String>) {}
}

/// Line-oriented UI for non-interactive runs. Activity is already logged by
/// the pipeline through `tracing`; this adds phase changes and periodic
/// progress lines.
pub struct LogUi {
    every: u64,
    stop: Option<Arc<AtomicBool>>,
}

impl LogUi {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            stop: None,
        }
    }

    /// Quit once `stop` is set, e.g. from a Ctrl-C handler
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }
}

impl Default for LogUi {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        tracing::info!("== {}", phase);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        if current % self.every == 0 || current == total {
            tracing::info!("[{}/{}] {}", current, total, label.into());
        }
    }

    fn set_tally(&mut self, _imported: u64, _skipped: u64) {}

    fn log(&mut self, _level: Level, _message: impl Into<String>) {}

    fn should_quit(&mut self) -> bool {
        self.stop.as_ref().is_some_and(|s| s.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_ratio() {
        let p = Progress {
            current: 3,
            total: 4,
            label: String::new(),
        };
        assert_eq!(p.ratio(), 0.75);
        assert_eq!(Progress::default().ratio(), 0.0);
    }

    #[test]
    fn test_log_ui_follows_stop_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut ui = LogUi::default().with_stop_flag(stop.clone());
        assert!(!ui.should_quit());
        stop.store(true, Ordering::Relaxed);
        assert!(ui.should_quit());
        assert!(!LogUi::default().should_quit());
    }
}
