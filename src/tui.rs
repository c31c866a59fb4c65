use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyEvent, KeyEventKind, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the composing animation and reply polling
const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Text pasted in one piece while bracketed paste is on
    Paste(String),
    Resize(u16, u16),
    Tick,
}

/// Merges terminal input and a tick timer into one stream of `AppEvent`s
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let evt = match evt {
                    Ok(evt) => evt,
                    Err(e) => {
                        tracing::warn!(error = %e, "terminal event stream error");
                        continue;
                    }
                };

                let app_event = match evt {
                    // Only handle key press events, not release
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
                    Event::Paste(text) => Some(AppEvent::Paste(text)),
                    Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
                    _ => None,
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                if tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode().context("enabling raw mode")?;

    // Raw mode is already on, so any later failure must undo it
    let setup = || -> Result<Tui> {
        execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)
            .context("entering alternate screen")?;

        let backend = CrosstermBackend::new(io::stderr());
        let terminal = Terminal::new(backend).context("creating terminal")?;
        Ok(terminal)
    };

    cleanup_on_err(setup(), || {
        if let Err(e) = restore() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    })
}

pub fn restore() -> Result<()> {
    let screen = execute!(io::stderr(), DisableBracketedPaste, DisableMouseCapture, LeaveAlternateScreen);
    disable_raw_mode()?;
    screen?;
    Ok(())
}

fn cleanup_on_err<T>(result: Result<T>, cleanup: impl FnOnce()) -> Result<T> {
    if result.is_err() {
        cleanup();
    }
    result
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn failed_setup_runs_cleanup() {
        let mut cleaned = false;
        let result: Result<()> = cleanup_on_err(Err(anyhow!("no tty")), || cleaned = true);

        assert!(result.is_err());
        assert!(cleaned);
    }

    #[test]
    fn successful_setup_skips_cleanup() {
        let mut cleaned = false;
        let result = cleanup_on_err(Ok(7), || cleaned = true);

        assert_eq!(result.unwrap(), 7);
        assert!(!cleaned);
    }
}
