pub mod render;
pub mod state;

use crate::client::PipelineState;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use state::AppState;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Commands the TUI sends back to the browser loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiCommand {
    Quit,
    Reload,
    Select(usize),
    SubmitCorrection(String),
    CancelCorrection,
}

/// Terminal-local state that never leaves the TUI.
#[derive(Debug, Default)]
pub struct UiState {
    pub selected: usize,
    pub input: String,
    pub spinner_frame: u8,
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
) -> Result<()> {
    let mut ui = UiState::default();
    loop {
        let state = state_rx.borrow().clone();
        ui.selected = ui.selected.min(state.reviews.len().saturating_sub(1));
        terminal.draw(|f| render::draw(f, &state, &ui))?;
        ui.spinner_frame = ui.spinner_frame.wrapping_add(1);

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = handle_key(key, &state, &mut ui) {
                        let quit = cmd == TuiCommand::Quit;
                        let _ = cmd_tx.send(cmd).await;
                        if quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Translate a key press into a command. The review list is inert while a
/// search is running; while a correction is pending, keys edit the input.
pub fn handle_key(key: KeyEvent, state: &AppState, ui: &mut UiState) -> Option<TuiCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(TuiCommand::Quit);
    }

    if matches!(state.pipeline, PipelineState::AwaitingManualCorrection { .. }) {
        return match key.code {
            KeyCode::Char(c) => {
                ui.input.push(c);
                None
            }
            KeyCode::Backspace => {
                ui.input.pop();
                None
            }
            KeyCode::Enter if !ui.input.trim().is_empty() => {
                Some(TuiCommand::SubmitCorrection(std::mem::take(&mut ui.input)))
            }
            KeyCode::Esc => {
                ui.input.clear();
                Some(TuiCommand::CancelCorrection)
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(TuiCommand::Quit),
        _ if state.is_busy() => None,
        KeyCode::Char('j') | KeyCode::Down => {
            if ui.selected + 1 < state.reviews.len() {
                ui.selected += 1;
            }
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            ui.selected = ui.selected.saturating_sub(1);
            None
        }
        KeyCode::Enter if ui.selected < state.reviews.len() => Some(TuiCommand::Select(ui.selected)),
        KeyCode::Char('r') => Some(TuiCommand::Reload),
        _ => None,
    }
}
