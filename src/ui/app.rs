//! Interactive terminal front end: terminal setup and the main event loop

use crate::config::Config;
use crate::events::TuiEvent;
use crate::render::{ChartView, ResizeHub};
use crate::service::HttpQueryService;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// UI refresh period; also bounds how late a completion is drawn
const TICK: Duration = Duration::from_millis(100);

/// Connect the conversation to the configured service and run the TUI
pub async fn run(config: Config) -> Result<()> {
    let service = HttpQueryService::new(&config)?;
    let mut manager = ConversationManager::new(Arc::new(service), &config);
    tracing::info!(url = %config.chat_url(), "Starting interactive session");

    let mut terminal = setup_terminal()?;

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal_basic();
        original_hook(panic_info);
    }));

    let result = run_main_loop(&mut terminal, &mut manager).await;

    restore_terminal(&mut terminal)?;

    result
}

/// The main TUI event loop
async fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    manager: &mut ConversationManager,
) -> Result<()> {
    let size = terminal.size().context("Failed to read terminal size")?;
    let resize_hub = ResizeHub::new((size.width, size.height));
    let mut chart_view = ChartView::new(resize_hub.subscribe());
    manager.on_resize(size.height);

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(64);
    let _input_handle = spawn_input_task(event_tx);

    let mut tick_interval = tokio::time::interval(TICK);

    loop {
        manager.poll_service_events();
        if let Some(chart) = manager.shown_chart() {
            chart_view.set_chart(chart);
        }

        let redraw = manager.take_dirty() | chart_view.take_redraw() | manager.is_busy();
        if redraw {
            terminal.draw(|f| {
                let area = f.size();
                manager.render_conversation_ui(area, f.buffer_mut(), Some(&chart_view));
            })?;
        }

        tokio::select! {
            Some(event) = event_rx.recv() => match event {
                TuiEvent::Key(key) => {
                    if manager.handle_key(key) == ConversationAction::Exit {
                        break;
                    }
                }
                TuiEvent::Paste(text) => manager.handle_paste(&text),
                TuiEvent::Resize(width, height) => {
                    resize_hub.notify(width, height);
                    manager.on_resize(height);
                }
            },

            // Tick for UI refresh
            _ = tick_interval.tick() => {}
        }
    }

    tracing::info!("Interactive session closed");
    Ok(())
}

/// Spawn a blocking task to read crossterm events
fn spawn_input_task(event_tx: mpsc::Sender<TuiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            let event = match event::read() {
                Ok(Event::Key(key)) => Some(TuiEvent::Key(key)),
                Ok(Event::Paste(text)) => Some(TuiEvent::Paste(text)),
                Ok(Event::Resize(width, height)) => Some(TuiEvent::Resize(width, height)),
                _ => None,
            };
            if let Some(event) = event {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        }
        if event_tx.is_closed() {
            break;
        }
    })
}

/// Set up the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Basic terminal restoration for panic handler
fn restore_terminal_basic() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
    Ok(())
}
