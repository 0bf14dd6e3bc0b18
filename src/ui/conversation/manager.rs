use crate::config::{Config, FeatureFlags};
use crate::events::{HistoryDirection, ServiceEvent};
use crate::models::{Chart, Message};
use crate::render::{export_chart, ChartView};
use crate::service::QueryService;
use crate::ui::conversation::composer::ComposerResult;
use crate::ui::conversation::panel::{history_index, HistoryPanel};
use crate::ui::conversation::pending::PendingIndicator;
use crate::ui::conversation::summary::{
    process_error_text, process_summary, query_error_text, WELCOME,
};
use crate::ui::conversation::timer::ElapsedTicker;
use crate::ui::conversation::{
    get_help_text, ConversationComposer, ConversationHistory, ParsedCommand, QueryHistory,
    SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Lines moved per PageUp/PageDown
const SCROLL_STEP: usize = 5;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the chat state and mediates between the input and the query service
pub struct ConversationManager {
    history: ConversationHistory,
    composer: ConversationComposer,
    recall: QueryHistory,
    service: Arc<dyn QueryService>,
    features: FeatureFlags,
    export_dir: PathBuf,
    loading: bool,
    ticker: Option<ElapsedTicker>,
    processing_queries: bool,
    show_history_panel: bool,
    panel_row: usize,
    terminal_rows: u16,
    events_tx: mpsc::UnboundedSender<ServiceEvent>,
    events_rx: mpsc::UnboundedReceiver<ServiceEvent>,
    dirty: bool,
}

impl ConversationManager {
    pub fn new(service: Arc<dyn QueryService>, config: &Config) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut history = ConversationHistory::new();
        history.add_bot_message(WELCOME, None);

        let mut composer = ConversationComposer::new("Ask a question, or type / for commands...");
        composer.set_focus(true);

        Self {
            history,
            composer,
            recall: QueryHistory::new(config.ui.history_limit),
            service,
            features: config.features.clone(),
            export_dir: config.export_dir(),
            loading: false,
            ticker: None,
            processing_queries: false,
            show_history_panel: false,
            panel_row: 0,
            terminal_rows: 24,
            events_tx,
            events_rx,
            dirty: true,
        }
    }

    /// Send the current draft. Returns false when nothing was sent.
    pub fn submit(&mut self) -> bool {
        let query = self.composer.text().trim().to_string();
        if query.is_empty() || self.loading {
            return false;
        }

        self.recall.push(&query);
        self.recall.reset_navigation();
        self.history.add_user_message(query.clone());
        self.composer.clear();

        self.loading = true;
        let started = Instant::now();
        // stop any previous tick before starting the next
        self.ticker = None;
        self.ticker = Some(ElapsedTicker::start(started));

        tracing::info!(query = %query, "Submitting query");

        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = service.ask(&query).await;
            let _ = events_tx.send(ServiceEvent::Answered {
                query,
                result,
                elapsed: started.elapsed(),
            });
        });

        self.dirty = true;
        true
    }

    /// Step through past queries; ignored while loading or with no history
    pub fn navigate_history(&mut self, direction: HistoryDirection) {
        if self.loading || self.recall.is_empty() {
            return;
        }

        let text = match direction {
            HistoryDirection::Older => self.recall.older(self.composer.text()).map(str::to_string),
            HistoryDirection::Newer => self.recall.newer(),
        };

        if let Some(text) = text {
            self.composer.set_text(text);
            self.dirty = true;
        }
    }

    /// Replace the draft as a user edit, ending any recall in progress
    pub fn edit_draft(&mut self, text: impl Into<String>) {
        self.recall.reset_navigation();
        self.composer.set_text(text);
        self.dirty = true;
    }

    /// Load a history entry by index into the draft; out-of-range indices are ignored
    pub fn recall_from_panel(&mut self, index: usize) {
        let Some(entry) = self.recall.select(index) else {
            return;
        };

        let entry = entry.to_string();
        self.composer.set_text(entry);
        self.composer.set_focus(true);
        self.dirty = true;
    }

    /// Show or hide the history panel; needs the feature and at least one entry
    pub fn toggle_history_panel(&mut self) {
        if !self.features.enable_chat_history_panel || self.recall.is_empty() {
            return;
        }

        self.show_history_panel = !self.show_history_panel;
        self.panel_row = 0;
        self.composer.set_focus(!self.show_history_panel);
        self.dirty = true;
    }

    pub fn close_history_panel(&mut self) {
        if self.show_history_panel {
            self.dirty = true;
        }
        self.show_history_panel = false;
        self.composer.set_focus(true);
    }

    /// Start the stored-query batch job. Returns false when it did not start.
    pub fn process_queries(&mut self) -> bool {
        if self.processing_queries || !self.features.show_process_queries_button {
            return false;
        }

        self.processing_queries = true;
        let started = Instant::now();
        tracing::info!("Processing stored queries");

        let service = Arc::clone(&self.service);
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = service.process_queries().await;
            let _ = events_tx.send(ServiceEvent::Processed {
                result,
                elapsed: started.elapsed(),
            });
        });

        self.dirty = true;
        true
    }

    /// Apply every completion that has arrived (called from main loop)
    pub fn poll_service_events(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_service_event(event);
            applied = true;
        }
        applied
    }

    /// Wait for the next completion and apply it
    pub async fn wait_for_service_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply_service_event(event);
                true
            }
            None => false,
        }
    }

    pub fn apply_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Answered { query, result, elapsed } => {
                self.ticker = None;
                let millis = elapsed.as_millis() as u64;

                match result {
                    Ok(response) => {
                        tracing::info!(query = %query, elapsed_ms = millis, "Query answered");
                        self.history.add_message(
                            Message::bot(query)
                                .with_response(response)
                                .with_time_taken(millis),
                        );
                    }
                    Err(err) => {
                        tracing::warn!(query = %query, error = %err, "Query failed");
                        self.history.add_bot_message(query_error_text(&err), Some(millis));
                    }
                }

                self.loading = false;
            }
            ServiceEvent::Processed { result, elapsed } => {
                let millis = elapsed.as_millis() as u64;

                match result {
                    Ok(summary) => {
                        tracing::info!(
                            processed = summary.queries_processed,
                            failed = summary.queries_failed,
                            "Query processing completed"
                        );
                        let (text, time_taken) = process_summary(&summary, millis);
                        self.history.add_bot_message(text, Some(time_taken));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Query processing failed");
                        self.history.add_bot_message(process_error_text(&err), Some(millis));
                    }
                }

                self.processing_queries = false;
            }
        }

        self.dirty = true;
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return ConversationAction::Exit,
            KeyCode::Char('r') if ctrl => {
                self.toggle_history_panel();
                return ConversationAction::None;
            }
            KeyCode::Char('p') if ctrl => {
                self.process_queries();
                return ConversationAction::None;
            }
            KeyCode::Char('e') if ctrl => {
                self.export_shown_chart(None);
                return ConversationAction::None;
            }
            KeyCode::Up if alt => {
                self.focus_chart(HistoryDirection::Older);
                return ConversationAction::None;
            }
            KeyCode::Down if alt => {
                self.focus_chart(HistoryDirection::Newer);
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.history.scroll_up(SCROLL_STEP);
                self.dirty = true;
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.history.scroll_down(SCROLL_STEP);
                self.dirty = true;
                return ConversationAction::None;
            }
            _ => {}
        }

        if self.show_history_panel {
            self.handle_panel_key(key);
            return ConversationAction::None;
        }

        self.dirty = true;
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(_) => {
                self.submit();
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::HistoryOlder => {
                self.navigate_history(HistoryDirection::Older);
                ConversationAction::None
            }
            ComposerResult::HistoryNewer => {
                self.navigate_history(HistoryDirection::Newer);
                ConversationAction::None
            }
            ComposerResult::Edited => {
                self.recall.reset_navigation();
                ConversationAction::None
            }
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.show_history_panel {
            return;
        }
        self.recall.reset_navigation();
        self.composer.insert_str(text);
        self.dirty = true;
    }

    fn handle_panel_key(&mut self, key: KeyEvent) {
        let len = self.recall.len();
        match key.code {
            KeyCode::Esc => self.close_history_panel(),
            KeyCode::Up => self.panel_row = self.panel_row.saturating_sub(1),
            KeyCode::Down => self.panel_row = (self.panel_row + 1).min(len.saturating_sub(1)),
            KeyCode::Enter => {
                if let Some(index) = history_index(len, self.panel_row) {
                    self.recall_from_panel(index);
                }
                self.close_history_panel();
            }
            _ => {}
        }
        self.dirty = true;
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Bye => return ConversationAction::Exit,
            SlashCommand::Help => self.history.add_bot_message(get_help_text(), None),
            SlashCommand::History => self.toggle_history_panel(),
            SlashCommand::Process => {
                if !self.process_queries() {
                    tracing::info!("Query processing unavailable or already running");
                }
            }
            SlashCommand::Export => {
                self.export_shown_chart(command.argument().map(PathBuf::from));
            }
        }
        ConversationAction::None
    }

    /// Put an older or newer chart on screen
    pub fn focus_chart(&mut self, direction: HistoryDirection) -> bool {
        let moved = self.history.focus_chart(direction);
        if moved {
            self.dirty = true;
        }
        moved
    }

    /// Write the chart on screen to `path` (or a timestamped file in the
    /// export directory) and report the outcome in the conversation.
    pub fn export_shown_chart(&mut self, path: Option<PathBuf>) -> Option<PathBuf> {
        self.dirty = true;

        let Some(chart) = self.shown_chart().cloned() else {
            self.history.add_bot_message("There is no chart to export yet.", None);
            return None;
        };

        let path = path.unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            self.export_dir.join(format!("chart-{stamp}.html"))
        });

        match export_chart(&chart, &path) {
            Ok(()) => {
                self.history
                    .add_bot_message(format!("📁 Chart exported to {}", path.display()), None);
                Some(path)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Chart export failed");
                self.history
                    .add_bot_message(format!("❌ Chart export failed: {err:#}"), None);
                None
            }
        }
    }

    /// Remember the terminal height and re-fit the input
    pub fn on_resize(&mut self, rows: u16) {
        self.terminal_rows = rows;
        self.composer.request_measure();
        self.dirty = true;
    }

    /// True once after any state change that needs a redraw
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.processing_queries
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Whole seconds since the in-flight query started; 0 when idle
    pub fn elapsed_seconds(&self) -> u64 {
        self.ticker.as_ref().map_or(0, ElapsedTicker::seconds)
    }

    pub fn processing_queries(&self) -> bool {
        self.processing_queries
    }

    pub fn show_history_panel(&self) -> bool {
        self.show_history_panel
    }

    pub fn draft(&self) -> &str {
        self.composer.text()
    }

    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn recall(&self) -> &QueryHistory {
        &self.recall
    }

    pub fn latest_chart(&self) -> Option<&Arc<Chart>> {
        self.history.latest_chart()
    }

    /// Chart that belongs on screen: the focused one, else the newest
    pub fn shown_chart(&self) -> Option<&Arc<Chart>> {
        self.history.shown_chart()
    }

    pub fn pending(&self) -> PendingIndicator {
        PendingIndicator {
            loading: self.loading,
            elapsed_seconds: self.elapsed_seconds(),
            processing_queries: self.processing_queries,
        }
    }

    /// Render the conversation UI components
    pub fn render_conversation_ui(&mut self, area: Rect, buf: &mut Buffer, chart: Option<&ChartView>) {
        if self.composer.measure_requested() {
            self.composer.measure(area.width, self.terminal_rows);
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),                          // Messages
                Constraint::Length(1),                       // Pending indicator
                Constraint::Length(self.composer.height()),  // Composer
            ])
            .split(area);

        let chart = chart.filter(|view| view.figure().is_some());
        match chart {
            Some(view) => {
                let panes = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(chunks[0]);
                self.history.render(panes[0], buf);
                view.render(panes[1], buf);
            }
            None => self.history.render(chunks[0], buf),
        }

        self.pending().render(chunks[1], buf);
        self.composer.render(chunks[2], buf);

        if self.show_history_panel {
            let panel_area = HistoryPanel::area(chunks[0]);
            HistoryPanel::new(self.recall.entries(), self.panel_row).render(panel_area, buf);
        }
    }
}
