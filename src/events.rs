use crate::error::ServiceError;
use crate::models::{ProcessQueriesResponse, Response};
use tokio::time::Duration;

/// Completions delivered back to the conversation from background requests
#[derive(Debug)]
pub enum ServiceEvent {
    /// A chat query finished
    Answered {
        query: String,
        result: Result<Response, ServiceError>,
        elapsed: Duration,
    },

    /// The bulk processing job finished
    Processed {
        result: Result<ProcessQueriesResponse, ServiceError>,
        elapsed: Duration,
    },
}

/// TUI-specific events (keyboard, paste, resize)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

/// Direction of a history recall step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    /// Towards the oldest query
    Older,
    /// Towards the newest query, then back to the draft
    Newer,
}
