//! Conversation UI components for chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod panel;
pub mod pending;
pub mod recall;
pub mod summary;
pub mod timer;

pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::ConversationComposer;
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationManager};
pub use recall::QueryHistory;
