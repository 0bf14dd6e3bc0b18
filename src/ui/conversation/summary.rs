//! Text for bot messages synthesized by the client itself

use crate::error::ServiceError;
use crate::models::ProcessQueriesResponse;

pub const WELCOME: &str = "Welcome! Ask me anything about NCAA basketball data.";

/// Compact duration: `850ms`, `12s`, `3m 5s`
pub fn format_time(millis: u64) -> String {
    let seconds = millis / 1000;
    if seconds < 1 {
        format!("{millis}ms")
    } else if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}

/// Message shown when a chat query fails
pub fn query_error_text(err: &ServiceError) -> String {
    let detail = err.detail().unwrap_or_else(|| "Unknown error".to_string());
    format!("Sorry, I encountered an error: {detail}")
}

/// Message shown when bulk processing fails
pub fn process_error_text(err: &ServiceError) -> String {
    let detail = err
        .detail()
        .unwrap_or_else(|| "Unknown error occurred".to_string());
    format!("❌ Error processing queries: {detail}")
}

/// Statistics message for a finished processing run, and the duration to record with it
pub fn process_summary(summary: &ProcessQueriesResponse, measured_ms: u64) -> (String, u64) {
    let time_taken = if summary.processing_time_ms > 0 {
        summary.processing_time_ms
    } else {
        measured_ms
    };

    let mut message = String::from("✅ Query processing completed!\n\n");
    message.push_str("📊 Statistics:\n");
    message.push_str(&format!("• Original queries: {}\n", summary.original_count));
    message.push_str(&format!("• Duplicates removed: {}\n", summary.duplicates_removed));
    message.push_str(&format!("• Final unique queries: {}\n", summary.final_count));
    message.push_str(&format!("• Queries processed: {}\n", summary.queries_processed));
    message.push_str(&format!("• Successful: {}\n", summary.queries_succeeded));
    message.push_str(&format!("• Failed: {}\n", summary.queries_failed));
    message.push_str(&format!("• Processing time: {}", format_time(time_taken)));

    if !summary.errors.is_empty() {
        message.push_str("\n\n⚠️ Errors:\n");
        for (index, error) in summary.errors.iter().enumerate() {
            message.push_str(&format!("{}. {}\n", index + 1, error));
        }
    }

    (message, time_taken)
}
