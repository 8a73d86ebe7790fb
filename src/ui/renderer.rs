// Formatting utilities for the console output

use crate::harvest::ProgressEvent;
use std::time::Duration;

/// Format a formatted-balance maximum for display
pub fn format_balance(amount: Option<f64>, symbol: &str) -> String {
    format!("{:.4} {}", amount.unwrap_or(0.0), symbol.to_uppercase())
}

/// `1.25 min (75.0s)`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    format!("{:.2} min ({:.1}s)", secs / 60.0, secs)
}

/// `0x1234…cdef` for long addresses, unchanged otherwise
pub fn short_address(address: &str) -> String {
    if address.len() <= 14 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

pub fn progress_line(event: &ProgressEvent) -> String {
    format!(
        "✅ Page {:5} | fetched: {:3} | saved: {:3} | total saved: {:7} | {:.1} pages/s | {:.1}s",
        event.page,
        event.fetched,
        event.saved,
        event.total_saved,
        event.pages_per_sec(),
        event.elapsed.as_secs_f64()
    )
}
