//! Progress reporting for the harvest loop
//!
//! The loop builds a [`ProgressEvent`] after every persisted page and hands it to
//! a [`ProgressObserver`], throttled by [`ProgressThrottle`] so a fast run does not
//! flood the terminal.

use super::report::RunReport;
use std::io;
use std::time::{Duration, Instant};

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// 1-based page number
    pub page: u64,
    /// Holders returned by the API for this page
    pub fetched: usize,
    /// Holders written to the store for this page
    pub saved: usize,
    pub total_fetched: u64,
    pub total_saved: u64,
    pub elapsed: Duration,
}

impl ProgressEvent {
    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.page as f64 / secs
        } else {
            0.0
        }
    }
}

/// Receives loop events; errors end the run as unexpected failures
pub trait ProgressObserver {
    fn on_page(&mut self, event: &ProgressEvent) -> io::Result<()>;

    /// Total supply reported with the first page
    fn on_total_supply(&mut self, _total_supply: &str) -> io::Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _report: &RunReport) -> io::Result<()> {
        Ok(())
    }
}

/// First page always passes, later pages at most once per `interval`
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    pub fn should_emit(&mut self, page: u64, now: Instant) -> bool {
        let due = match self.last_emit {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };

        if page == 1 || due {
            self.last_emit = Some(now);
            true
        } else {
            false
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}
