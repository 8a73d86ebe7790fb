use crate::fetcher::FetchError;
use crate::store::{HolderStats, StoreError, StoredHolder};
use std::path::PathBuf;
use std::time::Duration;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
/// 128 + SIGINT
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug)]
pub enum HarvestError {
    Store(StoreError),
    Output(std::io::Error),
}

impl From<StoreError> for HarvestError {
    fn from(err: StoreError) -> Self {
        HarvestError::Store(err)
    }
}

impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::Output(err)
    }
}

impl std::fmt::Display for HarvestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarvestError::Store(e) => write!(f, "Store error: {}", e),
            HarvestError::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for HarvestError {}

/// How the harvest loop ended
#[derive(Debug)]
pub enum Termination {
    /// The API ran out of pages
    Done,
    /// A page could not be fetched within the retry budget
    Aborted(FetchError),
    /// Stopped by the cancellation flag
    Interrupted,
    Failed(HarvestError),
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Termination::Done => "DONE",
            Termination::Aborted(_) => "ABORTED",
            Termination::Interrupted => "INTERRUPTED",
            Termination::Failed(_) => "FAILED",
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub termination: Termination,
    /// Pages that carried holders
    pub pages: u64,
    pub total_fetched: u64,
    pub total_saved: u64,
    /// `None` when the store could not be queried
    pub stats: Option<HolderStats>,
    pub top_holders: Vec<StoredHolder>,
    pub elapsed: Duration,
    pub db_path: Option<PathBuf>,
}

impl RunReport {
    pub fn exit_code(&self) -> u8 {
        match self.termination {
            Termination::Done => EXIT_OK,
            Termination::Interrupted => EXIT_INTERRUPTED,
            Termination::Aborted(_) | Termination::Failed(_) => EXIT_FAILURE,
        }
    }

    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages as f64 / secs
        } else {
            0.0
        }
    }
}
