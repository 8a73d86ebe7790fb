//! The harvest loop
//!
//! States per cycle: fetching → filtering → persisting, then either the next
//! cursor or a terminal state (done, aborted, interrupted, failed).
//!
//! The loop is strictly sequential. Cancellation is polled once per cycle,
//! right after the fetch returns: a page that arrives after cancellation is
//! dropped without being filtered or saved.

pub mod cancel;
pub mod driver;
pub mod progress;
pub mod report;

pub use cancel::CancellationFlag;
pub use driver::Harvester;
pub use progress::{ProgressEvent, ProgressObserver, ProgressThrottle};
pub use report::{HarvestError, RunReport, Termination, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_OK};
