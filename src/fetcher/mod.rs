//! Remote access to the paginated holder listing

pub mod error;
pub mod retry;
pub mod transport;

use crate::holders::HolderPage;
use async_trait::async_trait;

pub use error::{FetchError, TransportError};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use transport::{HttpTransport, PageTransport};

/// Source of holder pages, as seen by the harvest loop
///
/// An `Err` is definitive for that page: any retrying has already happened.
#[async_trait]
pub trait HolderSource: Send {
    async fn fetch_page(&mut self, cursor: Option<&str>) -> Result<HolderPage, FetchError>;
}
