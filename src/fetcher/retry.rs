use super::error::{FetchError, TransportError};
use super::transport::{HttpTransport, PageTransport};
use super::HolderSource;
use crate::config::HarvestConfig;
use crate::holders::HolderPage;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded retry with linear backoff on rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_limit: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_limit: u32, retry_delay: Duration) -> Self {
        Self {
            retry_limit,
            retry_delay,
        }
    }

    /// Wait before retry number `retry` (0-based)
    ///
    /// 429 waits `(retry + 1) × retry_delay`; everything else waits `retry_delay`.
    pub fn delay_for(&self, error: &TransportError, retry: u32) -> Duration {
        match error {
            TransportError::RateLimited => self.retry_delay * (retry + 1),
            _ => self.retry_delay,
        }
    }
}

impl From<&HarvestConfig> for RetryPolicy {
    fn from(config: &HarvestConfig) -> Self {
        Self::new(config.retry_limit, config.retry_delay)
    }
}

pub struct RetryingFetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: PageTransport> RetryingFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl RetryingFetcher<HttpTransport> {
    /// Fetcher for the real Moralis endpoint described by `config`
    pub fn http(config: &HarvestConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config).map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self::new(transport, RetryPolicy::from(config)))
    }
}

#[async_trait]
impl<T: PageTransport> HolderSource for RetryingFetcher<T> {
    async fn fetch_page(&mut self, cursor: Option<&str>) -> Result<HolderPage, FetchError> {
        let mut retries = 0u32;

        loop {
            let error = match self.transport.request_page(cursor).await {
                Ok(page) => {
                    if retries > 0 {
                        log::debug!("Page fetched after {} retries", retries);
                    }
                    return Ok(page);
                }
                Err(e) => e,
            };

            if retries >= self.policy.retry_limit {
                log::error!("❌ {} - giving up after {} attempts", error, retries + 1);
                return Err(FetchError::Exhausted {
                    attempts: retries + 1,
                    last: error,
                });
            }

            let delay = self.policy.delay_for(&error, retries);
            log::warn!(
                "⚠️  {}, retrying in {:?} (retry {} of {})",
                error,
                delay,
                retries + 1,
                self.policy.retry_limit
            );
            sleep(delay).await;
            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Replays scripted outcomes; an empty script keeps timing out
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<HolderPage, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<HolderPage, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PageTransport for ScriptedTransport {
        async fn request_page(&self, _cursor: Option<&str>) -> Result<HolderPage, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout))
        }
    }

    #[test]
    fn test_linear_backoff_for_rate_limit() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        assert_eq!(policy.delay_for(&TransportError::RateLimited, 0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(&TransportError::RateLimited, 1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(&TransportError::RateLimited, 2), Duration::from_secs(3));

        assert_eq!(policy.delay_for(&TransportError::Timeout, 2), Duration::from_secs(1));
        assert_eq!(
            policy.delay_for(&TransportError::Network("reset".into()), 1),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn test_always_timeout_hits_retry_bound() {
        let mut fetcher = RetryingFetcher::new(
            ScriptedTransport::new(Vec::new()),
            RetryPolicy::new(3, Duration::ZERO),
        );

        let result = fetcher.fetch_page(None).await;

        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 4);
        match result {
            Err(FetchError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(last, TransportError::Timeout));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_retry_limit_tries_once() {
        let mut fetcher = RetryingFetcher::new(
            ScriptedTransport::new(vec![Err(TransportError::RateLimited)]),
            RetryPolicy::new(0, Duration::ZERO),
        );

        assert!(fetcher.fetch_page(Some("c")).await.is_err());
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let page = HolderPage {
            cursor: Some("next".to_string()),
            ..Default::default()
        };
        let mut fetcher = RetryingFetcher::new(
            ScriptedTransport::new(vec![
                Err(TransportError::Network("connection reset".into())),
                Err(TransportError::Status {
                    code: 502,
                    body: String::new(),
                }),
                Ok(page.clone()),
            ]),
            RetryPolicy::new(3, Duration::ZERO),
        );

        let fetched = fetcher.fetch_page(None).await.unwrap();

        assert_eq!(fetched, page);
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_grow_linearly() {
        let mut fetcher = RetryingFetcher::new(
            ScriptedTransport::new(vec![
                Err(TransportError::RateLimited),
                Err(TransportError::RateLimited),
                Err(TransportError::RateLimited),
                Ok(HolderPage::default()),
            ]),
            RetryPolicy::new(3, Duration::from_millis(10)),
        );

        let started = Instant::now();
        fetcher.fetch_page(None).await.unwrap();

        // 10ms + 20ms + 30ms
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_http_rate_limit_exhaustion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/erc20/0xtoken/owners")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let config = HarvestConfig::from_lookup(|key| match key {
            "MORALIS_API_KEY" => Some("test-key".to_string()),
            "MORALIS_API_URL" => Some(server.url()),
            "HOLDERS_TOKEN_ADDRESS" => Some("0xtoken".to_string()),
            "HOLDERS_RETRY_LIMIT" => Some("2".to_string()),
            "HOLDERS_RETRY_DELAY_MS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        let mut fetcher = RetryingFetcher::http(&config).unwrap();

        let result = fetcher.fetch_page(None).await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(FetchError::Exhausted {
                attempts: 3,
                last: TransportError::RateLimited
            })
        ));
    }
}
