#[derive(Debug)]
pub enum TransportError {
    /// HTTP 429
    RateLimited,
    Timeout,
    Network(String),
    Status { code: u16, body: String },
    Decode(String),
}

impl TransportError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::RateLimited => write!(f, "Rate limited (HTTP 429)"),
            TransportError::Timeout => write!(f, "Request timed out"),
            TransportError::Network(e) => write!(f, "Network error: {}", e),
            TransportError::Status { code, body } => write!(f, "HTTP {}: {}", code, body),
            TransportError::Decode(e) => write!(f, "Invalid response body: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug)]
pub enum FetchError {
    /// Every attempt for the page failed; `last` is the final failure
    Exhausted { attempts: u32, last: TransportError },
    Client(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Exhausted { attempts, last } => {
                write!(f, "Page fetch failed after {} attempts: {}", attempts, last)
            }
            FetchError::Client(e) => write!(f, "HTTP client error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}
