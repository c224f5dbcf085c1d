use std::time::Duration;

use crate::error::FetchError;

// Fetch-side ports. Everything is blocking: the pipeline runs one request at a time.
pub trait HttpClientPort {
    fn get(&self, url: &str) -> Result<HttpGetResult, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    /// Raw `Retry-After` header value, if the server sent one.
    pub retry_after: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    Timeout(String),
    Connect(String),
    Request(String),
    /// The request could not even be built; retrying will not help.
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_))
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout(m) => write!(f, "timeout: {}", m),
            TransportError::Connect(m) => write!(f, "connection failed: {}", m),
            TransportError::Request(m) => write!(f, "request failed: {}", m),
            TransportError::InvalidRequest(m) => write!(f, "invalid request: {}", m),
        }
    }
}

impl std::error::Error for TransportError {}

impl<T: HttpClientPort + ?Sized> HttpClientPort for &T {
    fn get(&self, url: &str) -> Result<HttpGetResult, TransportError> {
        (**self).get(url)
    }
}

pub trait SleepPort {
    fn sleep(&self, duration: Duration);
}

impl<T: SleepPort + ?Sized> SleepPort for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Anything that can turn a URL into document bytes: the fetch engine itself,
/// or the page cache sitting in front of it.
pub trait DocumentSource {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for &mut T {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}
