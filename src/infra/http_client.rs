use crate::app::ports::{HttpClientPort, HttpGetResult, TransportError};
use crate::config::HttpConfig;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use std::time::Duration;

pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    pub fn new(http: &HttpConfig, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&http.accept)
            .map_err(|e| TransportError::InvalidRequest(format!("bad Accept header: {}", e)))?;
        headers.insert(ACCEPT, accept);

        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClientPort for ReqwestHttp {
    fn get(&self, url: &str) -> Result<HttpGetResult, TransportError> {
        let resp = self.client.get(url).send().map_err(classify)?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = resp.bytes().map_err(classify)?.to_vec();
        Ok(HttpGetResult { status, bytes, retry_after })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}
