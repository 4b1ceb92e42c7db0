use std::time::Duration;

use reqwest::{blocking::Client, header::HeaderMap, Method};
use thiserror::Error;

/// A fully built outbound request. The worker hands this to the transport
/// once per attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Performs one HTTP exchange. Implementations must be safe to share
/// between the worker and the rest of the client.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),
    #[error("connection failed: {0}")]
    Connection(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // Refused connections and timeouts are reported apart from malformed requests
        if err.is_connect() || err.is_timeout() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Client(err)
        }
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();

        Ok(ApiResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connection_is_a_connection_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let request = ApiRequest {
            method: Method::GET,
            url: "http://127.0.0.1:1/".to_string(),
            headers: HeaderMap::new(),
            body: None,
        };

        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)), "{:?}", err);
    }
}
