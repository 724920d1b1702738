use crate::error::FetchError;
use crate::request::FetchRequest;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Request, StatusCode};

/// Performs one request and returns the response body.
///
/// Implementations report every failure as a [`FetchError`]; they never
/// retry.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  async fn execute(&self, request: &FetchRequest, timeout: Duration) -> Result<Bytes, FetchError>;
}

/// A [`Transport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
}

impl HttpTransport {
  pub fn new() -> Result<Self, FetchError> {
    let client = Client::builder()
      .tcp_keepalive(Duration::from_secs(600))
      .use_rustls_tls()
      .build()
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    Ok(Self { client })
  }

  pub fn with_client(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn execute(&self, request: &FetchRequest, timeout: Duration) -> Result<Bytes, FetchError> {
    let url = request.url();
    match url.scheme() {
      "http" | "https" => (),
      scheme => return Err(FetchError::InvalidUrl(format!("unsupported scheme '{scheme}' in {url}"))),
    }

    let mut http = Request::new(Method::GET, url);
    *http.timeout_mut() = Some(timeout);
    for (name, value) in request.headers() {
      let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| FetchError::InvalidUrl(format!("bad header name '{name}': {e}")))?;
      let value = reqwest::header::HeaderValue::from_str(value)
        .map_err(|e| FetchError::InvalidUrl(format!("bad header value for '{name}': {e}")))?;
      http.headers_mut().append(name, value);
    }

    let response = self.client.execute(http).await.map_err(|e| map_reqwest(e, timeout))?;
    let status = response.status();
    if status != StatusCode::OK {
      return Err(FetchError::Status(status.as_u16()));
    }

    response.bytes().await.map_err(|e| map_reqwest(e, timeout))
  }
}

fn map_reqwest(error: reqwest::Error, timeout: Duration) -> FetchError {
  if error.is_timeout() {
    FetchError::Timeout(timeout)
  } else {
    FetchError::Transport(error.to_string())
  }
}
