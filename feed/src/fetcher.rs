use crate::error::FetchError;
use crate::photo::Photo;
use crate::request::{FetchRequest, AUTHORIZATION, CONTENT_TYPE};
use crate::transport::{HttpTransport, Transport};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the array of photo records sits in a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingShape {
  /// The body is the array.
  Bare,
  /// The array is the value of this top-level field.
  Wrapped(&'static str),
}

impl ListingShape {
  pub const SEARCH: ListingShape = ListingShape::Wrapped("results");
}

/// Issues requests with a bounded timeout and folds every failure to `None`.
#[derive(Clone)]
pub struct RemoteFetcher {
  transport: Arc<dyn Transport>,
  timeout: Duration,
  authorization: Option<String>,
}

impl fmt::Debug for RemoteFetcher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RemoteFetcher")
      .field("timeout", &self.timeout)
      .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
      .finish_non_exhaustive()
  }
}

impl RemoteFetcher {
  pub fn new(transport: impl Transport, timeout: Duration) -> Self {
    Self {
      transport: Arc::new(transport),
      timeout,
      authorization: None,
    }
  }

  /// A fetcher over a fresh [`HttpTransport`].
  pub fn http(timeout: Duration) -> Result<Self, FetchError> {
    Ok(Self::new(HttpTransport::new()?, timeout))
  }

  /// Token sent as the `Authorization` header on API requests.
  pub fn with_authorization(mut self, token: impl Into<String>) -> Self {
    self.authorization = Some(token.into());
    self
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// A request to a JSON API endpoint, carrying the fixed API headers.
  pub fn api_request(&self, base: Url) -> FetchRequest {
    let request = FetchRequest::get(base).header(CONTENT_TYPE, "application/json");
    match &self.authorization {
      Some(token) => request.header(AUTHORIZATION, token.clone()),
      None => request,
    }
  }

  /// Executes `request`, enforcing the configured timeout whatever the
  /// transport does.
  pub async fn try_fetch(&self, request: &FetchRequest) -> Result<Bytes, FetchError> {
    match tokio::time::timeout(self.timeout, self.transport.execute(request, self.timeout)).await {
      Ok(result) => result,
      Err(_) => Err(FetchError::Timeout(self.timeout)),
    }
  }

  /// Executes `request`. Any failure is logged and reported as `None`.
  pub async fn fetch(&self, request: &FetchRequest) -> Option<Bytes> {
    match self.try_fetch(request).await {
      Ok(body) => {
        trace!(url = %request.url(), bytes = body.len(), "fetched");
        Some(body)
      }
      Err(error) => {
        debug!(url = %request.url(), %error, "fetch failed");
        None
      }
    }
  }

  /// Fetches and decodes a photo listing.
  ///
  /// Records missing a required field are dropped; a body that is not a
  /// listing at all fails the whole fetch.
  pub async fn fetch_listing(&self, request: &FetchRequest, shape: ListingShape) -> Option<Vec<Photo>> {
    let body = self.fetch(request).await?;
    match decode_listing(&body, shape) {
      Ok(photos) => Some(photos),
      Err(error) => {
        debug!(url = %request.url(), %error, "listing did not decode");
        None
      }
    }
  }
}

#[derive(Deserialize)]
struct RawUser {
  username: String,
}

#[derive(Deserialize)]
struct RawUrls {
  thumb: String,
  full: String,
}

#[derive(Deserialize)]
struct RawPhoto {
  id: String,
  user: RawUser,
  urls: RawUrls,
  width: u32,
  height: u32,
}

impl From<RawPhoto> for Photo {
  fn from(raw: RawPhoto) -> Self {
    Photo::new(raw.id, raw.user.username, raw.urls.thumb, raw.urls.full, raw.width, raw.height)
  }
}

/// Decodes a listing body, skipping records that are incomplete.
pub fn decode_listing(body: &[u8], shape: ListingShape) -> Result<Vec<Photo>, FetchError> {
  let root: Value = serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
  let records = match (shape, root) {
    (ListingShape::Bare, Value::Array(records)) => records,
    (ListingShape::Wrapped(field), Value::Object(mut object)) => match object.remove(field) {
      Some(Value::Array(records)) => records,
      _ => return Err(FetchError::Decode(format!("missing '{field}' array"))),
    },
    (ListingShape::Bare, _) => return Err(FetchError::Decode("expected a top-level array".into())),
    (ListingShape::Wrapped(_), _) => return Err(FetchError::Decode("expected a top-level object".into())),
  };

  let total = records.len();
  let photos: Vec<Photo> = records
    .into_iter()
    .filter_map(|record| serde_json::from_value::<RawPhoto>(record).ok())
    .map(Photo::from)
    .collect();
  if photos.len() < total {
    trace!(dropped = total - photos.len(), "skipped incomplete listing records");
  }
  Ok(photos)
}
