use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a single remote fetch produced no payload.
///
/// Callers of [`RemoteFetcher::fetch`](crate::RemoteFetcher::fetch) only ever
/// see `None`; the variants exist so the failure can be logged precisely.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  #[error("invalid request url: {0}")]
  InvalidUrl(String),
  #[error("request timed out after {0:?}")]
  Timeout(Duration),
  #[error("transport failure: {0}")]
  Transport(String),
  #[error("unexpected response status {0}")]
  Status(u16),
  #[error("malformed response body: {0}")]
  Decode(String),
}

/// Why [`PagedModel`](crate::PagedModel) did not deliver a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
  /// The network failed and no snapshot could stand in for it.
  #[error("page fetch failed and no fallback is available")]
  Fetch,
  /// The model was reset while the page was in flight.
  #[error("page discarded: the model was reset while it was in flight")]
  Superseded,
  /// Default and search listings cannot share one sequence.
  #[error("listing mode is {current:?}, requested {requested:?}; reset first")]
  ModeConflict { current: String, requested: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_yaml::Error),
  #[error("invalid value for '{field}': {message}")]
  InvalidValue { field: &'static str, message: String },
}

/// Errors from wiring a [`Gallery`](crate::Gallery) together.
#[derive(Debug, Error)]
pub enum GalleryError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("failed to build the image cache: {0}")]
  Cache(#[from] gallery_cache::BuildError),
  #[error("failed to build the http client: {0}")]
  Client(#[from] FetchError),
}
