use crate::api::{Endpoints, DEFAULT_COLLECTION_URL, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_URL};
use crate::error::ConfigError;

use std::path::{Path, PathBuf};
use std::time::Duration;

use gallery_cache::builder::{DEFAULT_MEMORY_CAPACITY, DEFAULT_SHARDS};
use serde::Deserialize;
use url::Url;

const IMAGE_CACHE_DIR: &str = "ImageCache";
const SNAPSHOT_DIR: &str = "PhotoCache";

// --- Raw, as written in YAML ---

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GalleryConfigRaw {
  #[serde(default)]
  pub cache: CacheConfigRaw,
  #[serde(default)]
  pub api: ApiConfigRaw,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfigRaw {
  #[serde(default)]
  pub root: Option<String>,
  #[serde(default = "default_memory_capacity")]
  pub memory_capacity_bytes: u64,
  #[serde(default = "default_memory_shards")]
  pub memory_shards: usize,
}

impl Default for CacheConfigRaw {
  fn default() -> Self {
    Self {
      root: None,
      memory_capacity_bytes: default_memory_capacity(),
      memory_shards: default_memory_shards(),
    }
  }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfigRaw {
  #[serde(default = "default_collection_url")]
  pub collection_url: String,
  #[serde(default = "default_search_url")]
  pub search_url: String,
  #[serde(default)]
  pub authorization: Option<String>,
  #[serde(default = "default_timeout")]
  pub timeout: String,
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for ApiConfigRaw {
  fn default() -> Self {
    Self {
      collection_url: default_collection_url(),
      search_url: default_search_url(),
      authorization: None,
      timeout: default_timeout(),
      page_size: default_page_size(),
    }
  }
}

fn default_memory_capacity() -> u64 {
  DEFAULT_MEMORY_CAPACITY
}

fn default_memory_shards() -> usize {
  DEFAULT_SHARDS
}

fn default_collection_url() -> String {
  DEFAULT_COLLECTION_URL.to_string()
}

fn default_search_url() -> String {
  DEFAULT_SEARCH_URL.to_string()
}

fn default_timeout() -> String {
  "10s".to_string()
}

fn default_page_size() -> u32 {
  DEFAULT_PAGE_SIZE
}

// --- Processed ---

/// Validated settings for a [`Gallery`](crate::Gallery).
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
  pub cache_root: PathBuf,
  pub memory_capacity: u64,
  pub memory_shards: usize,
  pub endpoints: Endpoints,
  pub authorization: Option<String>,
  pub timeout: Duration,
}

impl GalleryConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let raw: GalleryConfigRaw = serde_yaml::from_str(yaml)?;
    Self::from_raw(raw)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_yaml_str(&yaml)
  }

  pub fn from_raw(raw: GalleryConfigRaw) -> Result<Self, ConfigError> {
    let GalleryConfigRaw { cache, api } = raw;

    if cache.memory_capacity_bytes == 0 {
      return Err(invalid("cache.memory_capacity_bytes", "must be greater than zero"));
    }
    if cache.memory_shards == 0 {
      return Err(invalid("cache.memory_shards", "must be greater than zero"));
    }
    if api.page_size == 0 {
      return Err(invalid("api.page_size", "must be greater than zero"));
    }

    let timeout = humantime::parse_duration(&api.timeout)
      .map_err(|e| invalid("api.timeout", format!("'{}': {e}", api.timeout)))?;
    if timeout.is_zero() {
      return Err(invalid("api.timeout", "must be greater than zero"));
    }

    let endpoints = Endpoints {
      collection: parse_url("api.collection_url", &api.collection_url)?,
      search: parse_url("api.search_url", &api.search_url)?,
      page_size: api.page_size,
    };

    let cache_root = match cache.root {
      Some(root) if !root.is_empty() => PathBuf::from(root),
      _ => default_cache_root(),
    };

    Ok(Self {
      cache_root,
      memory_capacity: cache.memory_capacity_bytes,
      memory_shards: cache.memory_shards,
      endpoints,
      authorization: api.authorization.filter(|token| !token.is_empty()),
      timeout,
    })
  }

  /// Where image bytes are cached on disk.
  pub fn image_cache_dir(&self) -> PathBuf {
    self.cache_root.join(IMAGE_CACHE_DIR)
  }

  /// Where the default listing snapshot lives.
  pub fn snapshot_dir(&self) -> PathBuf {
    self.cache_root.join(SNAPSHOT_DIR)
  }
}

impl Default for GalleryConfig {
  fn default() -> Self {
    Self {
      cache_root: default_cache_root(),
      memory_capacity: DEFAULT_MEMORY_CAPACITY,
      memory_shards: DEFAULT_SHARDS,
      endpoints: Endpoints::default(),
      authorization: None,
      timeout: crate::fetcher::DEFAULT_TIMEOUT,
    }
  }
}

fn default_cache_root() -> PathBuf {
  std::env::temp_dir().join("gallery")
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
  let url = Url::parse(value).map_err(|e| invalid(field, format!("'{value}': {e}")))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    scheme => Err(invalid(field, format!("unsupported scheme '{scheme}'"))),
  }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
  ConfigError::InvalidValue {
    field,
    message: message.into(),
  }
}
