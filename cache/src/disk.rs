//! The durable tier: one framed file per key under a dedicated directory.
//!
//! The store is best-effort. Every failure (missing directory, permissions,
//! short or corrupt files) is logged and reported as `false`/`None`; nothing
//! here ever returns an error to the caller.

use crate::key::CacheKey;

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const MAGIC: &[u8; 4] = b"GLRY";
const FORMAT_VERSION: u8 = 1;
const CHECKSUM_LEN: usize = 8;
const HEADER_LEN: usize = MAGIC.len() + 1 + 8 + CHECKSUM_LEN;

/// A key to bytes store backed by a filesystem directory.
#[derive(Debug)]
pub struct DiskStore {
  directory: PathBuf,
  // `None` once directory creation has failed: the store is then a no-op.
  ready: OnceCell<Option<PathBuf>>,
  temp_counter: AtomicU64,
}

impl DiskStore {
  /// Creates a store rooted at `directory`. Nothing touches the filesystem
  /// until the first operation.
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      ready: OnceCell::new(),
      temp_counter: AtomicU64::new(0),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  async fn dir(&self) -> Option<&Path> {
    self
      .ready
      .get_or_init(|| async {
        match tokio::fs::create_dir_all(&self.directory).await {
          Ok(()) => {
            sweep_temp_files(&self.directory).await;
            Some(self.directory.clone())
          }
          Err(e) => {
            warn!(
              directory = %self.directory.display(),
              error = %e,
              "disk cache unavailable, continuing without it"
            );
            None
          }
        }
      })
      .await
      .as_deref()
  }

  /// Whether the backing directory exists (creating it on first call).
  pub async fn is_available(&self) -> bool {
    self.dir().await.is_some()
  }

  /// Persists `bytes` under `key`, replacing any previous entry.
  ///
  /// Concurrent `load`s observe either the old entry or the new one, never a
  /// partially written file.
  pub async fn save(&self, key: &CacheKey, bytes: &[u8]) -> bool {
    let Some(dir) = self.dir().await else {
      return false;
    };
    let target = dir.join(key.file_name());
    let temp = dir.join(format!(
      ".{}.{}.{}.tmp",
      key,
      process::id(),
      self.temp_counter.fetch_add(1, Ordering::Relaxed)
    ));

    match write_then_rename(&temp, &target, &encode_frame(bytes)).await {
      Ok(()) => true,
      Err(e) => {
        debug!(%key, error = %e, "disk save failed");
        let _ = tokio::fs::remove_file(&temp).await;
        false
      }
    }
  }

  /// Reads the entry for `key`. Missing, unreadable or corrupt entries are
  /// all reported as `None`.
  pub async fn load(&self, key: &CacheKey) -> Option<Bytes> {
    let dir = self.dir().await?;
    let path = dir.join(key.file_name());
    let raw = match tokio::fs::read(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
      Err(e) => {
        debug!(%key, error = %e, "disk load failed");
        return None;
      }
    };
    let payload = decode_frame(&raw);
    if payload.is_none() {
      debug!(%key, len = raw.len(), "discarding corrupt disk entry");
    }
    payload
  }

  /// Deletes the entry for `key`, returning `true` if one was removed.
  pub async fn remove(&self, key: &CacheKey) -> bool {
    let Some(dir) = self.dir().await else {
      return false;
    };
    tokio::fs::remove_file(dir.join(key.file_name())).await.is_ok()
  }
}

fn is_temp_file(name: &str) -> bool {
  name.starts_with('.') && name.ends_with(".tmp")
}

/// Removes temp files left behind by saves that never reached their rename.
async fn sweep_temp_files(directory: &Path) {
  let Ok(mut entries) = tokio::fs::read_dir(directory).await else {
    return;
  };
  let mut removed = 0usize;
  while let Ok(Some(entry)) = entries.next_entry().await {
    if !is_temp_file(&entry.file_name().to_string_lossy()) {
      continue;
    }
    if tokio::fs::remove_file(entry.path()).await.is_ok() {
      removed += 1;
    }
  }
  if removed > 0 {
    debug!(directory = %directory.display(), removed, "removed stale temp files");
  }
}

async fn write_then_rename(temp: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
  tokio::fs::write(temp, data).await?;
  tokio::fs::rename(temp, target).await
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
  let digest = Sha256::digest(payload);
  let mut out = [0u8; CHECKSUM_LEN];
  out.copy_from_slice(&digest[..CHECKSUM_LEN]);
  out
}

fn encode_frame(payload: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
  out.extend_from_slice(MAGIC);
  out.push(FORMAT_VERSION);
  out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
  out.extend_from_slice(&checksum(payload));
  out.extend_from_slice(payload);
  out
}

fn decode_frame(raw: &[u8]) -> Option<Bytes> {
  if raw.len() < HEADER_LEN || &raw[..4] != MAGIC || raw[4] != FORMAT_VERSION {
    return None;
  }
  let mut len = [0u8; 8];
  len.copy_from_slice(&raw[5..13]);
  let len = u64::from_le_bytes(len);
  let payload = &raw[HEADER_LEN..];
  if payload.len() as u64 != len || raw[13..HEADER_LEN] != checksum(payload) {
    return None;
  }
  Some(Bytes::copy_from_slice(payload))
}
