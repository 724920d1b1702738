use crate::codec::{BytesCodec, Codec};
use crate::disk::DiskStore;
use crate::error::BuildError;
use crate::loader::LoadFuture;
use crate::memory::MemoryStore;
use crate::metrics::Metrics;
use crate::runtime::TokioSpawner;
use crate::tiered::{TieredCache, TieredShared};
use crate::TaskSpawner;

use core::fmt;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

/// 64 MiB of decoded values.
pub const DEFAULT_MEMORY_CAPACITY: u64 = 64 * 1024 * 1024;
pub const DEFAULT_SHARDS: usize = 16;

/// A builder for `TieredCache` instances.
pub struct TieredCacheBuilder<V, C = BytesCodec> {
  capacity: u64,
  shards: usize,
  directory: Option<PathBuf>,
  codec: C,
  spawner: Option<Arc<dyn TaskSpawner>>,
  _value_marker: PhantomData<fn() -> V>,
}

impl<V, C> fmt::Debug for TieredCacheBuilder<V, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TieredCacheBuilder")
      .field("capacity", &self.capacity)
      .field("shards", &self.shards)
      .field("directory", &self.directory)
      .field("has_spawner", &self.spawner.is_some())
      .finish_non_exhaustive()
  }
}

impl TieredCacheBuilder<Bytes, BytesCodec> {
  /// A builder for a cache of raw bytes.
  pub fn new() -> Self {
    Self {
      capacity: DEFAULT_MEMORY_CAPACITY,
      shards: DEFAULT_SHARDS,
      directory: None,
      codec: BytesCodec,
      spawner: None,
      _value_marker: PhantomData,
    }
  }
}

impl Default for TieredCacheBuilder<Bytes, BytesCodec> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V, C> TieredCacheBuilder<V, C> {
  /// Sets the maximum total cost held by the memory tier.
  pub fn capacity(mut self, capacity: u64) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the number of memory shards, rounded up to a power of two.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = if shards == 0 { 0 } else { shards.next_power_of_two() };
    self
  }

  /// Sets the directory of the disk tier. It is created on first use.
  pub fn disk_directory(mut self, directory: impl Into<PathBuf>) -> Self {
    self.directory = Some(directory.into());
    self
  }

  /// Sets the spawner used for loads and write-backs.
  ///
  /// Defaults to the Tokio runtime the cache is built in.
  pub fn spawner(mut self, spawner: impl TaskSpawner) -> Self {
    self.spawner = Some(Arc::new(spawner));
    self
  }

  /// Like [`spawner`](Self::spawner), for a spawner shared with other components.
  pub fn shared_spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
    self.spawner = Some(spawner);
    self
  }

  /// Replaces the codec, changing the decoded value type.
  pub fn codec<V2, C2>(self, codec: C2) -> TieredCacheBuilder<V2, C2>
  where
    C2: Codec<V2>,
  {
    TieredCacheBuilder {
      capacity: self.capacity,
      shards: self.shards,
      directory: self.directory,
      codec,
      spawner: self.spawner,
      _value_marker: PhantomData,
    }
  }
}

impl<V, C> TieredCacheBuilder<V, C>
where
  V: Send + Sync + 'static,
  C: Codec<V>,
{
  pub fn build(self) -> Result<TieredCache<V, C>, BuildError> {
    let directory = self.directory.ok_or(BuildError::MissingDirectory)?;
    let spawner: Arc<dyn TaskSpawner> = match self.spawner {
      Some(spawner) => spawner,
      None => match tokio::runtime::Handle::try_current() {
        Ok(handle) => Arc::new(TokioSpawner::with_handle(handle)),
        Err(_) => return Err(BuildError::SpawnerRequired),
      },
    };

    let metrics = Arc::new(Metrics::new());
    let hasher = ahash::RandomState::new();
    let memory = MemoryStore::with_metrics(self.capacity, self.shards, hasher.clone(), metrics.clone())?;

    let pending_loads = (0..self.shards)
      .map(|_| Mutex::new(HashMap::<_, Arc<LoadFuture<V>>>::new()))
      .collect::<Vec<_>>()
      .into_boxed_slice();

    Ok(TieredCache {
      shared: Arc::new(TieredShared {
        memory,
        disk: DiskStore::new(directory),
        codec: self.codec,
        metrics,
        spawner,
        pending_loads,
        hasher,
        pending_writes: tokio::sync::watch::channel(0).0,
      }),
    })
  }
}
