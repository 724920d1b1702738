use thiserror::Error;

/// Errors that can occur when building a tiered cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The memory tier was configured with a capacity of zero.
  #[error("memory tier capacity cannot be zero")]
  ZeroCapacity,
  /// The memory tier was configured with zero shards.
  #[error("shard count cannot be zero")]
  ZeroShards,
  /// No `TaskSpawner` was configured and the builder was not called from
  /// inside a Tokio runtime.
  #[error("a task spawner is required outside of a tokio runtime")]
  SpawnerRequired,
  /// No disk directory was configured for the disk tier.
  #[error("a disk cache directory is required")]
  MissingDirectory,
}
