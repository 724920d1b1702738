//! A three-tier cache for a photo grid: decoded values in memory, raw bytes
//! on disk, and a caller-supplied network fetch behind both.
//!
//! # Features
//! - **Single-flight**: concurrent resolutions of one key share a single fetch.
//! - **Write-back**: fetched bytes are persisted to disk off the caller's path.
//! - **Best-effort disk**: an unusable cache directory degrades to a no-op,
//!   corrupt or partial files read as misses.
//! - **Cost-bounded memory**: sharded LRU with explicit memory-pressure trimming.
//! - **Observability**: per-tier counters via [`MetricsSnapshot`].

pub mod builder;
pub mod codec;
pub mod disk;
pub mod error;
pub mod key;
pub mod memory;
pub mod metrics;
pub mod runtime;
pub mod tiered;

mod loader;
mod lru_list;

pub use builder::TieredCacheBuilder;
pub use codec::{BytesCodec, Codec};
pub use disk::DiskStore;
pub use error::BuildError;
pub use key::CacheKey;
pub use memory::MemoryStore;
pub use metrics::MetricsSnapshot;
pub use runtime::{TaskSpawner, TokioSpawner};
pub use tiered::TieredCache;
