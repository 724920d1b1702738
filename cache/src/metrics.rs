use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// Lock-free counters shared by every tier of a cache.
#[derive(Debug)]
pub struct Metrics {
  // --- Memory tier ---
  pub(crate) memory_hits: CachePadded<AtomicU64>,
  pub(crate) memory_misses: CachePadded<AtomicU64>,
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) rejected: CachePadded<AtomicU64>,
  pub(crate) evicted_by_capacity: CachePadded<AtomicU64>,
  pub(crate) invalidations: CachePadded<AtomicU64>,
  pub(crate) current_cost: CachePadded<AtomicU64>,

  // --- Disk tier ---
  pub(crate) disk_hits: CachePadded<AtomicU64>,
  pub(crate) disk_misses: CachePadded<AtomicU64>,
  pub(crate) write_backs: CachePadded<AtomicU64>,
  pub(crate) write_back_failures: CachePadded<AtomicU64>,

  // --- Network tier ---
  pub(crate) fetches: CachePadded<AtomicU64>,
  pub(crate) fetch_failures: CachePadded<AtomicU64>,
  pub(crate) coalesced: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      memory_hits: CachePadded::new(AtomicU64::new(0)),
      memory_misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      rejected: CachePadded::new(AtomicU64::new(0)),
      evicted_by_capacity: CachePadded::new(AtomicU64::new(0)),
      invalidations: CachePadded::new(AtomicU64::new(0)),
      current_cost: CachePadded::new(AtomicU64::new(0)),
      disk_hits: CachePadded::new(AtomicU64::new(0)),
      disk_misses: CachePadded::new(AtomicU64::new(0)),
      write_backs: CachePadded::new(AtomicU64::new(0)),
      write_back_failures: CachePadded::new(AtomicU64::new(0)),
      fetches: CachePadded::new(AtomicU64::new(0)),
      fetch_failures: CachePadded::new(AtomicU64::new(0)),
      coalesced: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub fn snapshot(&self) -> MetricsSnapshot {
    let memory_hits = self.memory_hits.load(Ordering::Relaxed);
    let memory_misses = self.memory_misses.load(Ordering::Relaxed);
    let lookups = memory_hits + memory_misses;

    MetricsSnapshot {
      memory_hits,
      memory_misses,
      memory_hit_ratio: if lookups == 0 {
        0.0
      } else {
        memory_hits as f64 / lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      rejected: self.rejected.load(Ordering::Relaxed),
      evicted_by_capacity: self.evicted_by_capacity.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      current_cost: self.current_cost.load(Ordering::Relaxed),
      disk_hits: self.disk_hits.load(Ordering::Relaxed),
      disk_misses: self.disk_misses.load(Ordering::Relaxed),
      write_backs: self.write_backs.load(Ordering::Relaxed),
      write_back_failures: self.write_back_failures.load(Ordering::Relaxed),
      fetches: self.fetches.load(Ordering::Relaxed),
      fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
      coalesced: self.coalesced.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
  /// Lookups answered by the memory tier.
  pub memory_hits: u64,
  /// Lookups that fell through the memory tier.
  pub memory_misses: u64,
  /// memory_hits / (memory_hits + memory_misses).
  pub memory_hit_ratio: f64,
  /// Entries admitted into the memory tier.
  pub inserts: u64,
  /// Entries refused because they alone exceed a shard's budget.
  pub rejected: u64,
  /// Entries evicted from memory to stay under capacity.
  pub evicted_by_capacity: u64,
  /// Entries removed explicitly.
  pub invalidations: u64,
  /// Total cost currently held in memory.
  pub current_cost: u64,
  /// Lookups answered by the disk tier.
  pub disk_hits: u64,
  /// Lookups that fell through the disk tier.
  pub disk_misses: u64,
  /// Completed write-backs to disk.
  pub write_backs: u64,
  /// Write-backs the disk tier refused.
  pub write_back_failures: u64,
  /// Network fetches issued.
  pub fetches: u64,
  /// Fetches that produced no usable value.
  pub fetch_failures: u64,
  /// Callers that joined an in-flight fetch instead of issuing their own.
  pub coalesced: u64,
  /// Seconds since the cache was built.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("memory_hits", &self.memory_hits)
      .field("memory_misses", &self.memory_misses)
      .field("memory_hit_ratio", &format!("{:.2}%", self.memory_hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("rejected", &self.rejected)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("invalidations", &self.invalidations)
      .field("current_cost", &self.current_cost)
      .field("disk_hits", &self.disk_hits)
      .field("disk_misses", &self.disk_misses)
      .field("write_backs", &self.write_backs)
      .field("write_back_failures", &self.write_back_failures)
      .field("fetches", &self.fetches)
      .field("fetch_failures", &self.fetch_failures)
      .field("coalesced", &self.coalesced)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
