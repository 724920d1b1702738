use std::{future::Future, pin::Pin};

/// A trait for spawning a detached future onto an asynchronous runtime.
///
/// The tiered cache runs network loads and disk write-backs through a
/// spawner so that neither depends on the calling task staying alive.
pub trait TaskSpawner: Send + Sync + 'static {
  /// Spawns a type-erased future. The result is never observed.
  fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>);
}

/// Spawns onto a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioSpawner(tokio::runtime::Handle);

impl TokioSpawner {
  /// Creates a spawner that uses the current Tokio runtime context.
  /// Panics if called outside of a Tokio runtime.
  pub fn new() -> Self {
    Self(tokio::runtime::Handle::current())
  }

  /// Creates a spawner for an explicit runtime handle.
  pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
    Self(handle)
  }
}

impl Default for TokioSpawner {
  fn default() -> Self {
    Self::new()
  }
}

impl TaskSpawner for TokioSpawner {
  fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>) {
    self.0.spawn(future);
  }
}
