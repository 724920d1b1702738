//! `gallery_logging` - configuration-driven `tracing` setup.
//!
//! The gallery crates only emit through `tracing` macros. An application
//! calls [`init_from_file`] (or [`init`]) once at startup and keeps the
//! returned [`InitResult`] alive for as long as it logs.

pub mod config;
pub mod error;
pub mod init;

pub use config::{FileConfig, Format, LoggingConfig};
pub use error::{Error, Result};
pub use init::{build_dispatch, find_config_file, find_config_file_in, init, init_from_file};

use tracing_appender::non_blocking::WorkerGuard;

/// Keeps background log writers running. Dropping it flushes them.
#[must_use = "The InitResult must be kept alive for file logging to work and to flush on exit"]
#[derive(Default)]
pub struct InitResult {
  pub(crate) guards: Vec<WorkerGuard>,
}

impl InitResult {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Whether any background writer is attached.
  pub fn has_file_output(&self) -> bool {
    !self.guards.is_empty()
  }
}
