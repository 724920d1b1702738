use crate::api::PhotoApi;
use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::fetcher::RemoteFetcher;
use crate::images::ImageLoader;
use crate::paged::PagedModel;
use crate::snapshot::SnapshotStore;

use std::sync::Arc;

use gallery_cache::{TaskSpawner, TieredCacheBuilder, TokioSpawner};
use tracing::info;

/// The listing model and image loader for one gallery, wired from a
/// [`GalleryConfig`].
pub struct Gallery {
  pub model: PagedModel<PhotoApi>,
  pub images: ImageLoader,
}

impl Gallery {
  /// Builds a gallery on the current Tokio runtime.
  pub fn from_config(config: &GalleryConfig) -> Result<Self, GalleryError> {
    let spawner: Arc<dyn TaskSpawner> = match tokio::runtime::Handle::try_current() {
      Ok(handle) => Arc::new(TokioSpawner::with_handle(handle)),
      Err(_) => return Err(gallery_cache::BuildError::SpawnerRequired.into()),
    };
    Self::with_spawner(config, spawner)
  }

  pub fn with_spawner(config: &GalleryConfig, spawner: Arc<dyn TaskSpawner>) -> Result<Self, GalleryError> {
    let mut fetcher = RemoteFetcher::http(config.timeout)?;
    if let Some(token) = &config.authorization {
      fetcher = fetcher.with_authorization(token.clone());
    }

    let cache = TieredCacheBuilder::new()
      .capacity(config.memory_capacity)
      .shards(config.memory_shards)
      .disk_directory(config.image_cache_dir())
      .shared_spawner(spawner.clone())
      .build()?;

    let snapshot = Arc::new(SnapshotStore::new(config.snapshot_dir(), spawner));
    let api = PhotoApi::new(fetcher.clone(), config.endpoints.clone());

    info!(root = %config.cache_root.display(), "gallery ready");
    Ok(Self {
      model: PagedModel::new(api, snapshot),
      images: ImageLoader::new(cache, fetcher),
    })
  }
}
