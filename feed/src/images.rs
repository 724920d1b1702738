use crate::fetcher::RemoteFetcher;
use crate::photo::{ImageSize, Photo};
use crate::request::FetchRequest;

use std::sync::Arc;

use bytes::Bytes;
use gallery_cache::{CacheKey, TieredCache};
use tracing::debug;
use url::Url;

/// Image bytes for grid cells, resolved through the tiered cache.
///
/// Every load hands back the caller's tag so a cell that has since been
/// reused for another photo can tell the result is not its own.
#[derive(Debug, Clone)]
pub struct ImageLoader {
  cache: TieredCache<Bytes>,
  fetcher: RemoteFetcher,
}

impl ImageLoader {
  pub fn new(cache: TieredCache<Bytes>, fetcher: RemoteFetcher) -> Self {
    Self { cache, fetcher }
  }

  pub fn cache(&self) -> &TieredCache<Bytes> {
    &self.cache
  }

  /// Memory-only lookup, for synchronous first paint.
  pub fn cached(&self, url: &str) -> Option<Arc<Bytes>> {
    let url = Url::parse(url).ok()?;
    self.cache.peek(&CacheKey::from_locator(url.as_str()))
  }

  /// Resolves `url` through memory, disk and network.
  pub async fn load<T>(&self, url: &str, tag: T) -> (T, Option<Arc<Bytes>>) {
    let url = match Url::parse(url) {
      Ok(url) => url,
      Err(error) => {
        debug!(url, %error, "skipping image with an invalid url");
        return (tag, None);
      }
    };

    let key = CacheKey::from_locator(url.as_str());
    let request = FetchRequest::get(url);
    let fetcher = self.fetcher.clone();
    let image = self
      .cache
      .resolve(&key, move || async move { fetcher.fetch(&request).await })
      .await;
    (tag, image)
  }

  /// Loads one of `photo`'s images, tagged with the photo's identifier.
  pub async fn load_photo(&self, photo: &Photo, size: ImageSize) -> (String, Option<Arc<Bytes>>) {
    self.load(photo.url(size), photo.identifier().to_owned()).await
  }
}
