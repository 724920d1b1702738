//! Fetches the first pages of the configured listing and warms the
//! thumbnail cache.
//!
//! Usage: `gallery_fetch [CONFIG.yaml] [PAGES] [QUERY]`

use std::path::Path;
use std::process::ExitCode;

use gallery_feed::{Gallery, GalleryConfig, ImageSize, PageSource};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
  let _logging = match gallery_logging::find_config_file(None) {
    Ok(path) => match gallery_logging::init_from_file(&path) {
      Ok(guard) => Some(guard),
      Err(e) => {
        eprintln!("logging disabled: {e}");
        None
      }
    },
    Err(_) => gallery_logging::init(&gallery_logging::LoggingConfig::default()).ok(),
  };

  let mut args = std::env::args().skip(1);
  let config = match args.next() {
    Some(path) => match GalleryConfig::from_file(Path::new(&path)) {
      Ok(config) => config,
      Err(e) => {
        error!(%e, "invalid configuration");
        return ExitCode::FAILURE;
      }
    },
    None => GalleryConfig::default(),
  };
  let pages: u32 = args.next().and_then(|n| n.parse().ok()).unwrap_or(1);
  let query = args.next().unwrap_or_default();

  let gallery = match Gallery::from_config(&config) {
    Ok(gallery) => gallery,
    Err(e) => {
      error!(%e, "failed to start");
      return ExitCode::FAILURE;
    }
  };

  for _ in 0..pages {
    let page = match gallery.model.fetch_next_page_with(&query).await {
      Ok(page) => page,
      Err(e) => {
        warn!(%e, "no page");
        break;
      }
    };
    info!(count = page.photos.len(), cursor = gallery.model.cursor(), "page");
    let from_snapshot = page.source == PageSource::Snapshot;

    let mut loads = tokio::task::JoinSet::new();
    for photo in page.photos {
      let images = gallery.images.clone();
      loads.spawn(async move { images.load_photo(&photo, ImageSize::Thumbnail).await });
    }
    let mut loaded = 0;
    while let Some(joined) = loads.join_next().await {
      match joined {
        Ok((_, Some(_))) => loaded += 1,
        Ok((id, None)) => warn!(id, "thumbnail unavailable"),
        Err(e) => warn!(%e, "thumbnail task failed"),
      }
    }
    info!(loaded, "thumbnails cached");

    if from_snapshot {
      break;
    }
  }

  gallery.model.snapshot().flush().await;
  gallery.images.cache().flush().await;
  info!(metrics = ?gallery.images.cache().metrics(), "done");
  ExitCode::SUCCESS
}
