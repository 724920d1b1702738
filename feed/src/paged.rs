use crate::api::PhotoSource;
use crate::error::PageError;
use crate::photo::Photo;
use crate::snapshot::SnapshotStore;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

/// Where the photos of a [`Page`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
  Network,
  /// The persisted default listing, served because the network failed.
  /// Snapshot pages are not appended and do not advance the cursor.
  Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
  pub photos: Vec<Photo>,
  pub source: PageSource,
}

struct PageState {
  cursor: u32,
  photos: Vec<Photo>,
  query: String,
  /// Bumped by every reset; a fetch that started under an older value
  /// must not commit.
  generation: u64,
}

impl PageState {
  fn new() -> Self {
    Self {
      cursor: 1,
      photos: Vec::new(),
      query: String::new(),
      generation: 0,
    }
  }

  fn is_fresh(&self) -> bool {
    self.cursor == 1 && self.photos.is_empty()
  }
}

/// An append-only, paginated listing with a one-based page cursor.
///
/// Fetches are serialized so pages commit in cursor order. The listing is
/// either the default collection (empty query) or a search; switching
/// between the two requires a [`reset`](PagedModel::reset).
pub struct PagedModel<S> {
  source: S,
  snapshot: Arc<SnapshotStore>,
  state: Mutex<PageState>,
  fetch_lock: tokio::sync::Mutex<()>,
}

impl<S: PhotoSource> PagedModel<S> {
  pub fn new(source: S, snapshot: Arc<SnapshotStore>) -> Self {
    Self {
      source,
      snapshot,
      state: Mutex::new(PageState::new()),
      fetch_lock: tokio::sync::Mutex::new(()),
    }
  }

  /// The next page of the default collection.
  pub async fn fetch_next_page(&self) -> Result<Page, PageError> {
    self.fetch_next("").await
  }

  /// The next page of a search for `query`. An empty query is the default
  /// collection.
  pub async fn fetch_next_page_with(&self, query: &str) -> Result<Page, PageError> {
    self.fetch_next(query).await
  }

  async fn fetch_next(&self, query: &str) -> Result<Page, PageError> {
    let _serial = self.fetch_lock.lock().await;

    let (generation, page) = {
      let state = self.state.lock();
      if state.query != query && !state.is_fresh() {
        return Err(PageError::ModeConflict {
          current: state.query.clone(),
          requested: query.to_owned(),
        });
      }
      (state.generation, state.cursor)
    };

    let search = (!query.is_empty()).then_some(query);
    let Some(photos) = self.source.list(page, search).await else {
      return self.fall_back(query).await;
    };

    let snapshot = {
      let mut state = self.state.lock();
      if state.generation != generation {
        debug!(page, "dropping page fetched before a reset");
        return Err(PageError::Superseded);
      }
      // A fresh model takes on the mode of its first committed page.
      if state.query != query {
        state.query = query.to_owned();
      }
      state.photos.extend(photos.iter().cloned());
      state.cursor += 1;
      search.is_none().then(|| state.photos.clone())
    };
    debug!(page, count = photos.len(), query, "page committed");

    if let Some(all) = snapshot {
      self.snapshot.save_in_background(all);
    }
    Ok(Page {
      photos,
      source: PageSource::Network,
    })
  }

  async fn fall_back(&self, query: &str) -> Result<Page, PageError> {
    if !query.is_empty() {
      return Err(PageError::Fetch);
    }
    match self.snapshot.load().await {
      Some(photos) => {
        info!(count = photos.len(), "network unavailable, serving photo snapshot");
        Ok(Page {
          photos,
          source: PageSource::Snapshot,
        })
      }
      None => Err(PageError::Fetch),
    }
  }

  /// Clears the listing and its query and rewinds the cursor to 1.
  /// A fetch already in flight will not commit.
  pub fn reset(&self) {
    let mut state = self.state.lock();
    state.photos.clear();
    state.cursor = 1;
    state.query.clear();
    state.generation = state.generation.wrapping_add(1);
  }

  /// The page number the next fetch will request.
  pub fn cursor(&self) -> u32 {
    self.state.lock().cursor
  }

  pub fn photos(&self) -> Vec<Photo> {
    self.state.lock().photos.clone()
  }

  pub fn len(&self) -> usize {
    self.state.lock().photos.len()
  }

  pub fn is_empty(&self) -> bool {
    self.state.lock().photos.is_empty()
  }

  /// The search query of the committed listing; empty for the default
  /// collection. Only a committed page sets it.
  pub fn query(&self) -> String {
    self.state.lock().query.clone()
  }

  pub fn snapshot(&self) -> &Arc<SnapshotStore> {
    &self.snapshot
  }
}
