use crate::fetcher::{ListingShape, RemoteFetcher};
use crate::photo::Photo;
use crate::request::FetchRequest;

use async_trait::async_trait;
use url::Url;

pub const DEFAULT_COLLECTION_URL: &str = "https://api.unsplash.com/collections/317099/photos";
pub const DEFAULT_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Produces one page of a photo listing.
///
/// `query` is `None` for the default collection. Any failure is `None`.
#[async_trait]
pub trait PhotoSource: Send + Sync + 'static {
  async fn list(&self, page: u32, query: Option<&str>) -> Option<Vec<Photo>>;
}

/// The two listing endpoints and the page size shared by both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
  pub collection: Url,
  pub search: Url,
  pub page_size: u32,
}

impl Default for Endpoints {
  fn default() -> Self {
    Self {
      collection: Url::parse(DEFAULT_COLLECTION_URL).expect("default collection url is valid"),
      search: Url::parse(DEFAULT_SEARCH_URL).expect("default search url is valid"),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

/// A [`PhotoSource`] backed by the remote photo API.
#[derive(Debug, Clone)]
pub struct PhotoApi {
  fetcher: RemoteFetcher,
  endpoints: Endpoints,
}

impl PhotoApi {
  pub fn new(fetcher: RemoteFetcher, endpoints: Endpoints) -> Self {
    Self { fetcher, endpoints }
  }

  pub fn endpoints(&self) -> &Endpoints {
    &self.endpoints
  }

  pub fn collection_request(&self, page: u32) -> FetchRequest {
    self
      .fetcher
      .api_request(self.endpoints.collection.clone())
      .param("page", page)
      .param("per_page", self.endpoints.page_size)
  }

  pub fn search_request(&self, query: &str, page: u32) -> FetchRequest {
    self
      .fetcher
      .api_request(self.endpoints.search.clone())
      .param("content_filter", "low")
      .param("page", page)
      .param("per_page", self.endpoints.page_size)
      .param("query", query)
  }
}

#[async_trait]
impl PhotoSource for PhotoApi {
  async fn list(&self, page: u32, query: Option<&str>) -> Option<Vec<Photo>> {
    match query {
      None => {
        let request = self.collection_request(page);
        self.fetcher.fetch_listing(&request, ListingShape::Bare).await
      }
      Some(query) => {
        let request = self.search_request(query, page);
        self.fetcher.fetch_listing(&request, ListingShape::SEARCH).await
      }
    }
  }
}
