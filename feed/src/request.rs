use std::collections::BTreeMap;

use gallery_cache::CacheKey;
use url::Url;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";

/// A GET request: base url, query parameters and headers.
///
/// Parameters are kept sorted by name so that equal requests always produce
/// the same url, whatever order they were added in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  base: Url,
  params: BTreeMap<String, String>,
  headers: BTreeMap<String, String>,
}

impl FetchRequest {
  pub fn get(base: Url) -> Self {
    Self {
      base,
      params: BTreeMap::new(),
      headers: BTreeMap::new(),
    }
  }

  /// Sets a query parameter, replacing any earlier value for `name`.
  pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
    self.params.insert(name.into(), value.to_string());
    self
  }

  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
    self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
    self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// The final url. Parameters are appended after any query the base
  /// already carries, in name order.
  pub fn url(&self) -> Url {
    let mut url = self.base.clone();
    if !self.params.is_empty() {
      let mut pairs = url.query_pairs_mut();
      for (name, value) in &self.params {
        pairs.append_pair(name, value);
      }
    }
    url
  }

  /// Key for the final url.
  pub fn cache_key(&self) -> CacheKey {
    CacheKey::from_locator(self.url().as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base() -> Url {
    Url::parse("https://api.example.com/photos").unwrap()
  }

  #[test]
  fn params_are_sorted() {
    let a = FetchRequest::get(base()).param("query", "cats").param("page", 2).param("per_page", 30);
    let b = FetchRequest::get(base()).param("per_page", 30).param("page", 2).param("query", "cats");
    assert_eq!(a.url(), b.url());
    assert_eq!(
      a.url().as_str(),
      "https://api.example.com/photos?page=2&per_page=30&query=cats"
    );
  }

  #[test]
  fn no_params_leaves_url_untouched() {
    let request = FetchRequest::get(base());
    assert_eq!(request.url().as_str(), "https://api.example.com/photos");
  }

  #[test]
  fn params_extend_an_existing_query() {
    let base = Url::parse("https://api.example.com/photos?client=ios").unwrap();
    let request = FetchRequest::get(base).param("page", 1);
    assert_eq!(
      request.url().as_str(),
      "https://api.example.com/photos?client=ios&page=1"
    );
  }

  #[test]
  fn values_are_encoded() {
    let request = FetchRequest::get(base()).param("query", "red & blue");
    assert_eq!(
      request.url().as_str(),
      "https://api.example.com/photos?query=red+%26+blue"
    );
  }
}
