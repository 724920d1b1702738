mod common;

use common::{raw_record, ScriptedTransport, SharedTransport};

use std::time::Duration;

use bytes::Bytes;
use gallery_feed::{
  decode_listing, Endpoints, FetchError, ListingShape, PhotoApi, PhotoSource, RemoteFetcher,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn body(value: serde_json::Value) -> Bytes {
  Bytes::from(serde_json::to_vec(&value).unwrap())
}

fn api(transport: &std::sync::Arc<ScriptedTransport>) -> PhotoApi {
  let fetcher = RemoteFetcher::new(SharedTransport(transport.clone()), Duration::from_secs(10))
    .with_authorization("Client-ID test-token");
  PhotoApi::new(fetcher, Endpoints::default())
}

#[test]
fn test_incomplete_records_are_dropped() {
  let mut records: Vec<_> = (0..5).map(raw_record).collect();
  records[2].as_object_mut().unwrap().remove("width");

  let photos = decode_listing(&body(json!(records)), ListingShape::Bare).unwrap();
  assert_eq!(photos.len(), 4);
  let ids: Vec<_> = photos.iter().map(|p| p.identifier()).collect();
  assert_eq!(ids, ["photo-0", "photo-1", "photo-3", "photo-4"]);
  assert_eq!(photos[0].title(), "author0");
  assert_eq!(photos[0].thumb_url(), "https://images.example.com/0?w=200");
  assert_eq!(photos[0].width(), 400);
}

#[test]
fn test_records_with_wrong_types_are_dropped() {
  let mut records: Vec<_> = (0..4).map(raw_record).collect();
  records[0]["width"] = json!(400.5);
  records[1]["height"] = json!(-1);
  records[2]["urls"] = json!({ "thumb": "https://images.example.com/t" });
  records[3]["user"] = json!(null);

  let photos = decode_listing(&body(json!(records)), ListingShape::Bare).unwrap();
  assert!(photos.is_empty());
}

#[test]
fn test_wrapped_listing() {
  let listing = json!({ "total": 2, "results": [raw_record(7), raw_record(8)] });
  let photos = decode_listing(&body(listing), ListingShape::SEARCH).unwrap();
  assert_eq!(photos.len(), 2);
  assert_eq!(photos[1].identifier(), "photo-8");
}

#[test]
fn test_wrong_shape_is_a_decode_failure() {
  let bare = body(json!([raw_record(1)]));
  assert!(matches!(
    decode_listing(&bare, ListingShape::SEARCH),
    Err(FetchError::Decode(_))
  ));

  let wrapped = body(json!({ "results": [raw_record(1)] }));
  assert!(matches!(
    decode_listing(&wrapped, ListingShape::Bare),
    Err(FetchError::Decode(_))
  ));

  assert!(matches!(
    decode_listing(b"<html>", ListingShape::Bare),
    Err(FetchError::Decode(_))
  ));
}

#[test]
fn test_identical_queries_build_identical_requests() {
  let transport = ScriptedTransport::new();
  let api = api(&transport);

  assert_eq!(api.collection_request(3), api.collection_request(3));
  assert_eq!(
    api.collection_request(3).url().as_str(),
    "https://api.unsplash.com/collections/317099/photos?page=3&per_page=30"
  );
  assert_eq!(
    api.search_request("sea lion", 1).url().as_str(),
    "https://api.unsplash.com/search/photos?content_filter=low&page=1&per_page=30&query=sea+lion"
  );

  let headers: Vec<_> = api.collection_request(1).headers().map(|(k, v)| (k.to_owned(), v.to_owned())).collect();
  assert_eq!(
    headers,
    vec![
      ("Authorization".to_owned(), "Client-ID test-token".to_owned()),
      ("Content-Type".to_owned(), "application/json".to_owned()),
    ]
  );
}

#[tokio::test]
async fn test_source_uses_endpoint_by_mode() {
  let transport = ScriptedTransport::new();
  let api = api(&transport);

  transport.respond(
    api.collection_request(1).url().as_str(),
    Ok(body(json!([raw_record(1), raw_record(2)]))),
  );
  transport.respond(
    api.search_request("cats", 1).url().as_str(),
    Ok(body(json!({ "results": [raw_record(3)] }))),
  );

  let default = api.list(1, None).await.unwrap();
  assert_eq!(default.len(), 2);

  let search = api.list(1, Some("cats")).await.unwrap();
  assert_eq!(search.len(), 1);
  assert_eq!(search[0].identifier(), "photo-3");

  // Nothing scripted for page 2.
  assert!(api.list(2, None).await.is_none());
  assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_failures_fold_to_none() {
  let transport = ScriptedTransport::new();
  let api = api(&transport);
  let url = api.collection_request(1).url().to_string();

  transport.respond(&url, Err(FetchError::Status(500)));
  assert!(api.list(1, None).await.is_none());

  transport.respond(&url, Err(FetchError::Transport("connection reset".into())));
  assert!(api.list(1, None).await.is_none());

  transport.respond(&url, Ok(Bytes::from_static(b"{\"truncated\": ")));
  assert!(api.list(1, None).await.is_none());
}

#[tokio::test]
async fn test_timeout_is_enforced_by_the_fetcher() {
  let transport = ScriptedTransport::new();
  transport.set_delay(Duration::from_millis(500));
  let fetcher = RemoteFetcher::new(SharedTransport(transport.clone()), Duration::from_millis(20));
  let request = fetcher.api_request("https://api.example.com/slow".parse().unwrap());
  transport.respond(request.url().as_str(), Ok(Bytes::from_static(b"[]")));

  assert_eq!(
    fetcher.try_fetch(&request).await,
    Err(FetchError::Timeout(Duration::from_millis(20)))
  );
  assert!(fetcher.fetch(&request).await.is_none());
}
