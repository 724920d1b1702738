//! Paginated photo listings and cached image loading for a waterfall grid.
//!
//! [`PagedModel`] accumulates pages from a [`PhotoSource`], keeping a JSON
//! snapshot of the default listing for offline first paint.
//! [`ImageLoader`] resolves image bytes through a
//! [`gallery_cache::TieredCache`]. Both sit on [`RemoteFetcher`], which turns
//! every network failure into an absent result.

pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gallery;
pub mod images;
pub mod paged;
pub mod photo;
pub mod request;
pub mod snapshot;
pub mod transport;

pub use api::{Endpoints, PhotoApi, PhotoSource};
pub use config::GalleryConfig;
pub use error::{ConfigError, FetchError, GalleryError, PageError};
pub use fetcher::{decode_listing, ListingShape, RemoteFetcher};
pub use gallery::Gallery;
pub use images::ImageLoader;
pub use paged::{Page, PageSource, PagedModel};
pub use photo::{ImageSize, Photo};
pub use request::FetchRequest;
pub use snapshot::SnapshotStore;
pub use transport::{HttpTransport, Transport};
