use serde::{Deserialize, Serialize};

/// One photo in a listing.
///
/// Width and height are always present: layout consumers size cells before
/// any image bytes arrive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Photo {
  identifier: String,
  title: String,
  thumb_url: String,
  full_url: String,
  width: u32,
  height: u32,
}

/// Which of a photo's images to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
  Thumbnail,
  Full,
}

impl Photo {
  pub fn new(
    identifier: impl Into<String>,
    title: impl Into<String>,
    thumb_url: impl Into<String>,
    full_url: impl Into<String>,
    width: u32,
    height: u32,
  ) -> Self {
    Self {
      identifier: identifier.into(),
      title: title.into(),
      thumb_url: thumb_url.into(),
      full_url: full_url.into(),
      width,
      height,
    }
  }

  /// Unique per source.
  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  /// The author's display name.
  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn thumb_url(&self) -> &str {
    &self.thumb_url
  }

  pub fn full_url(&self) -> &str {
    &self.full_url
  }

  pub fn url(&self, size: ImageSize) -> &str {
    match size {
      ImageSize::Thumbnail => &self.thumb_url,
      ImageSize::Full => &self.full_url,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// Height over width, the factor a waterfall column scales by.
  pub fn aspect_ratio(&self) -> Option<f64> {
    if self.width == 0 {
      None
    } else {
      Some(f64::from(self.height) / f64::from(self.width))
    }
  }
}
