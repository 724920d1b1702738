use std::fmt;

use sha2::{Digest, Sha256};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// A stable identifier for a cached resource.
///
/// The key is the lowercase hex SHA-256 digest of the resource locator
/// (usually a URL), so equal locators always map to the same key and the
/// key can be used verbatim as a file name on any filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
  /// Derives the key for a resource locator.
  pub fn from_locator(locator: &str) -> Self {
    let digest = Sha256::digest(locator.as_bytes());
    Self(hex(&digest))
  }

  /// Returns the 64 character hex form of the key.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The name of the file holding this key's entry inside a disk store.
  pub(crate) fn file_name(&self) -> String {
    format!("{}.bin", self.0)
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for CacheKey {
  fn from(locator: &str) -> Self {
    Self::from_locator(locator)
  }
}

impl From<&String> for CacheKey {
  fn from(locator: &String) -> Self {
    Self::from_locator(locator)
  }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len() * 2);
  for &b in bytes {
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0f) as usize] as char);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_locator_same_key() {
    let a = CacheKey::from_locator("https://images.example.com/photo-1?w=200");
    let b = CacheKey::from_locator("https://images.example.com/photo-1?w=200");
    assert_eq!(a, b);
  }

  #[test]
  fn distinct_locators_do_not_collide_after_separator_mapping() {
    // A naive "/" -> "_" mapping would make these two equal.
    let a = CacheKey::from_locator("https://a.example.com/x_y");
    let b = CacheKey::from_locator("https://a.example.com/x/y");
    assert_ne!(a, b);
  }

  #[test]
  fn key_is_filesystem_safe() {
    let key = CacheKey::from_locator("https://a.example.com/../../etc/passwd?q=a b&c=\\");
    assert_eq!(key.as_str().len(), 64);
    assert!(key.as_str().bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    assert_eq!(key.file_name(), format!("{}.bin", key));
  }

  #[test]
  fn known_digest() {
    assert_eq!(
      CacheKey::from_locator("abc").as_str(),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }
}
