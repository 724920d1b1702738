use bytes::Bytes;

/// Turns raw fetched or persisted bytes into the value held in memory.
///
/// The raw bytes are what gets written to disk; the decoded value is what
/// callers receive. A `None` from `decode` is treated exactly like a miss at
/// the tier that produced the bytes.
pub trait Codec<V>: Send + Sync + 'static {
  fn decode(&self, bytes: &Bytes) -> Option<V>;

  /// The memory-tier cost of a decoded value.
  fn cost(&self, value: &V) -> u64;
}

/// Keeps values as the raw bytes; cost is the byte length.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Bytes> for BytesCodec {
  fn decode(&self, bytes: &Bytes) -> Option<Bytes> {
    if bytes.is_empty() {
      None
    } else {
      Some(bytes.clone())
    }
  }

  fn cost(&self, value: &Bytes) -> u64 {
    value.len() as u64
  }
}

impl<V, D, C> Codec<V> for (D, C)
where
  D: Fn(&Bytes) -> Option<V> + Send + Sync + 'static,
  C: Fn(&V) -> u64 + Send + Sync + 'static,
{
  fn decode(&self, bytes: &Bytes) -> Option<V> {
    (self.0)(bytes)
  }

  fn cost(&self, value: &V) -> u64 {
    (self.1)(value)
  }
}
