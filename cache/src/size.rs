use serde::Serialize;

/// Size reported for values that cannot be serialized.
pub(crate) const FALLBACK_ENTRY_SIZE: u64 = 1024;

/// Approximates the memory held by a value with its serialized JSON length.
///
/// Only used for reporting; it never influences eviction.
pub(crate) fn estimate_size<V: Serialize>(value: &V) -> u64 {
  match serde_json::to_vec(value) {
    Ok(bytes) => bytes.len() as u64,
    Err(_) => FALLBACK_ENTRY_SIZE,
  }
}
