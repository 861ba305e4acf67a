//! Request fingerprints used as cache keys.

use sha2::{Digest, Sha256};

/// Derives the cache key for a resize of `url` to `width`x`height`.
///
/// Dimensions are hashed in their parsed form, so `0100` and `100` share a key.
pub fn fingerprint(url: &str, width: u32, height: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(width.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(height.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 digest of an encoded image, served as its ETag.
pub fn content_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
