//! Content-based keys for deduplicating binary payloads.

use md5::{Digest, Md5};

/// 128-bit digest of a byte payload.
pub type ContentDigest = [u8; 16];

/// Compute the MD5 digest of `data`.
#[inline]
pub fn compute_digest(data: &[u8]) -> ContentDigest {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Content key: digest plus length, so equal digests of different
/// sizes never collide.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct ContentKey {
    pub digest: ContentDigest,
    pub size: usize,
}

impl ContentKey {
    /// Create a new content key from data.
    pub fn from_data(data: &[u8]) -> Self {
        Self {
            digest: compute_digest(data),
            size: data.len(),
        }
    }

    /// Mix a discriminator (element type, mime type, ...) into the key.
    pub fn with_tag(data: &[u8], tag: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(tag.as_bytes());
        hasher.update([0u8]);
        hasher.update(data);
        Self {
            digest: hasher.finalize().into(),
            size: data.len(),
        }
    }
}
