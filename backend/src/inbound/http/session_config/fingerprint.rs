//! Session key fingerprint for operators.
//!
//! The gateway logs a short digest of the signing key at startup so a
//! deployment can be matched to the key it was given without revealing key
//! material.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Bytes of the digest kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of SHA-256 over the key's signing half, lowercase hex.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use gateway::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.get(..FINGERPRINT_BYTES).unwrap_or_default())
}
