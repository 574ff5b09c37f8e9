//! Content identifiers.

use sha2::{Digest as _, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
///
/// Equal bytes always give equal identifiers; images that merely look alike
/// do not.
pub fn content_id(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
