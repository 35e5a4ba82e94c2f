use bob_types::ArtifactHash;
use sha2::{Digest, Sha256};

/// SHA-256 hasher producing [`ArtifactHash`] values.
///
/// No domain separation is applied: the digest must match what a client
/// computes over the file it uploads (`sha256sum bundle.zip`).
#[derive(Clone, Default)]
pub struct BundleHasher {
    inner: Sha256,
}

impl BundleHasher {
    /// Start an incremental hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes into the hash.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> ArtifactHash {
        ArtifactHash::from_digest(self.inner.finalize().into())
    }

    /// Hash a complete buffer.
    pub fn digest(data: &[u8]) -> ArtifactHash {
        ArtifactHash::from_digest(Sha256::digest(data).into())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(data: &[u8], expected: &ArtifactHash) -> bool {
        Self::digest(data) == *expected
    }

    /// Check a caller-declared hex digest against the bytes it claims to
    /// describe, returning the verified hash.
    ///
    /// The declaration is trimmed and compared case-insensitively. A value
    /// that is not a 64-character hex digest can never match and is
    /// reported as [`HashError::Malformed`].
    pub fn verify_declared(data: &[u8], declared: &str) -> Result<ArtifactHash, HashError> {
        let declared = declared.trim();
        let expected = ArtifactHash::from_hex(declared).map_err(|e| HashError::Malformed {
            declared: declared.to_string(),
            reason: e.to_string(),
        })?;
        let computed = Self::digest(data);
        if computed != expected {
            return Err(HashError::Mismatch {
                declared: expected.to_hex(),
                computed: computed.to_hex(),
            });
        }
        Ok(computed)
    }
}

/// Errors from declared-hash verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("hash mismatch: declared {declared}, computed {computed}")]
    Mismatch { declared: String, computed: String },

    #[error("declared hash {declared:?} is not a SHA-256 hex digest: {reason}")]
    Malformed { declared: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello world")
    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(BundleHasher::digest(b"hello world").to_hex(), HELLO_WORLD);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = BundleHasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), BundleHasher::digest(b"hello world"));
    }

    #[test]
    fn verify_correct_data() {
        let id = BundleHasher::digest(b"bundle");
        assert!(BundleHasher::verify(b"bundle", &id));
        assert!(!BundleHasher::verify(b"bundle!", &id));
    }

    #[test]
    fn declared_hash_accepts_case_and_whitespace() {
        let declared = format!("  {}\n", HELLO_WORLD.to_uppercase());
        let hash = BundleHasher::verify_declared(b"hello world", &declared).unwrap();
        assert_eq!(hash.to_hex(), HELLO_WORLD);
    }

    #[test]
    fn declared_hash_mismatch() {
        let err = BundleHasher::verify_declared(b"hello world!", HELLO_WORLD).unwrap_err();
        match err {
            HashError::Mismatch { declared, computed } => {
                assert_eq!(declared, HELLO_WORLD);
                assert_ne!(computed, HELLO_WORLD);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_declaration() {
        let err = BundleHasher::verify_declared(b"x", "sha256:abc").unwrap_err();
        assert!(matches!(err, HashError::Malformed { .. }));
    }

    #[test]
    fn one_flipped_byte_changes_the_hash() {
        let mut data = b"some bundle bytes".to_vec();
        let before = BundleHasher::digest(&data);
        data[3] ^= 0x01;
        assert_ne!(before, BundleHasher::digest(&data));
    }
}
