//! Run State Hashing
//!
//! Deterministic SHA-256 digests of run state, used to check that a
//! replayed action log reproduces the exact same run and that a save
//! restores what was written.

use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for run state.
///
/// Wraps SHA-256 with typed helpers. Order of updates is part of the
/// hash, so callers must walk state in a fixed order.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for run state.
    pub fn for_run_state() -> Self {
        Self::new(b"PAPER_FEDERATION_RUN_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    ///
    /// The prefix keeps `("ab", "c")` and `("a", "bc")` apart.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute state hash for run verification.
///
/// Called by `RunState::compute_hash()`. The closure adds the
/// run-specific fields after the header.
pub fn compute_state_hash<F>(seed: u32, cursor: u32, cycle: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_run_state();

    // Always hash the RNG position and cycle first
    hasher.update_u32(seed);
    hasher.update_u32(cursor);
    hasher.update_u32(cycle);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_run_state();
            hasher.update_u32(100);
            hasher.update_i32(-5);
            hasher.update_str("Amalgamated Paper Workers");
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_boundaries_matter() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };
        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(b"DOMAIN_A", &data);
        let hash2 = hash_with_domain(b"DOMAIN_B", &data);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(42, 1000, 3, |hasher| {
            hasher.update_i32(55);
            hasher.update_bool(true);
        });
        let hash2 = compute_state_hash(42, 1000, 3, |hasher| {
            hasher.update_i32(55);
            hasher.update_bool(true);
        });
        assert_eq!(hash, hash2);

        // Different cursor = different hash
        let hash3 = compute_state_hash(42, 1001, 3, |hasher| {
            hasher.update_i32(55);
            hasher.update_bool(true);
        });
        assert_ne!(hash, hash3);
    }
}
