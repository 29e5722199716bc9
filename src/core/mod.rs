//! Core deterministic primitives.
//!
//! Everything here is bit-reproducible from its inputs. The RNG cursor is
//! the only piece of state threaded between reducer calls.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{compute_state_hash, StateHash, StateHasher};
pub use rng::{DeterministicRng, RngError};
