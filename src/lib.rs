//! # Paper Federation
//!
//! Deterministic simulation core for Paper Federation, a short satirical
//! game about turning paper unions into congress delegates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PAPER FEDERATION                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - mulberry32 float stream with cursor       │
//! │  └── hash.rs     - State hashing for replay verification     │
//! │                                                              │
//! │  game/           - Run rules (deterministic)                 │
//! │  ├── state.rs    - Run state, unions, federations            │
//! │  ├── action.rs   - Tagged actions                            │
//! │  ├── reducer.rs  - (state, action) -> state                  │
//! │  ├── generator.rs- Procedural unions and names               │
//! │  ├── odds.rs     - Stat-to-probability formulas              │
//! │  ├── effects.rs  - Clamping, upkeep, cracks, loss checks     │
//! │  ├── gate.rs     - Event eligibility and weighted draws      │
//! │  ├── election.rs - Delegate count                            │
//! │  ├── selectors.rs- Derived views                             │
//! │  └── events.rs   - Run journal                               │
//! │                                                              │
//! │  content/        - Event, footnote, name-table loading       │
//! │  config.rs       - Tuning (TOML)                             │
//! │  persistence.rs  - Versioned saves (non-deterministic I/O)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the seeded generator, threaded through the run
//!   state as a single `u32` cursor
//!
//! Given the same seed, content, tuning and action sequence, a run
//! reaches the same state hash on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod content;
pub mod core;
pub mod game;
pub mod persistence;

// Re-export commonly used types
pub use config::RunConfig;
pub use content::{Content, ValidationMode};
pub use core::rng::DeterministicRng;
pub use game::{reduce, replay, Action, Ending, RunPhase, RunState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cycles before the election.
pub const DEFAULT_MAX_CYCLES: u32 = 5;

/// Secured delegates needed for capture.
pub const DELEGATE_THRESHOLD: u32 = 6;
