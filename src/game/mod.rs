//! Game Logic Module
//!
//! All run simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `state`: Run state, unions, federations
//! - `action`: Tagged actions accepted by the reducer
//! - `reducer`: The single `(state, action) -> state` transition
//! - `generator`: Procedural unions and federation names
//! - `odds`: Stat-to-probability formulas
//! - `effects`: Clamped deltas, upkeep, crack checks, loss conditions
//! - `gate`: Condition filtering and weighted event draws
//! - `election`: Delegate count at the end of the run
//! - `selectors`: Derived read-only views
//! - `events`: Run journal for display and replay inspection

pub mod action;
pub mod effects;
pub mod election;
pub mod events;
pub mod gate;
pub mod generator;
pub mod odds;
pub mod reducer;
pub mod selectors;
pub mod state;

// Re-export key types
pub use action::Action;
pub use effects::{LossCondition, ResourceDelta, StatDelta};
pub use election::{ElectionReport, FederationTally};
pub use events::{RunEvent, RunEventKind};
pub use reducer::{license_with_roll, reduce, replay, Rejection};
pub use state::{
    Archetype, Ending, Federation, FederationId, IncubationMode, Recognition, Resource, Resources, RunPhase,
    RunState, Union, UnionId, UnionStats,
};
