//! Derived Views
//!
//! Read-only projections of the run state for the presentation shell and
//! for the rules that need a count.

use crate::game::effects::{check_loss, LossCondition};
use crate::game::odds;
use crate::game::state::{FederationId, RunState, Union, UnionId};

/// Nominal delegates held by recognized federations.
pub fn total_delegates(state: &RunState) -> u32 {
    state
        .federations
        .values()
        .filter(|f| f.is_recognized())
        .map(|f| f.delegates)
        .sum()
}

/// Unions that can still be federated: licensed, intact, unassigned.
pub fn available_unions(state: &RunState) -> Vec<&Union> {
    state
        .unions
        .values()
        .filter(|u| u.is_licensed && !u.is_cracked && state.federation_of(u.id).is_none())
        .collect()
}

/// Patronage drained per cycle by unions still on the books.
pub fn total_maintenance(state: &RunState) -> u32 {
    state
        .unions
        .values()
        .filter(|u| !u.is_cracked)
        .map(|u| u.maintenance_cost)
        .sum()
}

/// Resource bound currently violated, if any.
pub fn active_loss(state: &RunState) -> Option<LossCondition> {
    check_loss(&state.resources)
}

/// Shell unions on the record, cracked ones included.
pub fn shell_count(state: &RunState) -> usize {
    state.unions.values().filter(|u| u.is_shell()).count()
}

/// Unions on the books, cracked ones excluded.
pub fn active_union_count(state: &RunState) -> usize {
    state.unions.values().filter(|u| !u.is_cracked).count()
}

/// Licensed unions.
pub fn licensed_count(state: &RunState) -> usize {
    state.unions.values().filter(|u| u.is_licensed).count()
}

/// Cracked unions.
pub fn cracked_count(state: &RunState) -> usize {
    state.unions.values().filter(|u| u.is_cracked).count()
}

/// Expected secured delegates (out of two) for one union.
pub fn union_reliability(state: &RunState, id: UnionId) -> Option<f64> {
    state.union(id).map(|u| odds::union_reliability(&u.stats))
}

/// Expected secured delegates (out of two) for one federation, from the
/// current state of its members.
pub fn federation_reliability(state: &RunState, id: FederationId) -> Option<f64> {
    let federation = state.federations.get(&id)?;
    Some(odds::federation_reliability(
        federation.members.iter().filter_map(|m| state.union(*m)),
    ))
}

/// Expected secured delegates across all recognized federations.
pub fn expected_secured(state: &RunState) -> f64 {
    state
        .federations
        .values()
        .filter(|f| f.is_recognized())
        .filter_map(|f| federation_reliability(state, f.id))
        .sum()
}
