//! Election Resolution
//!
//! Turns nominal delegates into secured ones. Every recognized federation
//! rolls once per delegate against the floored average loyalty of its
//! members. The election uses its own stream, derived from the main
//! cursor by a fixed offset, so the gameplay cursor is left untouched.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RunConfig;
use crate::core::rng::DeterministicRng;
use crate::game::odds::average_loyalty;
use crate::game::state::{Ending, FederationId, RunState};

/// One federation's line in the count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationTally {
    /// Federation ID
    pub id: FederationId,
    /// Display name
    pub name: String,
    /// Floored average member loyalty, used as the per-delegate chance
    pub average_loyalty: u32,
    /// Delegates that showed up and voted as told
    pub secured: u32,
    /// Nominal delegates
    pub delegates: u32,
}

/// Outcome of the election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionReport {
    /// Per-federation tallies, in ID order
    pub federations: Vec<FederationTally>,
    /// Delegates on paper: recognized federations × 2
    pub expected: u32,
    /// Delegates actually secured
    pub secured: u32,
    /// Secured delegates needed for capture
    pub threshold: u32,
    /// Capture or collapse
    pub ending: Ending,
}

impl ElectionReport {
    /// Delegates that were promised but did not turn up.
    pub fn lost(&self) -> u32 {
        self.expected.saturating_sub(self.secured)
    }
}

/// Count the vote.
///
/// Pure in `state`: the election stream is derived from `rng_cursor` and
/// never written back.
pub fn resolve_election(state: &RunState, config: &RunConfig) -> ElectionReport {
    let mut rng = DeterministicRng::from_cursor(state.rng_cursor).derive(config.run.election_stream_offset);
    let threshold = config.run.delegate_threshold;

    let mut federations = Vec::new();
    for federation in state.federations.values().filter(|f| f.is_recognized()) {
        let chance = average_loyalty(federation.members.iter().filter_map(|m| state.union(*m)));
        let secured = (0..federation.delegates)
            .filter(|_| rng.roll_percent() <= chance)
            .count() as u32;

        federations.push(FederationTally {
            id: federation.id,
            name: federation.name.clone(),
            average_loyalty: chance,
            secured,
            delegates: federation.delegates,
        });
    }

    let expected = federations.iter().map(|t| t.delegates).sum();
    let secured = federations.iter().map(|t| t.secured).sum();
    let ending = if secured >= threshold {
        Ending::Capture
    } else {
        Ending::Collapse
    };

    info!(
        "election: {}/{} delegates secured (threshold {}) -> {:?}",
        secured, expected, threshold, ending
    );

    ElectionReport {
        federations,
        expected,
        secured,
        threshold,
        ending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::odds::DELEGATES_PER_FEDERATION;
    use crate::game::state::{Archetype, Federation, Recognition, Union, UnionId, UnionStats};

    fn with_federations(seed: u32, loyalties: &[(i32, i32)]) -> RunState {
        let mut state = RunState::start(seed, &RunConfig::default());
        for (a, b) in loyalties {
            let mut members = Vec::new();
            for loyalty in [*a, *b] {
                let id = state.allocate_union_id();
                let mut union = Union::new(id, "Local", "Docks", Archetype::Shell, UnionStats::new(90, loyalty, 10), 0);
                union.is_licensed = true;
                state.unions.insert(id, union);
                members.push(id);
            }
            let id = state.allocate_federation_id();
            state.federations.insert(
                id,
                Federation {
                    id,
                    name: format!("Front {}", id.0),
                    members,
                    delegates: DELEGATES_PER_FEDERATION,
                    recognition: Recognition::Recognized,
                    visibility: 40,
                },
            );
        }
        state
    }

    #[test]
    fn test_full_loyalty_always_secures() {
        let config = RunConfig::default();
        for seed in 0..50 {
            let state = with_federations(seed, &[(100, 100)]);
            let report = resolve_election(&state, &config);
            assert_eq!(report.secured, 2);
            assert_eq!(report.expected, 2);
            assert_eq!(report.ending, Ending::Collapse);
        }
    }

    #[test]
    fn test_zero_loyalty_never_secures() {
        let config = RunConfig::default();
        for seed in 0..50 {
            let state = with_federations(seed, &[(0, 0); 6]);
            let report = resolve_election(&state, &config);
            assert_eq!(report.expected, 12);
            assert_eq!(report.secured, 0);
            assert_eq!(report.lost(), 12);
            assert_eq!(report.ending, Ending::Collapse);
        }
    }

    #[test]
    fn test_capture_at_threshold() {
        let state = with_federations(1, &[(100, 100); 3]);
        let report = resolve_election(&state, &RunConfig::default());
        assert_eq!(report.secured, 6);
        assert_eq!(report.threshold, 6);
        assert_eq!(report.ending, Ending::Capture);
    }

    #[test]
    fn test_unrecognized_and_cracked() {
        let mut state = with_federations(4, &[(100, 100), (100, 100)]);
        state.federations.get_mut(&FederationId(2)).unwrap().recognition = Recognition::Unrecognized;
        state.unions.get_mut(&UnionId(1)).unwrap().is_cracked = true;

        let report = resolve_election(&state, &RunConfig::default());
        assert_eq!(report.federations.len(), 1);
        assert_eq!(report.expected, 2);
        // Cracked member counts as zero loyalty
        assert_eq!(report.federations[0].average_loyalty, 50);
    }

    #[test]
    fn test_election_leaves_cursor_alone_and_repeats() {
        let state = with_federations(42, &[(60, 40), (70, 70), (55, 65)]);
        let config = RunConfig::default();
        let before = state.clone();

        let first = resolve_election(&state, &config);
        let second = resolve_election(&state, &config);
        assert_eq!(first, second);
        assert_eq!(state, before);
    }

    #[test]
    fn test_stream_differs_from_gameplay_stream() {
        let config = RunConfig::default();
        let mut gameplay = DeterministicRng::from_cursor(42);
        let mut election = DeterministicRng::from_cursor(42).derive(config.run.election_stream_offset);
        let a: Vec<u32> = (0..8).map(|_| gameplay.roll_percent()).collect();
        let b: Vec<u32> = (0..8).map(|_| election.roll_percent()).collect();
        assert_ne!(a, b);
    }
}
