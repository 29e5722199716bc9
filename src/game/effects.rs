//! Economy and Effects
//!
//! The only code allowed to move resources or union stats. Every change
//! goes through a clamping helper, so no delta, however large, can push a
//! value out of its declared bounds.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{CrackConfig, UpkeepConfig};
use crate::core::rng::DeterministicRng;
use crate::game::events::RunEventKind;
use crate::game::odds::crack_risk;
use crate::game::selectors;
use crate::game::state::{Resource, Resources, RunState, UnionId, UnionStats, STAT_MAX};

// =============================================================================
// DELTAS
// =============================================================================

/// A bundle of signed resource changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDelta {
    /// Paperwork change
    pub paperwork: i32,
    /// Patronage change
    pub patronage: i32,
    /// Legitimacy change
    pub legitimacy: i32,
    /// Audit risk change
    pub audit_risk: i32,
    /// Street heat change
    pub street_heat: i32,
}

impl ResourceDelta {
    /// Delta touching a single resource.
    pub fn single(resource: Resource, amount: i32) -> Self {
        let mut delta = Self::default();
        *delta.slot_mut(resource) = amount;
        delta
    }

    /// Read one component.
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Paperwork => self.paperwork,
            Resource::Patronage => self.patronage,
            Resource::Legitimacy => self.legitimacy,
            Resource::AuditRisk => self.audit_risk,
            Resource::StreetHeat => self.street_heat,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Paperwork => &mut self.paperwork,
            Resource::Patronage => &mut self.patronage,
            Resource::Legitimacy => &mut self.legitimacy,
            Resource::AuditRisk => &mut self.audit_risk,
            Resource::StreetHeat => &mut self.street_heat,
        }
    }

    /// Component-wise sum.
    pub fn combine(mut self, other: ResourceDelta) -> Self {
        for resource in Resource::ALL {
            let slot = self.slot_mut(resource);
            *slot = slot.saturating_add(other.get(resource));
        }
        self
    }

    /// Does this delta change nothing?
    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|r| self.get(*r) == 0)
    }
}

/// A bundle of signed union stat changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDelta {
    /// Plausibility change
    pub plausibility: i32,
    /// Loyalty change
    pub loyalty: i32,
    /// Integrity change
    pub integrity: i32,
}

// =============================================================================
// CLAMPING
// =============================================================================

#[inline]
fn clamp_add(value: i32, delta: i32, max: i32) -> i32 {
    value.saturating_add(delta).clamp(0, max)
}

/// Apply a resource delta, clamping every resource into its bounds.
pub fn apply_resources(resources: &Resources, delta: &ResourceDelta) -> Resources {
    let mut next = *resources;
    for resource in Resource::ALL {
        let slot = next.slot_mut(resource);
        *slot = clamp_add(*slot, delta.get(resource), resource.max());
    }
    next
}

/// Apply a single-resource change, clamped.
pub fn adjust(resources: &Resources, resource: Resource, amount: i32) -> Resources {
    apply_resources(resources, &ResourceDelta::single(resource, amount))
}

/// Apply a stat delta, clamping every stat into 0-100.
pub fn apply_stats(stats: &UnionStats, delta: &StatDelta) -> UnionStats {
    UnionStats {
        plausibility: clamp_add(stats.plausibility, delta.plausibility, STAT_MAX),
        loyalty: clamp_add(stats.loyalty, delta.loyalty, STAT_MAX),
        integrity: clamp_add(stats.integrity, delta.integrity, STAT_MAX),
    }
}

/// Can the current resources cover this cost?
pub fn can_afford(resources: &Resources, resource: Resource, cost: i32) -> bool {
    resources.get(resource) >= cost
}

// =============================================================================
// UPKEEP
// =============================================================================

/// Per-cycle upkeep deltas. Pure function of the state; no randomness.
///
/// - audit risk: +1 per `unions_per_audit_point` unions, per federation,
///   and per shell union. Cracked unions stay on the record and count.
/// - paperwork: refill to target
/// - patronage: base + per recognized delegate, less maintenance only when
///   `charge_maintenance` is set
/// - street heat: fixed decay while positive
/// - legitimacy: decays once shell count exceeds the threshold
pub fn upkeep(state: &RunState, config: &UpkeepConfig) -> ResourceDelta {
    let unions = state.unions.len() as u32;
    let shells = selectors::shell_count(state) as u32;
    let federations = state.federations.len() as i32;
    let recognized_delegates: u32 = state
        .federations
        .values()
        .filter(|f| f.is_recognized())
        .map(|f| f.delegates)
        .sum();

    let per_point = config.unions_per_audit_point.max(1);
    let audit_risk = (unions / per_point) as i32
        + federations * config.audit_per_federation
        + shells as i32 * config.audit_per_shell;

    let paperwork = (config.paperwork_target - state.resources.paperwork).max(0);

    let maintenance = if config.charge_maintenance {
        selectors::total_maintenance(state) as i32
    } else {
        0
    };
    let patronage =
        config.patronage_base + recognized_delegates as i32 * config.patronage_per_delegate - maintenance;

    let street_heat = if state.resources.street_heat > 0 {
        -config.street_heat_decay
    } else {
        0
    };

    let legitimacy = if shells > config.shell_threshold {
        -((shells - config.shell_threshold) as i32 * config.legitimacy_per_excess_shell)
    } else {
        0
    };

    ResourceDelta {
        paperwork,
        patronage,
        legitimacy,
        audit_risk,
        street_heat,
    }
}

// =============================================================================
// CRACKING
// =============================================================================

/// Roll each licensed, intact union against its crack risk.
///
/// Cracked unions lose their license and cost legitimacy and audit risk.
/// Unions are visited in ID order, one roll each.
pub fn crack_checks(state: &mut RunState, rng: &mut DeterministicRng, config: &CrackConfig) -> Vec<UnionId> {
    let candidates: Vec<(UnionId, u32)> = state
        .unions
        .values()
        .filter(|u| u.is_licensed && !u.is_cracked)
        .map(|u| (u.id, crack_risk(&u.stats)))
        .collect();

    let mut cracked = Vec::new();
    for (id, risk) in candidates {
        let roll = rng.roll_percent();
        if roll > risk {
            continue;
        }

        if let Some(union) = state.unions.get_mut(&id) {
            union.is_cracked = true;
            union.is_licensed = false;
        }
        let penalty = ResourceDelta {
            legitimacy: -config.legitimacy_penalty,
            audit_risk: config.audit_penalty,
            ..ResourceDelta::default()
        };
        state.resources = apply_resources(&state.resources, &penalty);
        state.record(RunEventKind::UnionCracked { union: id, roll, risk });
        info!("{} cracked (roll {} <= risk {})", id, roll, risk);
        cracked.push(id);
    }
    cracked
}

// =============================================================================
// LOSS CONDITIONS
// =============================================================================

/// A resource bound that ends the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCondition {
    /// Legitimacy hit zero.
    LegitimacyExhausted,
    /// Audit risk hit 100.
    AuditTriggered,
    /// Street heat hit 100.
    StreetRevolt,
}

/// First violated bound, if any.
pub fn check_loss(resources: &Resources) -> Option<LossCondition> {
    if resources.legitimacy <= 0 {
        Some(LossCondition::LegitimacyExhausted)
    } else if resources.audit_risk >= Resource::AuditRisk.max() {
        Some(LossCondition::AuditTriggered)
    } else if resources.street_heat >= Resource::StreetHeat.max() {
        Some(LossCondition::StreetRevolt)
    } else {
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::game::state::{
        Archetype, Federation, FederationId, Recognition, Union, GAUGE_MAX, PAPERWORK_MAX, PATRONAGE_MAX,
    };
    use proptest::prelude::*;

    fn add_union(state: &mut RunState, archetype: Archetype, stats: UnionStats, cost: u32) -> UnionId {
        let id = state.allocate_union_id();
        state.unions.insert(id, Union::new(id, "Test Local", "Docks", archetype, stats, cost));
        id
    }

    #[test]
    fn test_apply_resources_clamps_both_ends() {
        let r = Resources::new(5, 5, 50, 50, 50);
        let up = apply_resources(
            &r,
            &ResourceDelta { paperwork: 100, patronage: 100, legitimacy: 100, audit_risk: 100, street_heat: 100 },
        );
        assert_eq!(up, Resources::new(PAPERWORK_MAX, PATRONAGE_MAX, GAUGE_MAX, GAUGE_MAX, GAUGE_MAX));

        let down = apply_resources(
            &r,
            &ResourceDelta { paperwork: -100, patronage: -100, legitimacy: -100, audit_risk: -100, street_heat: -100 },
        );
        assert_eq!(down, Resources::new(0, 0, 0, 0, 0));
    }

    #[test]
    fn test_combine() {
        let a = ResourceDelta::single(Resource::Legitimacy, -3);
        let b = ResourceDelta { legitimacy: 1, audit_risk: 2, ..Default::default() };
        let c = a.combine(b);
        assert_eq!(c.legitimacy, -2);
        assert_eq!(c.audit_risk, 2);
        assert!(!c.is_empty());
        assert!(ResourceDelta::default().is_empty());
    }

    #[test]
    fn test_upkeep_empty_run() {
        let config = RunConfig::default();
        let mut state = RunState::start(1, &config);
        state.resources = Resources::new(2, 0, 50, 10, 3);

        let delta = upkeep(&state, &config.upkeep);
        assert_eq!(delta.paperwork, 4);
        assert_eq!(delta.patronage, 1);
        assert_eq!(delta.audit_risk, 0);
        assert_eq!(delta.street_heat, -5);
        assert_eq!(delta.legitimacy, 0);

        // Refill never drains
        state.resources = Resources::new(9, 0, 50, 10, 0);
        let delta = upkeep(&state, &config.upkeep);
        assert_eq!(delta.paperwork, 0);
        assert_eq!(delta.street_heat, 0);
    }

    #[test]
    fn test_upkeep_taxes_shells_and_pays_delegates() {
        let config = RunConfig::default();
        let mut state = RunState::start(1, &config);
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(add_union(&mut state, Archetype::Shell, UnionStats::new(90, 90, 10), 0));
        }
        ids.push(add_union(&mut state, Archetype::Authentic, UnionStats::new(20, 20, 90), 3));
        state.federations.insert(
            FederationId(1),
            Federation {
                id: FederationId(1),
                name: "Paper Front".into(),
                members: vec![ids[0], ids[1]],
                delegates: 2,
                recognition: Recognition::Recognized,
                visibility: 30,
            },
        );
        state.federations.insert(
            FederationId(2),
            Federation {
                id: FederationId(2),
                name: "Ghost Front".into(),
                members: vec![ids[2], ids[3]],
                delegates: 2,
                recognition: Recognition::Unrecognized,
                visibility: 30,
            },
        );

        let delta = upkeep(&state, &config.upkeep);
        // 5 unions / 5 = 1, 2 federations, 4 shells
        assert_eq!(delta.audit_risk, 1 + 2 + 4);
        // base 1 + 2 recognized delegates; maintenance is not charged
        assert_eq!(delta.patronage, 1 + 2);
        // 4 shells, threshold 2, 2 per excess
        assert_eq!(delta.legitimacy, -4);
    }

    #[test]
    fn test_upkeep_patronage_is_pure_income() {
        let config = RunConfig::default();
        let mut state = RunState::start(1, &config);
        add_union(&mut state, Archetype::Authentic, UnionStats::new(20, 20, 90), 3);

        assert_eq!(upkeep(&state, &config.upkeep).patronage, 1);

        let charged = UpkeepConfig {
            charge_maintenance: true,
            ..config.upkeep.clone()
        };
        assert_eq!(upkeep(&state, &charged).patronage, 1 - 3);
    }

    #[test]
    fn test_cracked_unions_still_count() {
        let config = RunConfig::default();
        let mut state = RunState::start(1, &config);
        for _ in 0..5 {
            let id = add_union(&mut state, Archetype::Shell, UnionStats::new(90, 90, 10), 0);
            state.unions.get_mut(&id).unwrap().is_cracked = true;
        }

        let delta = upkeep(&state, &config.upkeep);
        // 5 unions / 5 = 1, plus 5 shells
        assert_eq!(delta.audit_risk, 1 + 5);
        // 5 shells, threshold 2, 2 per excess
        assert_eq!(delta.legitimacy, -6);
    }

    #[test]
    fn test_crack_checks_only_touch_licensed_unions() {
        let config = RunConfig::default();
        let mut state = RunState::start(99, &config);
        // Zero integrity: 40% risk each cycle
        let licensed = add_union(&mut state, Archetype::Shell, UnionStats::new(90, 90, 0), 0);
        let unlicensed = add_union(&mut state, Archetype::Shell, UnionStats::new(90, 90, 0), 0);
        state.unions.get_mut(&licensed).unwrap().is_licensed = true;

        let mut rng = state.rng();
        let mut cracked = Vec::new();
        for _ in 0..50 {
            cracked.extend(crack_checks(&mut state, &mut rng, &config.crack));
        }

        assert_eq!(cracked, vec![licensed]);
        let union = &state.unions[&licensed];
        assert!(union.is_cracked);
        assert!(!union.is_licensed);
        assert!(!state.unions[&unlicensed].is_cracked);
        assert_eq!(state.resources.legitimacy(), 60 - 5);
        assert_eq!(state.resources.audit_risk(), 10 + 5);
    }

    #[test]
    fn test_check_loss() {
        assert_eq!(check_loss(&Resources::new(5, 5, 50, 50, 50)), None);
        assert_eq!(check_loss(&Resources::new(5, 5, 0, 50, 50)), Some(LossCondition::LegitimacyExhausted));
        assert_eq!(check_loss(&Resources::new(5, 5, 50, 100, 50)), Some(LossCondition::AuditTriggered));
        assert_eq!(check_loss(&Resources::new(5, 5, 50, 50, 100)), Some(LossCondition::StreetRevolt));
    }

    proptest! {
        #[test]
        fn prop_resources_always_in_bounds(
            start in prop::array::uniform5(-50i32..200),
            delta in prop::array::uniform5(any::<i32>()),
        ) {
            let resources = Resources::new(start[0], start[1], start[2], start[3], start[4]);
            let delta = ResourceDelta {
                paperwork: delta[0],
                patronage: delta[1],
                legitimacy: delta[2],
                audit_risk: delta[3],
                street_heat: delta[4],
            };
            let next = apply_resources(&resources, &delta);
            for resource in Resource::ALL {
                let value = next.get(resource);
                prop_assert!((0..=resource.max()).contains(&value));
            }
        }

        #[test]
        fn prop_stats_always_in_bounds(
            start in prop::array::uniform3(-50i32..200),
            delta in prop::array::uniform3(any::<i32>()),
        ) {
            let stats = UnionStats::new(start[0], start[1], start[2]);
            let next = apply_stats(&stats, &StatDelta {
                plausibility: delta[0],
                loyalty: delta[1],
                integrity: delta[2],
            });
            for value in [next.plausibility(), next.loyalty(), next.integrity()] {
                prop_assert!((0..=STAT_MAX).contains(&value));
            }
        }
    }
}
