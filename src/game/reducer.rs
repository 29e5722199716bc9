//! Run Reducer
//!
//! The single transition function of the simulation:
//! `(state, action) -> state`.
//!
//! # Determinism
//!
//! - The generator is rebuilt from `state.rng_cursor` and its position is
//!   written back after every transition that draws
//! - Unions and federations live in BTreeMaps, so every pass visits them
//!   in ID order
//! - No clocks, no I/O, no ambient state
//!
//! Illegal actions are no-ops: the original state is returned and the
//! reason is only logged at `debug`.

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::content::Content;
use crate::core::rng::RngError;
use crate::game::action::Action;
use crate::game::effects::{apply_resources, apply_stats, can_afford, check_loss, crack_checks, upkeep};
use crate::game::effects::{LossCondition, ResourceDelta, StatDelta};
use crate::game::election::resolve_election;
use crate::game::events::RunEventKind;
use crate::game::gate;
use crate::game::generator::{generate_federation_name, generate_union};
use crate::game::odds::{dissolve_reward, license_chance, reassign_reward, DELEGATES_PER_FEDERATION};
use crate::game::state::{
    Ending, Federation, FederationId, HistoryEntry, IncubationMode, Recognition, Resource, RunPhase, RunState,
    Union, UnionId,
};

/// Smallest federation.
pub const MIN_FEDERATION_MEMBERS: usize = 2;

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Action does not belong to the current phase.
    #[error("expected phase {expected:?}, run is in {actual:?}")]
    WrongPhase {
        /// Phase the action needs
        expected: RunPhase,
        /// Phase the run is in
        actual: RunPhase,
    },

    /// Generation already happened this cycle.
    #[error("unions already generated this cycle")]
    AlreadyGenerated,

    /// Not enough of a resource.
    #[error("need {cost} {resource:?}, have {have}")]
    Unaffordable {
        /// Resource short
        resource: Resource,
        /// Amount required
        cost: i32,
        /// Amount held
        have: i32,
    },

    /// No such union.
    #[error("unknown union {0}")]
    UnknownUnion(UnionId),

    /// Union has cracked and can no longer act.
    #[error("{0} has cracked")]
    Cracked(UnionId),

    /// Union already holds a license.
    #[error("{0} is already licensed")]
    AlreadyLicensed(UnionId),

    /// Union has used its one incubation.
    #[error("{0} was already incubated")]
    AlreadyIncubated(UnionId),

    /// Union has no license.
    #[error("{0} is not licensed")]
    NotLicensed(UnionId),

    /// Union already belongs to a federation.
    #[error("{union} already belongs to {federation}")]
    AlreadyFederated {
        /// Union
        union: UnionId,
        /// Federation it belongs to
        federation: FederationId,
    },

    /// Same union submitted twice.
    #[error("{0} submitted twice")]
    DuplicateMember(UnionId),

    /// Not enough members for a federation.
    #[error("a federation needs at least 2 members, got {0}")]
    TooFewMembers(usize),

    /// Nothing in the content is eligible right now.
    #[error("no eligible events")]
    NoEligibleEvent,

    /// Advancing without an event is only allowed when none is eligible.
    #[error("{0} eligible event(s) must be drawn first")]
    EventsPending(usize),

    /// The active event is not in the loaded content.
    #[error("active event `{0}` is not in the content")]
    UnknownEvent(String),

    /// The choice is missing or its conditions do not hold.
    #[error("choice `{choice}` is not available on `{event}`")]
    IneligibleChoice {
        /// Active event
        event: String,
        /// Requested choice
        choice: String,
    },

    /// The generator was handed malformed input.
    #[error(transparent)]
    Rng(#[from] RngError),
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Apply one action.
///
/// Returns the next state, or an unchanged copy of `state` if the action
/// is illegal.
pub fn reduce(state: &RunState, action: &Action, content: &Content, config: &RunConfig) -> RunState {
    let mut next = state.clone();
    match apply(&mut next, action, content, config) {
        Ok(()) => next,
        Err(rejection) => {
            debug!("rejected {}: {}", action.name(), rejection);
            state.clone()
        }
    }
}

/// Start a seeded run and apply every action in order.
pub fn replay<'a>(
    seed: u32,
    actions: impl IntoIterator<Item = &'a Action>,
    content: &Content,
    config: &RunConfig,
) -> RunState {
    actions
        .into_iter()
        .fold(RunState::start(seed, config), |state, action| {
            reduce(&state, action, content, config)
        })
}

fn apply(state: &mut RunState, action: &Action, content: &Content, config: &RunConfig) -> Result<(), Rejection> {
    match action {
        Action::StartRun { seed } => {
            require_phase(state, RunPhase::Menu)?;
            *state = RunState::start(*seed, config);
            info!("run started with seed {}", seed);
            Ok(())
        }
        Action::Reset => {
            *state = RunState::menu(config);
            Ok(())
        }
        Action::GenerateUnions => generate(state, content, config),
        Action::LicenseUnion { union } => {
            let mut rng = state.rng();
            let roll = rng.roll_percent();
            license_with_roll(state, *union, roll, config)?;
            state.commit_rng(rng);
            Ok(())
        }
        Action::IncubateUnion { union, mode } => incubate(state, *union, *mode, config),
        Action::CreateFederation { members } => create_federation(state, members, config),
        Action::DissolveUnion { union } => dissolve(state, *union),
        Action::ReassignUnion { union } => reassign(state, *union),
        Action::DrawEvent => draw(state, content),
        Action::ChooseOption { choice } => choose(state, choice, content, config),
        Action::AdvanceCycle => {
            require_phase(state, RunPhase::Playing)?;
            let pending = gate::eligible_events(state, content).len();
            if pending > 0 {
                return Err(Rejection::EventsPending(pending));
            }
            close_cycle(state, config);
            Ok(())
        }
        Action::ResolveElection => {
            require_phase(state, RunPhase::Election)?;
            let report = resolve_election(state, config);
            state.record(RunEventKind::ElectionHeld {
                secured: report.secured,
                expected: report.expected,
            });
            end_run(state, report.ending, None);
            state.election = Some(report);
            Ok(())
        }
    }
}

// =============================================================================
// PRECONDITIONS
// =============================================================================

fn require_phase(state: &RunState, expected: RunPhase) -> Result<(), Rejection> {
    if state.phase == expected {
        Ok(())
    } else {
        Err(Rejection::WrongPhase {
            expected,
            actual: state.phase,
        })
    }
}

/// Check every cost before any is charged.
fn require_funds(state: &RunState, costs: &[(Resource, i32)]) -> Result<(), Rejection> {
    for &(resource, cost) in costs {
        if !can_afford(&state.resources, resource, cost) {
            return Err(Rejection::Unaffordable {
                resource,
                cost,
                have: state.resources.get(resource),
            });
        }
    }
    Ok(())
}

/// A union that exists and has not cracked.
fn intact_union(state: &RunState, id: UnionId) -> Result<&Union, Rejection> {
    let union = state.union(id).ok_or(Rejection::UnknownUnion(id))?;
    if union.is_cracked {
        return Err(Rejection::Cracked(id));
    }
    Ok(union)
}

fn require_unfederated(state: &RunState, union: UnionId) -> Result<(), Rejection> {
    match state.federation_of(union) {
        Some(federation) => Err(Rejection::AlreadyFederated { union, federation }),
        None => Ok(()),
    }
}

fn charge(state: &mut RunState, delta: ResourceDelta) {
    state.resources = apply_resources(&state.resources, &delta);
}

// =============================================================================
// UNION ACTIONS
// =============================================================================

fn generate(state: &mut RunState, content: &Content, config: &RunConfig) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    if state.generated_this_cycle {
        return Err(Rejection::AlreadyGenerated);
    }
    let cost = config.costs.generate_paperwork;
    require_funds(state, &[(Resource::Paperwork, cost)])?;

    let mut rng = state.rng();
    let mut created = Vec::new();
    for _ in 0..config.run.generation_batch {
        let id = state.allocate_union_id();
        let union = generate_union(&mut rng, id, &content.names)?;
        debug!("generated {} {} ({:?})", id, union.name, union.archetype);
        state.unions.insert(id, union);
        created.push(id);
    }

    charge(state, ResourceDelta::single(Resource::Paperwork, -cost));
    state.generated_this_cycle = true;
    state.commit_rng(rng);
    state.record(RunEventKind::UnionsGenerated { unions: created });
    Ok(())
}

/// Resolve a license application against a known roll in [1, 100].
///
/// The reducer draws the roll from the run's generator; calling this
/// directly lets a shell or test pin the outcome. Paperwork is spent
/// either way and a denial also raises audit risk.
pub fn license_with_roll(state: &mut RunState, id: UnionId, roll: u32, config: &RunConfig) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    let union = intact_union(state, id)?;
    if union.is_licensed {
        return Err(Rejection::AlreadyLicensed(id));
    }
    let chance = license_chance(&union.stats);
    require_funds(state, &[(Resource::Paperwork, config.costs.license_paperwork)])?;

    charge(state, ResourceDelta::single(Resource::Paperwork, -config.costs.license_paperwork));
    if roll <= chance {
        if let Some(union) = state.unions.get_mut(&id) {
            union.is_licensed = true;
        }
        state.record(RunEventKind::LicenseGranted { union: id, roll, chance });
        debug!("{} licensed (roll {} <= {})", id, roll, chance);
    } else {
        charge(state, ResourceDelta::single(Resource::AuditRisk, config.costs.license_failure_audit));
        state.record(RunEventKind::LicenseDenied { union: id, roll, chance });
        debug!("{} denied (roll {} > {})", id, roll, chance);
    }
    Ok(())
}

fn incubate(state: &mut RunState, id: UnionId, mode: IncubationMode, config: &RunConfig) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    if intact_union(state, id)?.is_incubated {
        return Err(Rejection::AlreadyIncubated(id));
    }
    let cost = config.costs.incubate_paperwork;
    require_funds(state, &[(Resource::Paperwork, cost)])?;

    let tuning = &config.incubation;
    let delta = match mode {
        IncubationMode::Polish => StatDelta {
            plausibility: tuning.polish_plausibility,
            loyalty: tuning.polish_loyalty,
            integrity: 0,
        },
        IncubationMode::Discipline => StatDelta {
            plausibility: tuning.discipline_plausibility,
            loyalty: tuning.discipline_loyalty,
            integrity: 0,
        },
    };

    charge(state, ResourceDelta::single(Resource::Paperwork, -cost));
    if let Some(union) = state.unions.get_mut(&id) {
        union.stats = apply_stats(&union.stats, &delta);
        union.is_incubated = true;
        union.incubation = Some(mode);
    }
    state.record(RunEventKind::Incubated { union: id, mode });
    Ok(())
}

fn dissolve(state: &mut RunState, id: UnionId) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    let reward = dissolve_reward(&intact_union(state, id)?.stats);
    require_unfederated(state, id)?;

    state.unions.remove(&id);
    charge(state, ResourceDelta::single(Resource::Paperwork, reward));
    state.record(RunEventKind::UnionDissolved { union: id, paperwork: reward });
    Ok(())
}

fn reassign(state: &mut RunState, id: UnionId) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    let reward = reassign_reward(&intact_union(state, id)?.stats);
    require_unfederated(state, id)?;

    state.unions.remove(&id);
    charge(state, ResourceDelta::single(Resource::Patronage, reward));
    state.record(RunEventKind::UnionReassigned { union: id, patronage: reward });
    Ok(())
}

// =============================================================================
// FEDERATIONS
// =============================================================================

fn create_federation(state: &mut RunState, members: &[UnionId], config: &RunConfig) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    if members.len() < MIN_FEDERATION_MEMBERS {
        return Err(Rejection::TooFewMembers(members.len()));
    }

    let mut sectors = Vec::with_capacity(members.len());
    for (i, &id) in members.iter().enumerate() {
        if members[..i].contains(&id) {
            return Err(Rejection::DuplicateMember(id));
        }
        let union = intact_union(state, id)?;
        if !union.is_licensed {
            return Err(Rejection::NotLicensed(id));
        }
        require_unfederated(state, id)?;
        sectors.push(union.sector.as_str());
    }

    let costs = &config.costs;
    require_funds(
        state,
        &[
            (Resource::Paperwork, costs.federation_paperwork),
            (Resource::Patronage, costs.federation_patronage),
        ],
    )?;

    let mut rng = state.rng();
    let name = generate_federation_name(&mut rng, &sectors)?;
    let id = state.allocate_federation_id();
    let visibility = (20 + 10 * members.len() as u32).min(100);

    state.federations.insert(
        id,
        Federation {
            id,
            name: name.clone(),
            members: members.to_vec(),
            delegates: DELEGATES_PER_FEDERATION,
            recognition: Recognition::Recognized,
            visibility,
        },
    );
    charge(
        state,
        ResourceDelta {
            paperwork: -costs.federation_paperwork,
            patronage: -costs.federation_patronage,
            audit_risk: costs.federation_audit,
            ..ResourceDelta::default()
        },
    );
    state.commit_rng(rng);
    state.record(RunEventKind::FederationFormed {
        federation: id,
        members: members.to_vec(),
    });
    info!("{} \"{}\" formed from {} unions", id, name, members.len());
    Ok(())
}

// =============================================================================
// EVENTS
// =============================================================================

fn draw(state: &mut RunState, content: &Content) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Playing)?;
    let mut rng = state.rng();
    let event = gate::draw_event(state, content, &mut rng)?.ok_or(Rejection::NoEligibleEvent)?;

    state.active_event = Some(event.id.clone());
    state.phase = RunPhase::Event;
    state.commit_rng(rng);
    state.record(RunEventKind::EventDrawn {
        event_id: event.id.clone(),
    });
    Ok(())
}

fn choose(state: &mut RunState, choice_id: &str, content: &Content, config: &RunConfig) -> Result<(), Rejection> {
    require_phase(state, RunPhase::Event)?;
    let event_id = state.active_event.clone().unwrap_or_default();
    let event = content
        .event(&event_id)
        .ok_or_else(|| Rejection::UnknownEvent(event_id.clone()))?;
    let choice = gate::eligible_choices(state, event)
        .into_iter()
        .find(|c| c.id == choice_id)
        .ok_or_else(|| Rejection::IneligibleChoice {
            event: event_id.clone(),
            choice: choice_id.to_string(),
        })?;

    charge(state, choice.effects);
    state.unlocked_footnotes.extend(choice.unlocks.iter().cloned());
    state.history.push(HistoryEntry {
        cycle: state.cycle,
        event_id: event_id.clone(),
        choice_id: choice.id.clone(),
    });
    state.active_event = None;
    state.phase = RunPhase::Playing;
    state.record(RunEventKind::ChoiceResolved {
        event_id,
        choice_id: choice.id.clone(),
    });

    if let Some(ending) = choice.ending {
        end_run(state, ending, None);
        return Ok(());
    }
    if let Some(loss) = check_loss(&state.resources) {
        end_run(state, Ending::Collapse, Some(loss));
        return Ok(());
    }
    close_cycle(state, config);
    Ok(())
}

// =============================================================================
// CYCLE BOUNDARY
// =============================================================================

/// Upkeep, then crack checks, then the loss check.
fn close_cycle(state: &mut RunState, config: &RunConfig) {
    let delta = upkeep(state, &config.upkeep);
    charge(state, delta);

    let mut rng = state.rng();
    let cracked = crack_checks(state, &mut rng, &config.crack);
    state.commit_rng(rng);

    state.record(RunEventKind::CycleClosed { cycle: state.cycle });
    info!(
        "cycle {} closed: {} cracked, legitimacy {}, audit {}, heat {}",
        state.cycle,
        cracked.len(),
        state.resources.legitimacy(),
        state.resources.audit_risk(),
        state.resources.street_heat()
    );

    if let Some(loss) = check_loss(&state.resources) {
        end_run(state, Ending::Collapse, Some(loss));
    } else if state.is_final_cycle() {
        state.phase = RunPhase::Election;
    } else {
        state.cycle += 1;
        state.generated_this_cycle = false;
        state.phase = RunPhase::Playing;
    }
}

fn end_run(state: &mut RunState, ending: Ending, loss: Option<LossCondition>) {
    state.phase = RunPhase::Ended;
    state.ending = Some(ending);
    state.active_event = None;
    state.record(RunEventKind::RunEnded { ending, loss });
    match loss {
        Some(loss) => info!("run ended at cycle {}: {:?} ({:?})", state.cycle, ending, loss),
        None => info!("run ended at cycle {}: {:?}", state.cycle, ending),
    }
}

// =============================================================================
// TESTS
// =============================================================================
