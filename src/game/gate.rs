//! Content Gate
//!
//! Filters authored events against the live run state. An event is only
//! eligible when its own conditions hold and at least one of its choices
//! is also eligible, so the player is never shown a dead end.

use tracing::debug;

use crate::content::{ChoiceDef, Conditions, Content, EventDef, Metric};
use crate::core::rng::{DeterministicRng, RngError};
use crate::game::selectors;
use crate::game::state::RunState;

/// Current value of a condition metric.
pub fn metric_value(state: &RunState, metric: Metric) -> i32 {
    let count = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    match metric {
        Metric::Paperwork => state.resources.paperwork(),
        Metric::Patronage => state.resources.patronage(),
        Metric::Legitimacy => state.resources.legitimacy(),
        Metric::AuditRisk => state.resources.audit_risk(),
        Metric::StreetHeat => state.resources.street_heat(),
        Metric::Cycle => count(state.cycle as usize),
        Metric::Unions => count(selectors::active_union_count(state)),
        Metric::LicensedUnions => count(selectors::licensed_count(state)),
        Metric::Federations => count(state.federations.len()),
        Metric::Delegates => count(selectors::total_delegates(state) as usize),
        Metric::ShellUnions => count(selectors::shell_count(state)),
        Metric::CrackedUnions => count(selectors::cracked_count(state)),
    }
}

/// Strict conjunction of every present threshold.
pub fn conditions_met(state: &RunState, conditions: &Conditions) -> bool {
    conditions
        .iter()
        .all(|(metric, bound)| bound.admits(metric_value(state, *metric)))
}

/// Choices of an event the player may take right now.
pub fn eligible_choices<'a>(state: &RunState, event: &'a EventDef) -> Vec<&'a ChoiceDef> {
    event
        .choices
        .iter()
        .filter(|c| conditions_met(state, &c.conditions))
        .collect()
}

/// Is this event presentable right now?
pub fn is_eligible(state: &RunState, event: &EventDef) -> bool {
    conditions_met(state, &event.conditions) && event.choices.iter().any(|c| conditions_met(state, &c.conditions))
}

/// Events that may be drawn, in content order.
pub fn eligible_events<'a>(state: &RunState, content: &'a Content) -> Vec<&'a EventDef> {
    content.events.iter().filter(|e| is_eligible(state, e)).collect()
}

/// Weighted draw among eligible events.
///
/// Returns `None` without touching the generator when nothing is eligible.
pub fn draw_event<'a>(
    state: &RunState,
    content: &'a Content,
    rng: &mut DeterministicRng,
) -> Result<Option<&'a EventDef>, RngError> {
    let eligible = eligible_events(state, content);
    if eligible.is_empty() {
        debug!("no eligible events at cycle {}", state.cycle);
        return Ok(None);
    }

    let weights: Vec<f64> = eligible.iter().map(|e| e.weight).collect();
    let picked = *rng.pick_weighted(&eligible, &weights)?;
    debug!("drew {} from {} eligible events", picked.id, eligible.len());
    Ok(Some(picked))
}
