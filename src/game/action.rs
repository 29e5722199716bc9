//! Player and System Actions
//!
//! Everything the shell can ask the reducer to do. Actions are plain data
//! so a run can be recorded and replayed.

use serde::{Deserialize, Serialize};

use crate::game::state::{IncubationMode, UnionId};

/// A tagged request to the reducer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Leave the menu and begin a seeded run.
    StartRun {
        /// RNG seed
        seed: u32,
    },
    /// Spend paperwork on a batch of new unions. Once per cycle.
    GenerateUnions,
    /// Apply for a license.
    LicenseUnion {
        /// Applicant
        union: UnionId,
    },
    /// One-time stat adjustment.
    IncubateUnion {
        /// Target
        union: UnionId,
        /// Trade-off to apply
        mode: IncubationMode,
    },
    /// Bundle two or more licensed unions into a federation.
    CreateFederation {
        /// Members, in submission order
        members: Vec<UnionId>,
    },
    /// Scrap a union for paperwork.
    DissolveUnion {
        /// Target
        union: UnionId,
    },
    /// Hand a union to a patron for patronage.
    ReassignUnion {
        /// Target
        union: UnionId,
    },
    /// Draw this cycle's event.
    DrawEvent,
    /// Answer the active event.
    ChooseOption {
        /// Choice ID within the active event
        choice: String,
    },
    /// Close the cycle without an event. Only legal when none is eligible.
    AdvanceCycle,
    /// Count the vote.
    ResolveElection,
    /// Back to the menu.
    Reset,
}

impl Action {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartRun { .. } => "start_run",
            Action::GenerateUnions => "generate_unions",
            Action::LicenseUnion { .. } => "license_union",
            Action::IncubateUnion { .. } => "incubate_union",
            Action::CreateFederation { .. } => "create_federation",
            Action::DissolveUnion { .. } => "dissolve_union",
            Action::ReassignUnion { .. } => "reassign_union",
            Action::DrawEvent => "draw_event",
            Action::ChooseOption { .. } => "choose_option",
            Action::AdvanceCycle => "advance_cycle",
            Action::ResolveElection => "resolve_election",
            Action::Reset => "reset",
        }
    }
}
