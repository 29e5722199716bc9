//! Run Journal
//!
//! Narration of everything the reducer did, for the shell's log view and
//! for replay inspection. Purely descriptive: nothing reads it back.

use serde::{Deserialize, Serialize};

use crate::game::effects::LossCondition;
use crate::game::state::{Ending, FederationId, IncubationMode, UnionId};

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// A run began.
    RunStarted {
        seed: u32,
    },

    /// A batch of unions was generated.
    UnionsGenerated {
        unions: Vec<UnionId>,
    },

    /// A license application was approved.
    LicenseGranted {
        union: UnionId,
        roll: u32,
        chance: u32,
    },

    /// A license application was rejected.
    LicenseDenied {
        union: UnionId,
        roll: u32,
        chance: u32,
    },

    /// A union was incubated.
    Incubated {
        union: UnionId,
        mode: IncubationMode,
    },

    /// A federation was registered.
    FederationFormed {
        federation: FederationId,
        members: Vec<UnionId>,
    },

    /// A union was dissolved for paperwork.
    UnionDissolved {
        union: UnionId,
        paperwork: i32,
    },

    /// A union was handed off for patronage.
    UnionReassigned {
        union: UnionId,
        patronage: i32,
    },

    /// A union failed its structural check.
    UnionCracked {
        union: UnionId,
        roll: u32,
        risk: u32,
    },

    /// A content event was drawn.
    EventDrawn {
        event_id: String,
    },

    /// A content choice was taken.
    ChoiceResolved {
        event_id: String,
        choice_id: String,
    },

    /// A cycle closed and upkeep was applied.
    CycleClosed {
        cycle: u32,
    },

    /// The election was held.
    ElectionHeld {
        secured: u32,
        expected: u32,
    },

    /// The run is over.
    RunEnded {
        ending: Ending,
        loss: Option<LossCondition>,
    },
}

/// A journal entry stamped with its cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEvent {
    /// Cycle in which it happened
    pub cycle: u32,
    /// What happened
    pub kind: RunEventKind,
}

impl RunEvent {
    /// Create a new entry.
    pub fn new(cycle: u32, kind: RunEventKind) -> Self {
        Self { cycle, kind }
    }

    /// Is this the entry that closed the run?
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RunEventKind::RunEnded { .. })
    }
}
