//! Run State Definitions
//!
//! All state types for a single run.
//! Uses BTreeMap/BTreeSet for deterministic iteration order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::election::ElectionReport;
use crate::game::events::{RunEvent, RunEventKind};

// =============================================================================
// BOUNDS
// =============================================================================

/// Paperwork is the action budget.
pub const PAPERWORK_MAX: i32 = 10;

/// Patronage cap.
pub const PATRONAGE_MAX: i32 = 20;

/// Cap for the three 0-100 gauges (legitimacy, audit risk, street heat).
pub const GAUGE_MAX: i32 = 100;

/// Cap for union stats.
pub const STAT_MAX: i32 = 100;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique union identifier (monotonic per run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnionId(pub u32);

impl fmt::Display for UnionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "union-{:03}", self.0)
    }
}

/// Unique federation identifier (monotonic per run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FederationId(pub u32);

impl fmt::Display for FederationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "federation-{:02}", self.0)
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

/// One of the five run-wide resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    /// Action budget, 0-10.
    Paperwork,
    /// Favours, 0-20.
    Patronage,
    /// Public trust, 0-100. Zero ends the run.
    Legitimacy,
    /// Regulator attention, 0-100. 100 ends the run.
    AuditRisk,
    /// Rank-and-file anger, 0-100. 100 ends the run.
    StreetHeat,
}

impl Resource {
    /// Every resource, in canonical order.
    pub const ALL: [Resource; 5] = [
        Resource::Paperwork,
        Resource::Patronage,
        Resource::Legitimacy,
        Resource::AuditRisk,
        Resource::StreetHeat,
    ];

    /// Inclusive upper bound. Every lower bound is zero.
    pub const fn max(self) -> i32 {
        match self {
            Resource::Paperwork => PAPERWORK_MAX,
            Resource::Patronage => PATRONAGE_MAX,
            Resource::Legitimacy | Resource::AuditRisk | Resource::StreetHeat => GAUGE_MAX,
        }
    }
}

/// Run-wide resources.
///
/// Values are only written through the clamping helpers in
/// [`crate::game::effects`]; they are always within [`Resource::max`].
/// Deserialization goes through [`Resources::new`], so a restored save
/// is clamped too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawResources")]
pub struct Resources {
    pub(crate) paperwork: i32,
    pub(crate) patronage: i32,
    pub(crate) legitimacy: i32,
    pub(crate) audit_risk: i32,
    pub(crate) street_heat: i32,
}

/// Wire shape of [`Resources`] before clamping.
#[derive(Deserialize)]
struct RawResources {
    paperwork: i32,
    patronage: i32,
    legitimacy: i32,
    audit_risk: i32,
    street_heat: i32,
}

impl From<RawResources> for Resources {
    fn from(raw: RawResources) -> Self {
        Self::new(raw.paperwork, raw.patronage, raw.legitimacy, raw.audit_risk, raw.street_heat)
    }
}

impl Resources {
    /// Build a clamped resource set.
    pub fn new(paperwork: i32, patronage: i32, legitimacy: i32, audit_risk: i32, street_heat: i32) -> Self {
        let mut resources = Self {
            paperwork: 0,
            patronage: 0,
            legitimacy: 0,
            audit_risk: 0,
            street_heat: 0,
        };
        for (resource, value) in Resource::ALL
            .into_iter()
            .zip([paperwork, patronage, legitimacy, audit_risk, street_heat])
        {
            *resources.slot_mut(resource) = value.clamp(0, resource.max());
        }
        resources
    }

    /// Starting resources from tuning.
    pub fn starting(config: &RunConfig) -> Self {
        let s = &config.start;
        Self::new(s.paperwork, s.patronage, s.legitimacy, s.audit_risk, s.street_heat)
    }

    /// Read one resource.
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Paperwork => self.paperwork,
            Resource::Patronage => self.patronage,
            Resource::Legitimacy => self.legitimacy,
            Resource::AuditRisk => self.audit_risk,
            Resource::StreetHeat => self.street_heat,
        }
    }

    pub(crate) fn slot_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Paperwork => &mut self.paperwork,
            Resource::Patronage => &mut self.patronage,
            Resource::Legitimacy => &mut self.legitimacy,
            Resource::AuditRisk => &mut self.audit_risk,
            Resource::StreetHeat => &mut self.street_heat,
        }
    }

    /// Paperwork (action budget).
    pub fn paperwork(&self) -> i32 {
        self.paperwork
    }

    /// Patronage.
    pub fn patronage(&self) -> i32 {
        self.patronage
    }

    /// Legitimacy.
    pub fn legitimacy(&self) -> i32 {
        self.legitimacy
    }

    /// Audit risk.
    pub fn audit_risk(&self) -> i32 {
        self.audit_risk
    }

    /// Street heat.
    pub fn street_heat(&self) -> i32 {
        self.street_heat
    }
}

// =============================================================================
// UNIONS
// =============================================================================

/// Union archetype. Drives stat ranges and the shell tax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Letterhead and a P.O. box. Looks great, holds nothing.
    Shell,
    /// Real but bought.
    Captured,
    /// Real members who actually want things.
    Authentic,
    /// Unpredictable.
    Volatile,
}

impl Archetype {
    /// Every archetype, in generation-table order.
    pub const ALL: [Archetype; 4] = [
        Archetype::Shell,
        Archetype::Captured,
        Archetype::Authentic,
        Archetype::Volatile,
    ];

    /// Display tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Archetype::Shell => "shell",
            Archetype::Captured => "captured",
            Archetype::Authentic => "authentic",
            Archetype::Volatile => "volatile",
        }
    }

    /// Recover an archetype from its display tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }
}

/// The two mutually exclusive incubation modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncubationMode {
    /// Make it look real. Plausibility up, loyalty down.
    Polish,
    /// Make it obey. Loyalty up, plausibility down.
    Discipline,
}

/// Union stats, each clamped to 0-100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStats")]
pub struct UnionStats {
    pub(crate) plausibility: i32,
    pub(crate) loyalty: i32,
    pub(crate) integrity: i32,
}

#[derive(Deserialize)]
struct RawStats {
    plausibility: i32,
    loyalty: i32,
    integrity: i32,
}

impl From<RawStats> for UnionStats {
    fn from(raw: RawStats) -> Self {
        Self::new(raw.plausibility, raw.loyalty, raw.integrity)
    }
}

impl UnionStats {
    /// Build clamped stats.
    pub fn new(plausibility: i32, loyalty: i32, integrity: i32) -> Self {
        Self {
            plausibility: plausibility.clamp(0, STAT_MAX),
            loyalty: loyalty.clamp(0, STAT_MAX),
            integrity: integrity.clamp(0, STAT_MAX),
        }
    }

    /// How real it looks.
    pub fn plausibility(&self) -> i32 {
        self.plausibility
    }

    /// How well it obeys.
    pub fn loyalty(&self) -> i32 {
        self.loyalty
    }

    /// How much real membership holds it together.
    pub fn integrity(&self) -> i32 {
        self.integrity
    }
}

/// A generated union.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    /// Unique union ID
    pub id: UnionId,
    /// Display name
    pub name: String,
    /// Sector, also embedded in the name
    pub sector: String,
    /// Archetype rolled at generation
    pub archetype: Archetype,
    /// Current stats
    pub stats: UnionStats,
    /// Patronage drained per cycle
    pub maintenance_cost: u32,
    /// Flavor tags for display only
    pub tags: BTreeSet<String>,
    /// Eligible for federation
    pub is_licensed: bool,
    /// Has been incubated once
    pub is_incubated: bool,
    /// Exposed and inert. Terminal.
    pub is_cracked: bool,
    /// Last incubation mode applied
    pub incubation: Option<IncubationMode>,
}

impl Union {
    /// Create a fresh, unlicensed union.
    pub fn new(
        id: UnionId,
        name: impl Into<String>,
        sector: impl Into<String>,
        archetype: Archetype,
        stats: UnionStats,
        maintenance_cost: u32,
    ) -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(archetype.tag().to_string());
        Self {
            id,
            name: name.into(),
            sector: sector.into(),
            archetype,
            stats,
            maintenance_cost,
            tags,
            is_licensed: false,
            is_incubated: false,
            is_cracked: false,
            incubation: None,
        }
    }

    /// Is this a shell union? Cracked shells still count.
    pub fn is_shell(&self) -> bool {
        self.archetype == Archetype::Shell
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_str(&self.name);
        hasher.update_str(&self.sector);
        hasher.update_u8(self.archetype as u8);
        hasher.update_i32(self.stats.plausibility);
        hasher.update_i32(self.stats.loyalty);
        hasher.update_i32(self.stats.integrity);
        hasher.update_u32(self.maintenance_cost);
        for tag in &self.tags {
            hasher.update_str(tag);
        }
        hasher.update_bool(self.is_licensed);
        hasher.update_bool(self.is_incubated);
        hasher.update_bool(self.is_cracked);
        hasher.update_u8(match self.incubation {
            None => 0,
            Some(IncubationMode::Polish) => 1,
            Some(IncubationMode::Discipline) => 2,
        });
    }
}

// =============================================================================
// FEDERATIONS
// =============================================================================

/// Recognition status of a federation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recognition {
    /// Counted at the election.
    Recognized,
    /// Ignored at the election.
    Unrecognized,
}

/// A federation of licensed unions.
///
/// `delegates` is fixed at creation and never depends on who the members
/// are or how many there are.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Federation {
    /// Unique federation ID
    pub id: FederationId,
    /// Display name
    pub name: String,
    /// Member unions, in the order they were submitted
    pub members: Vec<UnionId>,
    /// Nominal delegates
    pub delegates: u32,
    /// Recognition status
    pub recognition: Recognition,
    /// Public visibility, 0-100
    pub visibility: u32,
}

impl Federation {
    /// Is this federation counted at the election?
    pub fn is_recognized(&self) -> bool {
        self.recognition == Recognition::Recognized
    }
}

// =============================================================================
// PHASE / ENDING
// =============================================================================

/// Current phase of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Title screen, no run in progress
    #[default]
    Menu,
    /// Player may act
    Playing,
    /// An event is displayed and awaits a choice
    Event,
    /// Cycles exhausted, waiting for the count
    Election,
    /// Terminal
    Ended,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Enough secured delegates: the congress is yours.
    Capture,
    /// Too few delegates, or a resource bound was hit.
    Collapse,
    /// Someone talked. Only reachable through content.
    Whistleblower,
}

/// A resolved content event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Cycle in which the event was resolved
    pub cycle: u32,
    /// Event ID
    pub event_id: String,
    /// Choice taken
    pub choice_id: String,
}

// =============================================================================
// RUN STATE
// =============================================================================

/// Complete state of a run.
///
/// The reducer replaces this wholesale on every transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Seed the run was started with
    pub seed: u32,
    /// RNG position after the last transition
    pub rng_cursor: u32,
    /// Current cycle, 1-indexed
    pub cycle: u32,
    /// Cycles before the election
    pub max_cycles: u32,
    /// Current phase
    pub phase: RunPhase,
    /// Run-wide resources
    pub resources: Resources,
    /// All unions ever generated, cracked ones included
    pub unions: BTreeMap<UnionId, Union>,
    /// All federations
    pub federations: BTreeMap<FederationId, Federation>,
    /// Resolved content events, oldest first
    pub history: Vec<HistoryEntry>,
    /// Event on display (only while phase is `Event`)
    pub active_event: Option<String>,
    /// Footnotes unlocked so far. Never shrinks.
    pub unlocked_footnotes: BTreeSet<String>,
    /// Set once the run is over
    pub ending: Option<Ending>,
    /// Union generation already happened this cycle
    pub generated_this_cycle: bool,
    /// Next union ID (monotonic counter)
    pub next_union_id: u32,
    /// Next federation ID (monotonic counter)
    pub next_federation_id: u32,
    /// Everything that happened, for the shell's log view
    pub journal: Vec<RunEvent>,
    /// Election outcome, once held
    pub election: Option<ElectionReport>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::menu(&RunConfig::default())
    }
}

impl RunState {
    /// Title-screen state: no run in progress.
    pub fn menu(config: &RunConfig) -> Self {
        Self {
            seed: 0,
            rng_cursor: 0,
            cycle: 0,
            max_cycles: config.run.max_cycles,
            phase: RunPhase::Menu,
            resources: Resources::starting(config),
            unions: BTreeMap::new(),
            federations: BTreeMap::new(),
            history: Vec::new(),
            active_event: None,
            unlocked_footnotes: BTreeSet::new(),
            ending: None,
            generated_this_cycle: false,
            next_union_id: 1,
            next_federation_id: 1,
            journal: Vec::new(),
            election: None,
        }
    }

    /// A fresh run at cycle 1, ready to play.
    pub fn start(seed: u32, config: &RunConfig) -> Self {
        let mut state = Self::menu(config);
        state.seed = seed;
        state.rng_cursor = seed;
        state.cycle = 1;
        state.phase = RunPhase::Playing;
        state.record(RunEventKind::RunStarted { seed });
        state
    }

    /// Generator positioned at the current cursor.
    pub fn rng(&self) -> DeterministicRng {
        DeterministicRng::from_cursor(self.rng_cursor)
    }

    /// Store the generator's position back into the state.
    pub(crate) fn commit_rng(&mut self, rng: DeterministicRng) {
        self.rng_cursor = rng.cursor();
    }

    /// Append to the journal, stamped with the current cycle.
    pub(crate) fn record(&mut self, kind: RunEventKind) {
        self.journal.push(RunEvent::new(self.cycle, kind));
    }

    /// Allocate the next union ID.
    pub(crate) fn allocate_union_id(&mut self) -> UnionId {
        let id = UnionId(self.next_union_id);
        self.next_union_id += 1;
        id
    }

    /// Allocate the next federation ID.
    pub(crate) fn allocate_federation_id(&mut self) -> FederationId {
        let id = FederationId(self.next_federation_id);
        self.next_federation_id += 1;
        id
    }

    /// Get a union by ID.
    pub fn union(&self, id: UnionId) -> Option<&Union> {
        self.unions.get(&id)
    }

    /// Federation a union belongs to, if any.
    pub fn federation_of(&self, id: UnionId) -> Option<FederationId> {
        self.federations
            .values()
            .find(|f| f.members.contains(&id))
            .map(|f| f.id)
    }

    /// Is this the last cycle before the election?
    pub fn is_final_cycle(&self) -> bool {
        self.cycle >= self.max_cycles
    }

    /// Check if the run has ended.
    pub fn is_ended(&self) -> bool {
        self.phase == RunPhase::Ended
    }

    /// Compute hash of current state for verification.
    ///
    /// Covers everything that affects future transitions. The journal is
    /// derived narration and is left out.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.seed, self.rng_cursor, self.cycle, |hasher| {
            hasher.update_u32(self.max_cycles);
            hasher.update_u8(self.phase as u8);
            for resource in Resource::ALL {
                hasher.update_i32(self.resources.get(resource));
            }

            // BTreeMap guarantees sorted order
            for union in self.unions.values() {
                union.hash_into(hasher);
            }
            for federation in self.federations.values() {
                hasher.update_u32(federation.id.0);
                hasher.update_str(&federation.name);
                for member in &federation.members {
                    hasher.update_u32(member.0);
                }
                hasher.update_u32(federation.delegates);
                hasher.update_bool(federation.is_recognized());
                hasher.update_u32(federation.visibility);
            }

            for entry in &self.history {
                hasher.update_u32(entry.cycle);
                hasher.update_str(&entry.event_id);
                hasher.update_str(&entry.choice_id);
            }
            hasher.update_str(self.active_event.as_deref().unwrap_or(""));
            for footnote in &self.unlocked_footnotes {
                hasher.update_str(footnote);
            }
            hasher.update_u8(self.ending.map_or(0, |e| e as u8 + 1));
            hasher.update_bool(self.generated_this_cycle);
            hasher.update_u32(self.next_union_id);
            hasher.update_u32(self.next_federation_id);
            if let Some(report) = &self.election {
                hasher.update_u32(report.secured);
                hasher.update_u32(report.expected);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
