//! Tuning Configuration
//!
//! All balance numbers live here. `RunConfig::default()` is the canonical
//! tuning; a `tuning.toml` file may override any subset of it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Errors loading a tuning file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    /// File was not valid TOML for `RunConfig`.
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete tuning for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run length and election parameters.
    pub run: RunRules,
    /// Resources at the start of a run.
    pub start: StartingResources,
    /// Action costs.
    pub costs: ActionCosts,
    /// Per-cycle upkeep formula.
    pub upkeep: UpkeepConfig,
    /// Union cracking penalties.
    pub crack: CrackConfig,
    /// Incubation mode trade-offs.
    pub incubation: IncubationConfig,
}

impl RunConfig {
    /// Parse a TOML tuning document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a tuning file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load a tuning file, or fall back to defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("no tuning file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }
}

/// Run length and election parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRules {
    /// Cycles before the election.
    pub max_cycles: u32,
    /// Secured delegates needed for the `capture` ending.
    pub delegate_threshold: u32,
    /// Unions created per generation.
    pub generation_batch: u32,
    /// Offset added to the main cursor to seed the election stream.
    pub election_stream_offset: u32,
}

impl Default for RunRules {
    fn default() -> Self {
        Self {
            max_cycles: crate::DEFAULT_MAX_CYCLES,
            delegate_threshold: crate::DELEGATE_THRESHOLD,
            generation_batch: 3,
            election_stream_offset: 0x9E37_79B9,
        }
    }
}

/// Resources at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingResources {
    /// Action budget.
    pub paperwork: i32,
    /// Favours to spend.
    pub patronage: i32,
    /// Public trust.
    pub legitimacy: i32,
    /// Regulator attention.
    pub audit_risk: i32,
    /// Rank-and-file anger.
    pub street_heat: i32,
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            paperwork: 6,
            patronage: 5,
            legitimacy: 60,
            audit_risk: 10,
            street_heat: 10,
        }
    }
}

/// Action costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCosts {
    /// Paperwork to generate a batch of unions.
    pub generate_paperwork: i32,
    /// Paperwork to file a license application.
    pub license_paperwork: i32,
    /// Audit risk added by a rejected license application.
    pub license_failure_audit: i32,
    /// Paperwork to incubate a union.
    pub incubate_paperwork: i32,
    /// Paperwork to register a federation.
    pub federation_paperwork: i32,
    /// Patronage to register a federation.
    pub federation_patronage: i32,
    /// Audit risk added by registering a federation.
    pub federation_audit: i32,
}

impl Default for ActionCosts {
    fn default() -> Self {
        Self {
            generate_paperwork: 1,
            license_paperwork: 1,
            license_failure_audit: 2,
            incubate_paperwork: 1,
            federation_paperwork: 2,
            federation_patronage: 3,
            federation_audit: 5,
        }
    }
}

/// Per-cycle upkeep formula.
///
/// `patronage_per_delegate` feeds delegate count straight back into
/// purchasing power. Balance-sensitive: more federations buy more
/// federations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpkeepConfig {
    /// Paperwork refills up to this value each cycle.
    pub paperwork_target: i32,
    /// Flat patronage income.
    pub patronage_base: i32,
    /// Patronage income per recognized delegate.
    pub patronage_per_delegate: i32,
    /// Deduct union maintenance costs from patronage income. Off by
    /// default: patronage upkeep is pure income.
    pub charge_maintenance: bool,
    /// Street heat lost per cycle while positive.
    pub street_heat_decay: i32,
    /// Shell unions tolerated before legitimacy starts decaying.
    pub shell_threshold: u32,
    /// Legitimacy lost per shell union above the threshold.
    pub legitimacy_per_excess_shell: i32,
    /// One audit point per this many unions.
    pub unions_per_audit_point: u32,
    /// Audit risk per federation.
    pub audit_per_federation: i32,
    /// Audit risk per shell union.
    pub audit_per_shell: i32,
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            paperwork_target: 6,
            patronage_base: 1,
            patronage_per_delegate: 1,
            charge_maintenance: false,
            street_heat_decay: 5,
            shell_threshold: 2,
            legitimacy_per_excess_shell: 2,
            unions_per_audit_point: 5,
            audit_per_federation: 1,
            audit_per_shell: 1,
        }
    }
}

/// Penalties applied when a union cracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackConfig {
    /// Legitimacy lost per crack.
    pub legitimacy_penalty: i32,
    /// Audit risk gained per crack.
    pub audit_penalty: i32,
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            legitimacy_penalty: 5,
            audit_penalty: 5,
        }
    }
}

/// Stat trade-offs for the two incubation modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncubationConfig {
    /// Plausibility gained when polishing.
    pub polish_plausibility: i32,
    /// Loyalty lost when polishing.
    pub polish_loyalty: i32,
    /// Loyalty gained when disciplining.
    pub discipline_loyalty: i32,
    /// Plausibility lost when disciplining.
    pub discipline_plausibility: i32,
}

impl Default for IncubationConfig {
    fn default() -> Self {
        Self {
            polish_plausibility: 15,
            polish_loyalty: -10,
            discipline_loyalty: 15,
            discipline_plausibility: -10,
        }
    }
}
