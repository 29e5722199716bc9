//! Content Schema
//!
//! Closed, typed records for externally authored content. Anything that
//! does not deserialize into these shapes is rejected at the load
//! boundary; referential checks happen in [`super::validate`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::effects::ResourceDelta;
use crate::game::state::Ending;

/// Event category tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Forms, stamps, registrars
    Bureaucracy,
    /// Journalists asking questions
    Press,
    /// Members in the street
    Street,
    /// Favours owed and called in
    Patronage,
    /// Inspectors
    Audit,
    /// Someone inside talking
    Whistleblower,
}

/// A live quantity an eligibility condition can test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Current paperwork
    Paperwork,
    /// Current patronage
    Patronage,
    /// Current legitimacy
    Legitimacy,
    /// Current audit risk
    AuditRisk,
    /// Current street heat
    StreetHeat,
    /// Current cycle
    Cycle,
    /// Unions on the books (cracked ones excluded)
    Unions,
    /// Licensed unions
    LicensedUnions,
    /// Federations
    Federations,
    /// Nominal delegates of recognized federations
    Delegates,
    /// Shell unions, cracked ones included
    ShellUnions,
    /// Cracked unions
    CrackedUnions,
}

/// Inclusive numeric threshold. Absent ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bound {
    /// Lower bound, inclusive
    #[serde(default)]
    pub min: Option<i32>,
    /// Upper bound, inclusive
    #[serde(default)]
    pub max: Option<i32>,
}

impl Bound {
    /// Does `value` satisfy both ends?
    pub fn admits(&self, value: i32) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Conjunction of thresholds, keyed by metric.
pub type Conditions = BTreeMap<Metric, Bound>;

/// One option offered by an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoiceDef {
    /// Unique within its event
    pub id: String,
    /// Button text
    pub label: String,
    /// Resource changes applied when chosen
    #[serde(default)]
    pub effects: ResourceDelta,
    /// Footnotes unlocked when chosen
    #[serde(default)]
    pub unlocks: Vec<String>,
    /// Eligibility thresholds
    #[serde(default)]
    pub conditions: Conditions,
    /// Narrative ending triggered by this choice
    #[serde(default)]
    pub ending: Option<Ending>,
}

/// A drawable event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventDef {
    /// Unique event ID
    pub id: String,
    /// Category tag
    pub category: EventCategory,
    /// Headline
    pub title: String,
    /// Body text
    pub text: String,
    /// Relative draw weight
    pub weight: f64,
    /// Eligibility thresholds
    #[serde(default)]
    pub conditions: Conditions,
    /// Two or three choices
    pub choices: Vec<ChoiceDef>,
}

impl EventDef {
    /// Look up a choice by ID.
    pub fn choice(&self, id: &str) -> Option<&ChoiceDef> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// Historical footnote unlocked by event choices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Footnote {
    /// Unique footnote ID
    pub id: String,
    /// Title
    pub title: String,
    /// One-line summary
    pub summary: String,
    /// Full text
    pub body: String,
    /// Era or date
    pub era: String,
    /// Citation
    #[serde(default)]
    pub source: Option<String>,
}

/// Word lists for union names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameTables {
    /// "Amalgamated", "Free", ...
    pub prefixes: Vec<String>,
    /// "Dockworkers", "Teachers", ...
    pub sectors: Vec<String>,
    /// "Union", "Brotherhood", ...
    pub suffixes: Vec<String>,
    /// "(Reformed)", "Local 12", ...
    pub modifiers: Vec<String>,
}
