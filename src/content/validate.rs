//! Content Validation
//!
//! Referential and structural checks over a parsed content set. Every
//! violation is collected so authors see the whole list at once.

use std::collections::BTreeSet;
use std::fmt;

use crate::content::schema::{Conditions, EventDef, Footnote, Metric, NameTables};
use crate::game::state::Ending;

/// Allowed number of choices per event.
pub const CHOICES_PER_EVENT: std::ops::RangeInclusive<usize> = 2..=3;

/// One problem found in a content set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    /// Two events share an ID.
    #[error("duplicate event id `{0}`")]
    DuplicateEvent(String),

    /// Two choices in one event share an ID.
    #[error("event `{event}` has duplicate choice id `{choice}`")]
    DuplicateChoice { event: String, choice: String },

    /// Two footnotes share an ID.
    #[error("duplicate footnote id `{0}`")]
    DuplicateFootnote(String),

    /// Event has too few or too many choices.
    #[error("event `{event}` has {count} choices (expected 2-3)")]
    ChoiceCount { event: String, count: usize },

    /// A choice unlocks a footnote that does not exist.
    #[error("choice `{event}/{choice}` unlocks unknown footnote `{footnote}`")]
    UnknownFootnote {
        event: String,
        choice: String,
        footnote: String,
    },

    /// Draw weight is zero, negative or not finite.
    #[error("event `{event}` has invalid weight {weight}")]
    BadWeight { event: String, weight: f64 },

    /// A bound has `min > max` and can never be satisfied.
    #[error("`{owner}` condition on {metric:?} has min {min} > max {max}")]
    InvertedBound {
        owner: String,
        metric: Metric,
        min: i32,
        max: i32,
    },

    /// A name table is empty.
    #[error("name table `{0}` is empty")]
    EmptyNameTable(&'static str),

    /// A choice tries to trigger an ending reserved for the election.
    #[error("choice `{event}/{choice}` triggers {ending:?}, only whistleblower may come from content")]
    ReservedEnding {
        event: String,
        choice: String,
        ending: Ending,
    },
}

/// Every violation found in a content set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Violations in discovery order
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Nothing wrong?
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} content violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

fn check_conditions(owner: &str, conditions: &Conditions, out: &mut Vec<Violation>) {
    for (metric, bound) in conditions {
        if let (Some(min), Some(max)) = (bound.min, bound.max) {
            if min > max {
                out.push(Violation::InvertedBound {
                    owner: owner.to_string(),
                    metric: *metric,
                    min,
                    max,
                });
            }
        }
    }
}

/// Validate a full content set.
pub fn validate(events: &[EventDef], footnotes: &[Footnote], names: &NameTables) -> ValidationReport {
    let mut violations = Vec::new();

    let mut footnote_ids = BTreeSet::new();
    for footnote in footnotes {
        if !footnote_ids.insert(footnote.id.as_str()) {
            violations.push(Violation::DuplicateFootnote(footnote.id.clone()));
        }
    }

    let mut event_ids = BTreeSet::new();
    for event in events {
        if !event_ids.insert(event.id.as_str()) {
            violations.push(Violation::DuplicateEvent(event.id.clone()));
        }
        if !(event.weight.is_finite() && event.weight > 0.0) {
            violations.push(Violation::BadWeight {
                event: event.id.clone(),
                weight: event.weight,
            });
        }
        if !CHOICES_PER_EVENT.contains(&event.choices.len()) {
            violations.push(Violation::ChoiceCount {
                event: event.id.clone(),
                count: event.choices.len(),
            });
        }
        check_conditions(&event.id, &event.conditions, &mut violations);

        let mut choice_ids = BTreeSet::new();
        for choice in &event.choices {
            if !choice_ids.insert(choice.id.as_str()) {
                violations.push(Violation::DuplicateChoice {
                    event: event.id.clone(),
                    choice: choice.id.clone(),
                });
            }
            for footnote in &choice.unlocks {
                if !footnote_ids.contains(footnote.as_str()) {
                    violations.push(Violation::UnknownFootnote {
                        event: event.id.clone(),
                        choice: choice.id.clone(),
                        footnote: footnote.clone(),
                    });
                }
            }
            if let Some(ending) = choice.ending {
                if ending != Ending::Whistleblower {
                    violations.push(Violation::ReservedEnding {
                        event: event.id.clone(),
                        choice: choice.id.clone(),
                        ending,
                    });
                }
            }
            check_conditions(&format!("{}/{}", event.id, choice.id), &choice.conditions, &mut violations);
        }
    }

    for (table, entries) in [
        ("prefixes", &names.prefixes),
        ("sectors", &names.sectors),
        ("suffixes", &names.suffixes),
        ("modifiers", &names.modifiers),
    ] {
        if entries.is_empty() {
            violations.push(Violation::EmptyNameTable(table));
        }
    }

    ValidationReport { violations }
}
