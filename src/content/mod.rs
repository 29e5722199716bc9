//! Content Loading
//!
//! Events, footnotes and name tables arrive as JSON from outside the
//! core. They are parsed into closed records, validated as a whole, and
//! only then handed to the reducer. Content is immutable once loaded.
//!
//! ## Module Structure
//!
//! - `schema`: typed content records
//! - `validate`: structural and referential checks

pub mod schema;
pub mod validate;

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

pub use schema::{Bound, ChoiceDef, Conditions, EventCategory, EventDef, Footnote, Metric, NameTables};
pub use validate::{validate, ValidationReport, Violation};

/// Bundled default events.
pub const DEFAULT_EVENTS: &str = include_str!("../../content/events.json");

/// Bundled default footnotes.
pub const DEFAULT_FOOTNOTES: &str = include_str!("../../content/footnotes.json");

/// Bundled default name tables.
pub const DEFAULT_NAMES: &str = include_str!("../../content/names.json");

/// Errors loading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// A content file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A content document did not match the schema.
    #[error("malformed {document}: {source}")]
    Parse {
        /// Which document failed ("events", "footnotes", "names")
        document: &'static str,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Content parsed but failed validation.
    #[error("{0}")]
    Invalid(ValidationReport),
}

/// How to treat validation failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Refuse invalid content (production).
    #[default]
    Strict,
    /// Log violations as warnings and continue (development only).
    Lenient,
}

/// A complete, validated content set.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    /// Drawable events
    pub events: Vec<EventDef>,
    /// Footnotes referenced by event unlocks
    pub footnotes: Vec<Footnote>,
    /// Union name word lists
    pub names: NameTables,
}

impl Content {
    /// Validate parsed content.
    pub fn new(
        events: Vec<EventDef>,
        footnotes: Vec<Footnote>,
        names: NameTables,
        mode: ValidationMode,
    ) -> Result<Self, ContentError> {
        let report = validate(&events, &footnotes, &names);
        if !report.is_clean() {
            match mode {
                ValidationMode::Strict => return Err(ContentError::Invalid(report)),
                ValidationMode::Lenient => {
                    for violation in &report.violations {
                        warn!("content: {}", violation);
                    }
                }
            }
        }
        debug!(
            "loaded {} events, {} footnotes, {} sectors",
            events.len(),
            footnotes.len(),
            names.sectors.len()
        );
        Ok(Self { events, footnotes, names })
    }

    /// Parse and validate the three JSON documents.
    pub fn from_json(
        events: &str,
        footnotes: &str,
        names: &str,
        mode: ValidationMode,
    ) -> Result<Self, ContentError> {
        let parse = |document: &'static str| move |source| ContentError::Parse { document, source };
        let events = serde_json::from_str(events).map_err(parse("events"))?;
        let footnotes = serde_json::from_str(footnotes).map_err(parse("footnotes"))?;
        let names = serde_json::from_str(names).map_err(parse("names"))?;
        Self::new(events, footnotes, names, mode)
    }

    /// Load `events.json`, `footnotes.json` and `names.json` from a directory.
    pub fn load_dir(dir: impl AsRef<Path>, mode: ValidationMode) -> Result<Self, ContentError> {
        let read = |name: &str| {
            let path = dir.as_ref().join(name);
            fs::read_to_string(&path).map_err(|source| ContentError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        Self::from_json(&read("events.json")?, &read("footnotes.json")?, &read("names.json")?, mode)
    }

    /// The content shipped with the crate.
    pub fn bundled() -> Result<Self, ContentError> {
        Self::from_json(DEFAULT_EVENTS, DEFAULT_FOOTNOTES, DEFAULT_NAMES, ValidationMode::Strict)
    }

    /// Look up an event by ID.
    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Look up a footnote by ID.
    pub fn footnote(&self, id: &str) -> Option<&Footnote> {
        self.footnotes.iter().find(|f| f.id == id)
    }
}
