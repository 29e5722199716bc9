//! Save Snapshots
//!
//! The whole run state is the save. Two encodings are supported:
//!
//! - JSON: human-readable and migratable across save versions
//! - Binary: bincode payload behind a magic prefix and a SHA-256 checksum
//!
//! Loading never takes the game down. [`load_or_fresh`] logs whatever went
//! wrong and hands back a fresh menu state.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::core::hash::{hash_with_domain, StateHash};
use crate::game::state::{Archetype, RunState};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Storage key for current saves.
pub const SAVE_KEY: &str = "paper-federation/save/v1";

/// Storage key used by version 0 saves.
pub const LEGACY_SAVE_KEY: &str = "paper-federation/save/v0";

/// Prefix identifying a binary save.
pub const BINARY_MAGIC: &[u8; 4] = b"PFSV";

const CHECKSUM_DOMAIN: &[u8] = b"PAPER_FEDERATION_SAVE_V1";

/// Errors reading or writing saves.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Storage failed.
    #[error("storage error: {0}")]
    Io(#[from] io::Error),

    /// JSON was malformed or did not match the schema.
    #[error("invalid JSON save: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary payload failed to decode.
    #[error("invalid binary save: {0}")]
    Binary(#[from] bincode::Error),

    /// Binary payload does not match its checksum.
    #[error("save checksum mismatch")]
    Checksum,

    /// Save was written by a format this build does not know.
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u64),

    /// An old save could not be brought up to date.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Envelope belongs to a different save slot.
    #[error("save key mismatch: expected {expected}, found {found}")]
    KeyMismatch {
        /// Key this build writes
        expected: String,
        /// Key found in the envelope
        found: String,
    },
}

/// Encoding of a stored save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    /// serde_json
    Json,
    /// bincode with checksum
    Binary,
}

impl SaveFormat {
    /// Work out the encoding of stored bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(BINARY_MAGIC) {
            SaveFormat::Binary
        } else {
            SaveFormat::Json
        }
    }
}

/// A versioned, timestamped snapshot of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    /// Save format version
    pub version: u32,
    /// Save slot key
    pub key: String,
    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,
    /// The run
    pub state: RunState,
}

impl SaveEnvelope {
    /// Wrap a state with an explicit timestamp.
    pub fn new(state: RunState, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SAVE_VERSION,
            key: SAVE_KEY.to_string(),
            saved_at,
            state,
        }
    }

    /// Snapshot a state now.
    pub fn capture(state: &RunState) -> Self {
        Self::new(state.clone(), Utc::now())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, migrating older versions.
    pub fn from_json(s: &str) -> Result<Self, PersistenceError> {
        let mut value: Value = serde_json::from_str(s)?;
        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| PersistenceError::Migration("save has no version".into()))?;

        match version {
            0 => migrate_v0(&mut value)?,
            1 => {}
            other => return Err(PersistenceError::UnsupportedVersion(other)),
        }

        let envelope: SaveEnvelope = serde_json::from_value(value)?;
        envelope.check_key()?;
        Ok(envelope)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        let payload = bincode::serialize(self)?;
        let checksum = checksum(&payload);

        let mut out = Vec::with_capacity(BINARY_MAGIC.len() + checksum.len() + payload.len());
        out.extend_from_slice(BINARY_MAGIC);
        out.extend_from_slice(&checksum);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Deserialize from binary, verifying the checksum.
    pub fn from_bytes(data: &[u8]) -> Result<Self, PersistenceError> {
        let body = data
            .strip_prefix(BINARY_MAGIC.as_slice())
            .ok_or_else(|| PersistenceError::Migration("missing binary save prefix".into()))?;
        if body.len() < 32 {
            return Err(PersistenceError::Checksum);
        }
        let (stored, payload) = body.split_at(32);
        if stored != checksum(payload).as_slice() {
            return Err(PersistenceError::Checksum);
        }

        let envelope: SaveEnvelope = bincode::deserialize(payload)?;
        if envelope.version != SAVE_VERSION {
            return Err(PersistenceError::UnsupportedVersion(u64::from(envelope.version)));
        }
        envelope.check_key()?;
        Ok(envelope)
    }

    /// Encode in the given format.
    pub fn encode(&self, format: SaveFormat) -> Result<Vec<u8>, PersistenceError> {
        match format {
            SaveFormat::Json => Ok(self.to_json()?.into_bytes()),
            SaveFormat::Binary => self.to_bytes(),
        }
    }

    /// Decode bytes of either format.
    pub fn decode(bytes: &[u8]) -> Result<Self, PersistenceError> {
        match SaveFormat::detect(bytes) {
            SaveFormat::Binary => Self::from_bytes(bytes),
            SaveFormat::Json => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| PersistenceError::Migration(format!("save is not UTF-8: {e}")))?;
                Self::from_json(text)
            }
        }
    }

    fn check_key(&self) -> Result<(), PersistenceError> {
        if self.key == SAVE_KEY {
            Ok(())
        } else {
            Err(PersistenceError::KeyMismatch {
                expected: SAVE_KEY.to_string(),
                found: self.key.clone(),
            })
        }
    }
}

fn checksum(payload: &[u8]) -> StateHash {
    hash_with_domain(CHECKSUM_DOMAIN, payload)
}

// =============================================================================
// MIGRATION
// =============================================================================

/// Archetype of a v0 union, recovered from its tags.
fn infer_archetype(tags: Option<&Value>) -> Archetype {
    tags.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find_map(Archetype::from_tag)
        .unwrap_or(Archetype::Captured)
}

/// v0 → v1: unions gain `archetype` and `incubation`; the state gains
/// `journal` and `election`.
fn migrate_v0(value: &mut Value) -> Result<(), PersistenceError> {
    let state = value
        .get_mut("state")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| PersistenceError::Migration("v0 save has no state object".into()))?;

    if let Some(unions) = state.get_mut("unions").and_then(Value::as_object_mut) {
        for (id, union) in unions.iter_mut() {
            let fields = union
                .as_object_mut()
                .ok_or_else(|| PersistenceError::Migration(format!("union {id} is not an object")))?;
            if !fields.contains_key("archetype") {
                let archetype = infer_archetype(fields.get("tags"));
                fields.insert("archetype".into(), serde_json::to_value(archetype)?);
            }
            fields.entry("incubation").or_insert(Value::Null);
        }
    }
    state.entry("journal").or_insert_with(|| Value::Array(Vec::new()));
    state.entry("election").or_insert(Value::Null);

    value["version"] = Value::from(SAVE_VERSION);
    value["key"] = Value::from(SAVE_KEY);
    debug!("migrated v0 save to v{}", SAVE_VERSION);
    Ok(())
}

// =============================================================================
// STORES
// =============================================================================

/// Key-value storage for save bytes.
pub trait SaveStore {
    /// Bytes under `key`, if present.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;
    /// Replace the bytes under `key`.
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
    /// Delete `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// One file per key in a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing a key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.save", key.replace('/', "_")))
    }
}

impl SaveStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("save.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory store for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// SAVE / LOAD
// =============================================================================

/// Snapshot `state` into the store under [`SAVE_KEY`].
pub fn save<S: SaveStore + ?Sized>(
    store: &mut S,
    state: &RunState,
    format: SaveFormat,
) -> Result<(), PersistenceError> {
    let bytes = SaveEnvelope::capture(state).encode(format)?;
    store.write(SAVE_KEY, &bytes)?;
    debug!("saved cycle {} ({} bytes, {:?})", state.cycle, bytes.len(), format);
    Ok(())
}

/// Load the saved run, falling back to a legacy slot.
///
/// A legacy save is re-written under the current key after it migrates.
pub fn load<S: SaveStore + ?Sized>(store: &mut S) -> Result<Option<RunState>, PersistenceError> {
    if let Some(bytes) = store.read(SAVE_KEY)? {
        return Ok(Some(SaveEnvelope::decode(&bytes)?.state));
    }
    let Some(bytes) = store.read(LEGACY_SAVE_KEY)? else {
        return Ok(None);
    };

    let envelope = SaveEnvelope::decode(&bytes)?;
    store.write(SAVE_KEY, &envelope.encode(SaveFormat::detect(&bytes))?)?;
    store.remove(LEGACY_SAVE_KEY)?;
    Ok(Some(envelope.state))
}

/// Load the saved run or start from the menu. Never fails.
pub fn load_or_fresh<S: SaveStore + ?Sized>(store: &mut S, config: &RunConfig) -> RunState {
    match load(store) {
        Ok(Some(state)) => state,
        Ok(None) => RunState::menu(config),
        Err(e) => {
            warn!("discarding unreadable save: {}", e);
            RunState::menu(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::game::{reduce, Action, UnionId};
    use chrono::TimeZone;

    fn played() -> RunState {
        let config = RunConfig::default();
        let content = Content::bundled().unwrap();
        let mut state = RunState::start(42, &config);
        for action in [
            Action::GenerateUnions,
            Action::LicenseUnion { union: UnionId(1) },
            Action::LicenseUnion { union: UnionId(2) },
            Action::DrawEvent,
        ] {
            state = reduce(&state, &action, &content, &config);
        }
        state
    }

    fn envelope() -> SaveEnvelope {
        let saved_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        SaveEnvelope::new(played(), saved_at)
    }

    #[test]
    fn test_json_roundtrip() {
        let original = envelope();
        let json = original.to_json().unwrap();
        let parsed = SaveEnvelope::from_json(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.state.rng_cursor, original.state.rng_cursor);
        assert_eq!(parsed.state.compute_hash(), original.state.compute_hash());
    }

    #[test]
    fn test_binary_roundtrip() {
        let original = envelope();
        let bytes = original.to_bytes().unwrap();
        assert_eq!(SaveFormat::detect(&bytes), SaveFormat::Binary);
        assert_eq!(SaveEnvelope::decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_binary_checksum_catches_corruption() {
        let mut bytes = envelope().to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(SaveEnvelope::from_bytes(&bytes), Err(PersistenceError::Checksum)));
        assert!(matches!(
            SaveEnvelope::from_bytes(&bytes[..10]),
            Err(PersistenceError::Checksum)
        ));
    }

    #[test]
    fn test_v0_migration_infers_archetype() {
        let original = envelope();
        let mut value = serde_json::to_value(&original).unwrap();
        value["version"] = Value::from(0);
        value["key"] = Value::from(LEGACY_SAVE_KEY);
        let state = value["state"].as_object_mut().unwrap();
        state.remove("journal");
        state.remove("election");
        for union in state["unions"].as_object_mut().unwrap().values_mut() {
            let fields = union.as_object_mut().unwrap();
            fields.remove("archetype");
            fields.remove("incubation");
        }

        let migrated = SaveEnvelope::from_json(&value.to_string()).unwrap();
        assert_eq!(migrated.version, SAVE_VERSION);
        assert_eq!(migrated.key, SAVE_KEY);
        assert!(migrated.state.journal.is_empty());
        for (id, union) in &migrated.state.unions {
            assert_eq!(union.archetype, original.state.unions[id].archetype);
        }
        assert_eq!(migrated.state.compute_hash(), original.state.compute_hash());
    }

    #[test]
    fn test_infer_archetype_defaults() {
        assert_eq!(infer_archetype(Some(&serde_json::json!(["photogenic", "shell"]))), Archetype::Shell);
        assert_eq!(infer_archetype(Some(&serde_json::json!(["restless"]))), Archetype::Captured);
        assert_eq!(infer_archetype(None), Archetype::Captured);
    }

    #[test]
    fn test_rejects_unknown_versions_and_keys() {
        let mut value = serde_json::to_value(envelope()).unwrap();
        value["version"] = Value::from(7);
        assert!(matches!(
            SaveEnvelope::from_json(&value.to_string()),
            Err(PersistenceError::UnsupportedVersion(7))
        ));

        let mut value = serde_json::to_value(envelope()).unwrap();
        value["key"] = Value::from("someone-else/save");
        assert!(matches!(
            SaveEnvelope::from_json(&value.to_string()),
            Err(PersistenceError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_restored_values_are_clamped() {
        let mut value = serde_json::to_value(envelope()).unwrap();
        value["state"]["resources"]["legitimacy"] = Value::from(500);
        value["state"]["resources"]["paperwork"] = Value::from(-7);
        let union = value["state"]["unions"].as_object_mut().unwrap().values_mut().next().unwrap();
        union["stats"]["loyalty"] = Value::from(250);
        union["stats"]["integrity"] = Value::from(-40);

        let restored = SaveEnvelope::from_json(&value.to_string()).unwrap();
        let resources = restored.state.resources;
        assert_eq!(resources.legitimacy(), 100);
        assert_eq!(resources.paperwork(), 0);
        let stats = restored.state.unions.values().next().unwrap().stats;
        assert_eq!(stats.loyalty(), 100);
        assert_eq!(stats.integrity(), 0);

        // Binary goes through the same constructors
        let bytes = restored.to_bytes().unwrap();
        assert_eq!(SaveEnvelope::from_bytes(&bytes).unwrap(), restored);
    }

    #[test]
    fn test_load_or_fresh_never_fails() {
        let config = RunConfig::default();
        let mut store = MemoryStore::new();
        assert_eq!(load_or_fresh(&mut store, &config), RunState::menu(&config));

        store.write(SAVE_KEY, b"{ not json").unwrap();
        assert_eq!(load_or_fresh(&mut store, &config), RunState::menu(&config));

        store.write(SAVE_KEY, b"PFSV garbage").unwrap();
        assert_eq!(load_or_fresh(&mut store, &config), RunState::menu(&config));

        let state = played();
        save(&mut store, &state, SaveFormat::Json).unwrap();
        assert_eq!(load_or_fresh(&mut store, &config), state);
    }

    #[test]
    fn test_legacy_slot_is_promoted() {
        let original = envelope();
        let mut value = serde_json::to_value(&original).unwrap();
        value["version"] = Value::from(0);
        value["key"] = Value::from(LEGACY_SAVE_KEY);

        let mut store = MemoryStore::new();
        store.write(LEGACY_SAVE_KEY, value.to_string().as_bytes()).unwrap();

        assert_eq!(load(&mut store).unwrap(), Some(original.state.clone()));
        assert!(store.read(LEGACY_SAVE_KEY).unwrap().is_none());
        assert!(store.read(SAVE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        assert!(store.read(SAVE_KEY).unwrap().is_none());
        store.remove(SAVE_KEY).unwrap();

        let state = played();
        save(&mut store, &state, SaveFormat::Binary).unwrap();
        assert!(store.path_for(SAVE_KEY).exists());
        assert_eq!(load(&mut store).unwrap(), Some(state));

        store.remove(SAVE_KEY).unwrap();
        assert!(load(&mut store).unwrap().is_none());
    }
}
