//! Union and Federation Generation
//!
//! Procedural names and archetype-driven stats. Plausibility and
//! integrity are anti-correlated by construction: each archetype owns a
//! disjoint band of every stat, and the bands are stacked so that the
//! unions that look most real are the ones with nothing inside.

use crate::content::NameTables;
use crate::core::rng::{DeterministicRng, RngError};
use crate::game::state::{Archetype, Union, UnionId, UnionStats};

/// Archetype weights, in `Archetype::ALL` order (shell, captured,
/// authentic, volatile).
pub const ARCHETYPE_WEIGHTS: [f64; 4] = [40.0, 30.0, 20.0, 10.0];

/// Fixed federation name prefixes.
pub const FEDERATION_PREFIXES: [&str; 8] = [
    "United",
    "National",
    "Confederated",
    "Democratic",
    "Progressive",
    "Independent",
    "Allied",
    "Patriotic",
];

/// Fixed federation name suffixes.
pub const FEDERATION_SUFFIXES: [&str; 6] = [
    "Federation of Labour",
    "Workers' Congress",
    "Trade Union Centre",
    "Alliance of Unions",
    "Labour Front",
    "Council of Syndicates",
];

/// Inclusive stat bands for one archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchetypeProfile {
    /// Plausibility band
    pub plausibility: (i32, i32),
    /// Loyalty band
    pub loyalty: (i32, i32),
    /// Integrity band
    pub integrity: (i32, i32),
    /// Maintenance cost band
    pub maintenance: (i32, i32),
}

/// Stat bands per archetype. Bands never overlap between archetypes.
pub const fn profile(archetype: Archetype) -> ArchetypeProfile {
    match archetype {
        Archetype::Shell => ArchetypeProfile {
            plausibility: (75, 95),
            loyalty: (70, 90),
            integrity: (5, 20),
            maintenance: (0, 0),
        },
        Archetype::Captured => ArchetypeProfile {
            plausibility: (55, 74),
            loyalty: (50, 69),
            integrity: (21, 45),
            maintenance: (1, 1),
        },
        Archetype::Volatile => ArchetypeProfile {
            plausibility: (35, 54),
            loyalty: (31, 49),
            integrity: (46, 69),
            maintenance: (2, 2),
        },
        Archetype::Authentic => ArchetypeProfile {
            plausibility: (10, 34),
            loyalty: (5, 30),
            integrity: (70, 95),
            maintenance: (3, 3),
        },
    }
}

/// Roll an archetype from the fixed distribution.
pub fn roll_archetype(rng: &mut DeterministicRng) -> Result<Archetype, RngError> {
    rng.pick_weighted(&Archetype::ALL, &ARCHETYPE_WEIGHTS).copied()
}

/// Roll stats and maintenance cost within an archetype's bands.
pub fn roll_stats(rng: &mut DeterministicRng, archetype: Archetype) -> (UnionStats, u32) {
    let p = profile(archetype);
    let plausibility = rng.next_int_range(p.plausibility.0, p.plausibility.1);
    let loyalty = rng.next_int_range(p.loyalty.0, p.loyalty.1);
    let integrity = rng.next_int_range(p.integrity.0, p.integrity.1);
    let maintenance = rng.next_int_range(p.maintenance.0, p.maintenance.1);
    (UnionStats::new(plausibility, loyalty, integrity), maintenance.max(0) as u32)
}

/// Generated union name and its sector.
pub fn roll_union_name(rng: &mut DeterministicRng, tables: &NameTables) -> Result<(String, String), RngError> {
    let prefix = rng.pick(&tables.prefixes)?;
    let sector = rng.pick(&tables.sectors)?;
    let suffix = rng.pick(&tables.suffixes)?;

    let mut name = format!("{prefix} {sector} {suffix}");
    if rng.next_float() > 0.5 {
        let modifier = rng.pick(&tables.modifiers)?;
        name.push(' ');
        name.push_str(modifier);
    }
    Ok((name, sector.clone()))
}

/// Flavor tags derived from stats. Display only.
fn derived_tags(stats: &UnionStats) -> impl Iterator<Item = &'static str> {
    [
        (stats.integrity() < 25, "paper-thin"),
        (stats.integrity() >= 70, "rank-and-file"),
        (stats.loyalty() >= 70, "compliant"),
        (stats.loyalty() < 35, "restless"),
        (stats.plausibility() >= 75, "photogenic"),
    ]
    .into_iter()
    .filter_map(|(applies, tag)| applies.then_some(tag))
}

/// Generate one union.
///
/// Draw order is fixed: archetype, stats, then name.
pub fn generate_union(rng: &mut DeterministicRng, id: UnionId, tables: &NameTables) -> Result<Union, RngError> {
    let archetype = roll_archetype(rng)?;
    let (stats, maintenance) = roll_stats(rng, archetype);
    let (name, sector) = roll_union_name(rng, tables)?;

    let mut union = Union::new(id, name, sector, archetype, stats, maintenance);
    union.tags.extend(derived_tags(&stats).map(str::to_string));
    Ok(union)
}

/// Name a new federation.
///
/// A roll above 0.5 splices one member's sector into the name.
pub fn generate_federation_name(rng: &mut DeterministicRng, member_sectors: &[&str]) -> Result<String, RngError> {
    let prefix = rng.pick(&FEDERATION_PREFIXES)?;
    let suffix = rng.pick(&FEDERATION_SUFFIXES)?;

    if rng.next_float() > 0.5 {
        let sector = rng.pick(member_sectors)?;
        Ok(format!("{prefix} {sector} {suffix}"))
    } else {
        Ok(format!("{prefix} {suffix}"))
    }
}
