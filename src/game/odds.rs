//! Probability Formulas
//!
//! Stat-to-outcome conversions. These are compatibility-critical: seeded
//! runs replay identically only while these stay exact.
//! All rolls are integer draws in [1, 100], success when `roll <= chance`.

use crate::game::state::{Union, UnionStats};

/// Nominal delegates per federation.
pub const DELEGATES_PER_FEDERATION: u32 = 2;

/// License success chance: `min(95, 30 + floor(plausibility * 0.6))`.
pub fn license_chance(stats: &UnionStats) -> u32 {
    // floor(p * 0.6) == (p * 6) / 10 for non-negative integers
    let bonus = stats.plausibility.max(0) as u32 * 6 / 10;
    (30 + bonus).min(95)
}

/// Per-cycle crack risk: `max(5, 40 - floor(integrity * 0.35))`.
pub fn crack_risk(stats: &UnionStats) -> u32 {
    let shield = stats.integrity.max(0) * 35 / 100;
    (40 - shield).max(5) as u32
}

/// Expected secured delegates out of two for a single union.
pub fn union_reliability(stats: &UnionStats) -> f64 {
    f64::from(stats.loyalty) / 100.0 * f64::from(DELEGATES_PER_FEDERATION)
}

/// Average loyalty of a member list, floored.
///
/// Cracked members count as zero loyalty. Comparing an integer roll
/// against the floored average is exact: `roll <= avg` iff
/// `roll <= floor(avg)`.
pub fn average_loyalty<'a>(members: impl IntoIterator<Item = &'a Union>) -> u32 {
    let (sum, count) = members.into_iter().fold((0u32, 0u32), |(sum, count), union| {
        let loyalty = if union.is_cracked { 0 } else { union.stats.loyalty as u32 };
        (sum + loyalty, count + 1)
    });
    if count == 0 {
        0
    } else {
        sum / count
    }
}

/// Expected secured delegates out of two for a federation, from the live
/// average loyalty of its members.
pub fn federation_reliability<'a>(members: impl IntoIterator<Item = &'a Union>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for union in members {
        sum += if union.is_cracked { 0.0 } else { f64::from(union.stats.loyalty) };
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    sum / f64::from(count) / 100.0 * f64::from(DELEGATES_PER_FEDERATION)
}

/// Paperwork refunded by dissolving: `1 + floor(plausibility / 30)`.
pub fn dissolve_reward(stats: &UnionStats) -> i32 {
    1 + stats.plausibility / 30
}

/// Patronage earned by reassigning: `1 + floor(loyalty / 25)`.
pub fn reassign_reward(stats: &UnionStats) -> i32 {
    1 + stats.loyalty / 25
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Archetype, UnionId};

    fn stats(plausibility: i32, loyalty: i32, integrity: i32) -> UnionStats {
        UnionStats::new(plausibility, loyalty, integrity)
    }

    fn member(id: u32, loyalty: i32) -> Union {
        Union::new(UnionId(id), "Local", "Docks", Archetype::Captured, stats(50, loyalty, 50), 1)
    }

    #[test]
    fn test_license_chance_range() {
        assert_eq!(license_chance(&stats(0, 0, 0)), 30);
        assert_eq!(license_chance(&stats(50, 0, 0)), 60);
        // 30 + floor(99 * 0.6) = 30 + 59 = 89
        assert_eq!(license_chance(&stats(99, 0, 0)), 89);
        assert_eq!(license_chance(&stats(100, 0, 0)), 90);
        // Cap only bites with out-of-range input, but the formula keeps it
        assert!(license_chance(&stats(100, 0, 0)) <= 95);
    }

    #[test]
    fn test_crack_risk_range() {
        assert_eq!(crack_risk(&stats(0, 0, 0)), 40);
        // 40 - floor(10 * 0.35) = 40 - 3
        assert_eq!(crack_risk(&stats(0, 0, 10)), 37);
        // 40 - floor(100 * 0.35) = 5
        assert_eq!(crack_risk(&stats(0, 0, 100)), 5);
        assert_eq!(crack_risk(&stats(0, 0, 95)), 7);
    }

    #[test]
    fn test_rewards() {
        assert_eq!(dissolve_reward(&stats(0, 0, 0)), 1);
        assert_eq!(dissolve_reward(&stats(29, 0, 0)), 1);
        assert_eq!(dissolve_reward(&stats(30, 0, 0)), 2);
        assert_eq!(dissolve_reward(&stats(95, 0, 0)), 4);

        assert_eq!(reassign_reward(&stats(0, 24, 0)), 1);
        assert_eq!(reassign_reward(&stats(0, 25, 0)), 2);
        assert_eq!(reassign_reward(&stats(0, 100, 0)), 5);
    }

    #[test]
    fn test_union_reliability() {
        assert_eq!(union_reliability(&stats(0, 100, 0)), 2.0);
        assert_eq!(union_reliability(&stats(0, 50, 0)), 1.0);
        assert_eq!(union_reliability(&stats(0, 0, 0)), 0.0);
    }

    #[test]
    fn test_federation_reliability_is_live_average() {
        let a = member(1, 80);
        let mut b = member(2, 40);
        assert_eq!(average_loyalty([&a, &b]), 60);
        assert!((federation_reliability([&a, &b]) - 1.2).abs() < 1e-9);

        b.is_cracked = true;
        assert_eq!(average_loyalty([&a, &b]), 40);
        assert!((federation_reliability([&a, &b]) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_average_loyalty_floors() {
        let a = member(1, 51);
        let b = member(2, 50);
        assert_eq!(average_loyalty([&a, &b]), 50);
        assert_eq!(average_loyalty(std::iter::empty()), 0);
    }
}
