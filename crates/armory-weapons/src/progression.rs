//! Level progression curves
//!
//! A curve is a base stat block plus level entries sorted ascending by level.
//! Resolving level N folds every entry with `level <= N` onto the base, in order.

use serde::Deserialize;

use crate::stats::{
    MeleeModifier, MeleeStats, RangedModifier, RangedStats, ThrowableModifier, ThrowableStats,
};

/// A per-level change applied on top of the running stat block
pub trait StatModifier<S> {
    fn apply(&self, stats: S) -> S;
}

/// One level threshold of a curve
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelEntry<M> {
    pub level: u32,
    /// Experience needed to reach this level
    #[serde(default)]
    pub required_experience: u32,
    pub modifier: M,
}

/// Errors raised while building a curve
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("level {0} appears more than once in the progression curve")]
    DuplicateLevel(u32),
}

/// Raw, unvalidated curve as it appears in configuration files
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionData<S, M> {
    pub base: S,
    #[serde(default = "Vec::new")]
    pub levels: Vec<LevelEntry<M>>,
}

/// Validated progression curve: entries sorted ascending, one per level
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    try_from = "ProgressionData<S, M>",
    bound(deserialize = "S: Deserialize<'de>, M: Deserialize<'de>")
)]
pub struct ProgressionCurve<S, M> {
    base: S,
    levels: Vec<LevelEntry<M>>,
}

pub type RangedProgression = ProgressionCurve<RangedStats, RangedModifier>;
pub type MeleeProgression = ProgressionCurve<MeleeStats, MeleeModifier>;
pub type ThrowableProgression = ProgressionCurve<ThrowableStats, ThrowableModifier>;

impl<S, M> ProgressionCurve<S, M> {
    /// Build a curve, sorting the entries by level and rejecting duplicates
    pub fn new(base: S, mut levels: Vec<LevelEntry<M>>) -> Result<Self, ProgressionError> {
        levels.sort_by_key(|entry| entry.level);
        if let Some(pair) = levels.windows(2).find(|pair| pair[0].level == pair[1].level) {
            return Err(ProgressionError::DuplicateLevel(pair[0].level));
        }
        Ok(Self { base, levels })
    }

    /// A curve with no level entries
    pub fn flat(base: S) -> Self {
        Self {
            base,
            levels: Vec::new(),
        }
    }

    pub fn base(&self) -> &S {
        &self.base
    }

    pub fn levels(&self) -> &[LevelEntry<M>] {
        &self.levels
    }

    /// Highest level with an entry, if any
    pub fn max_level(&self) -> Option<u32> {
        self.levels.last().map(|entry| entry.level)
    }

    /// Experience threshold stored for exactly `level`.
    ///
    /// `None` means the curve has no entry for that level, which is distinct
    /// from an entry whose threshold is zero.
    pub fn required_experience(&self, level: u32) -> Option<u32> {
        self.levels
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.required_experience)
    }
}

impl<S: Clone, M: StatModifier<S>> ProgressionCurve<S, M> {
    /// Effective stats at `level`.
    ///
    /// Levels below the first entry resolve to the base block; levels past the
    /// last entry resolve to the fully modified block.
    pub fn resolve(&self, level: u32) -> S {
        self.levels
            .iter()
            .take_while(|entry| entry.level <= level)
            .fold(self.base.clone(), |stats, entry| entry.modifier.apply(stats))
    }
}

impl<S, M> TryFrom<ProgressionData<S, M>> for ProgressionCurve<S, M> {
    type Error = ProgressionError;

    fn try_from(data: ProgressionData<S, M>) -> Result<Self, Self::Error> {
        Self::new(data.base, data.levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn melee_base() -> MeleeStats {
        MeleeStats {
            damage: 10.0,
            range: 2.0,
            attack_rate: 1.0,
            hit_angle: 90.0,
        }
    }

    fn entry(level: u32, xp: u32, damage_mul: f32) -> LevelEntry<MeleeModifier> {
        LevelEntry {
            level,
            required_experience: xp,
            modifier: MeleeModifier {
                damage_mul,
                ..Default::default()
            },
        }
    }

    fn curve() -> MeleeProgression {
        ProgressionCurve::new(
            melee_base(),
            vec![entry(2, 100, 2.0), entry(3, 250, 1.5), entry(5, 0, 2.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_below_first_entry_is_base() {
        let curve = curve();
        assert_eq!(curve.resolve(0), melee_base());
        assert_eq!(curve.resolve(1), melee_base());
    }

    #[test]
    fn test_entries_apply_in_ascending_order() {
        let curve = curve();
        assert_eq!(curve.resolve(2).damage, 20.0);
        assert_eq!(curve.resolve(3).damage, 30.0);
        // No entry at 4: same as level 3
        assert_eq!(curve.resolve(4).damage, 30.0);
        assert_eq!(curve.resolve(5).damage, 60.0);
    }

    #[test]
    fn test_past_last_entry_is_fully_modified() {
        let curve = curve();
        assert_eq!(curve.resolve(99), curve.resolve(5));
        assert_eq!(curve.resolve(u32::MAX).damage, 60.0);
    }

    #[test]
    fn test_higher_levels_have_no_effect() {
        let low = ProgressionCurve::new(melee_base(), vec![entry(2, 100, 2.0)]).unwrap();
        let with_high = ProgressionCurve::new(
            melee_base(),
            vec![entry(2, 100, 2.0), entry(7, 900, 10.0)],
        )
        .unwrap();
        for level in 0..7 {
            assert_eq!(low.resolve(level), with_high.resolve(level));
        }
        assert_ne!(low.resolve(7), with_high.resolve(7));
    }

    #[test]
    fn test_unsorted_entries_are_sorted() {
        let curve = ProgressionCurve::new(
            melee_base(),
            vec![entry(5, 0, 2.0), entry(2, 100, 2.0), entry(3, 250, 1.5)],
        )
        .unwrap();
        let levels: Vec<u32> = curve.levels().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![2, 3, 5]);
        assert_eq!(curve.max_level(), Some(5));
    }

    #[test]
    fn test_duplicate_level_rejected() {
        let result = ProgressionCurve::new(
            melee_base(),
            vec![entry(2, 100, 2.0), entry(4, 300, 1.0), entry(2, 150, 3.0)],
        );
        assert_eq!(result.unwrap_err(), ProgressionError::DuplicateLevel(2));
    }

    #[test]
    fn test_required_experience_distinguishes_missing() {
        let curve = curve();
        assert_eq!(curve.required_experience(2), Some(100));
        assert_eq!(curve.required_experience(3), Some(250));
        assert_eq!(curve.required_experience(5), Some(0));
        assert_eq!(curve.required_experience(4), None);
    }

    #[test]
    fn test_flat_curve() {
        let curve = MeleeProgression::flat(melee_base());
        assert_eq!(curve.resolve(10), melee_base());
        assert_eq!(curve.max_level(), None);
    }
}
