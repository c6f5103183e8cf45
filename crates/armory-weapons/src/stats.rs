//! Per-category stat blocks and their level modifiers
//!
//! Stat blocks are flat numeric records resolved for a single level. Modifiers
//! are applied cumulatively by a [`ProgressionCurve`](crate::progression::ProgressionCurve).

use serde::{Deserialize, Serialize};

use crate::progression::StatModifier;

/// Lowest rate used when turning a fire/attack rate into an interval
pub const MIN_RATE: f32 = 0.01;

/// Seconds between two actions at the given rate, with the rate floor-clamped
pub fn action_interval(rate: f32) -> f64 {
    1.0 / rate.max(MIN_RATE) as f64
}

/// Resolved stats of a ranged weapon
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedStats {
    /// Damage per hit-scan hit
    pub damage: f32,
    /// Hit-scan range in world units
    pub max_range: f32,
    pub magazine_size: u32,
    /// Shots per second
    pub fire_rate: f32,

    /// Dispersion floor in degrees (scaled by level, not consumed by shot dispersion)
    pub base_spread: f32,
    /// Degrees of spread added per shot
    pub spread_per_shot: f32,
    pub max_spread: f32,
    /// Degrees of spread recovered per second
    pub spread_recovery: f32,
    /// Range at which dispersion doubles; `<= 0` disables distance scaling
    pub spread_distance_scale: f32,

    pub recoil_per_shot: f32,
    pub max_recoil: f32,
    /// Recoil recovered per second
    pub recoil_recovery: f32,
}

/// Per-level change to [`RangedStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedModifier {
    pub damage_mul: f32,
    pub fire_rate_mul: f32,
    /// Scales both per-shot and maximum recoil
    pub recoil_mul: f32,
    /// Scales base, per-shot and maximum spread
    pub spread_mul: f32,
    /// Rounds added to (or removed from) the magazine
    pub bonus_magazine_size: i32,
}

impl Default for RangedModifier {
    fn default() -> Self {
        Self {
            damage_mul: 1.0,
            fire_rate_mul: 1.0,
            recoil_mul: 1.0,
            spread_mul: 1.0,
            bonus_magazine_size: 0,
        }
    }
}

impl StatModifier<RangedStats> for RangedModifier {
    fn apply(&self, mut stats: RangedStats) -> RangedStats {
        stats.damage *= self.damage_mul;
        stats.fire_rate *= self.fire_rate_mul;

        stats.recoil_per_shot *= self.recoil_mul;
        stats.max_recoil *= self.recoil_mul;

        stats.base_spread *= self.spread_mul;
        stats.spread_per_shot *= self.spread_mul;
        stats.max_spread *= self.spread_mul;

        stats.magazine_size = stats
            .magazine_size
            .saturating_add_signed(self.bonus_magazine_size);
        stats
    }
}

/// Resolved stats of a melee weapon
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeStats {
    pub damage: f32,
    /// Sweep radius around the owner root
    pub range: f32,
    /// Swings per second
    pub attack_rate: f32,
    /// Full width of the hit cone in degrees
    pub hit_angle: f32,
}

/// Per-level change to [`MeleeStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeModifier {
    pub damage_mul: f32,
    pub range_mul: f32,
    pub attack_rate_mul: f32,
}

impl Default for MeleeModifier {
    fn default() -> Self {
        Self {
            damage_mul: 1.0,
            range_mul: 1.0,
            attack_rate_mul: 1.0,
        }
    }
}

impl StatModifier<MeleeStats> for MeleeModifier {
    fn apply(&self, mut stats: MeleeStats) -> MeleeStats {
        stats.damage *= self.damage_mul;
        stats.range *= self.range_mul;
        stats.attack_rate *= self.attack_rate_mul;
        stats
    }
}

/// Resolved stats of a throwable
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowableStats {
    /// Launch speed of the thrown entity
    pub throw_force: f32,
    /// Seconds from throw to detonation
    pub fuse_time: f32,
    pub damage: f32,
    /// Blast radius
    pub radius: f32,
    /// Attenuate damage linearly with distance from the blast center
    pub damage_falloff: bool,
}

/// Per-level change to [`ThrowableStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowableModifier {
    pub damage_mul: f32,
    pub radius_mul: f32,
    pub throw_force_mul: f32,
}

impl Default for ThrowableModifier {
    fn default() -> Self {
        Self {
            damage_mul: 1.0,
            radius_mul: 1.0,
            throw_force_mul: 1.0,
        }
    }
}

impl StatModifier<ThrowableStats> for ThrowableModifier {
    fn apply(&self, mut stats: ThrowableStats) -> ThrowableStats {
        stats.damage *= self.damage_mul;
        stats.radius *= self.radius_mul;
        stats.throw_force *= self.throw_force_mul;
        stats
    }
}
