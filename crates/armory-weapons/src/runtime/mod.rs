//! Weapon runtimes
//!
//! One [`Weapon`] instance exists per equip. It owns the resolved stats for its
//! level and whatever accumulators its category needs, and is thrown away when
//! the holder switches.

mod melee;
mod ranged;
mod throwable;

pub use melee::MeleeWeapon;
pub use ranged::RangedWeapon;
pub use throwable::ThrowableWeapon;

use std::sync::Arc;

use armory_core::Vec3;
use rand::RngCore;

use crate::config::{WeaponCategory, WeaponConfig};
use crate::event::WeaponRef;
use crate::fuse::FuseSet;
use crate::scheduler::{DeferredAction, RuntimeToken, Scheduler};
use crate::world::{CombatWorld, OwnerSnapshot};

/// Everything a runtime may touch during one action
pub struct WeaponContext<'a> {
    /// Clock snapshot for timing gates
    pub now: f64,
    /// Owner state sampled for this action
    pub owner: OwnerSnapshot,
    pub world: &'a mut dyn CombatWorld,
    pub scheduler: &'a mut Scheduler,
    pub fuses: &'a mut FuseSet,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> WeaponContext<'a> {
    pub fn new(
        now: f64,
        owner: OwnerSnapshot,
        world: &'a mut dyn CombatWorld,
        scheduler: &'a mut Scheduler,
        fuses: &'a mut FuseSet,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            now,
            owner,
            world,
            scheduler,
            fuses,
            rng,
        }
    }
}

/// Magazine readout for HUD collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmoState {
    pub current: u32,
    pub magazine: u32,
}

/// Common contract of every weapon runtime
pub trait Weapon {
    fn config(&self) -> &Arc<WeaponConfig>;

    fn level(&self) -> u32;

    fn token(&self) -> RuntimeToken;

    fn category(&self) -> WeaponCategory {
        self.config().category()
    }

    /// Reference stamped on every event this runtime emits
    fn weapon_ref(&self) -> WeaponRef {
        WeaponRef {
            token: self.token(),
            config: Arc::clone(self.config()),
            level: self.level(),
        }
    }

    /// Re-resolve stats for `level` and reset per-level state
    fn set_level(&mut self, level: u32);

    /// Per-frame recovery
    fn tick(&mut self, dt: f32);

    /// Fire input for this frame
    fn primary_fire(&mut self, held: bool, ctx: &mut WeaponContext<'_>);

    fn reload(&mut self, _owner: &OwnerSnapshot) {}

    /// Continue work this runtime deferred through the scheduler
    fn resume(&mut self, _action: DeferredAction, _ctx: &mut WeaponContext<'_>) {}

    /// One of this runtime's thrown entities detonated at `center`
    fn notify_explosion(&mut self, _center: Vec3) {}

    /// Magazine state, for weapons that have one
    fn ammo(&self) -> Option<AmmoState> {
        None
    }
}

/// `v` with Y zeroed and normalized, or `None` when nearly vertical or zero
pub(crate) fn flatten(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    if flat.length_squared() < 1e-4 {
        None
    } else {
        Some(flat.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten() {
        let flat = flatten(Vec3::new(3.0, 5.0, 4.0)).unwrap();
        assert!((flat - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-5);
        assert!(flatten(Vec3::Y).is_none());
        assert!(flatten(Vec3::ZERO).is_none());
    }
}
