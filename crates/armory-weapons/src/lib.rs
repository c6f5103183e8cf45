//! Armory Weapons - Data-driven weapon combat
//!
//! Weapons are described by static [`WeaponConfig`] assets, scaled by a
//! per-level [`ProgressionCurve`], and executed as stateful runtimes that a
//! [`WeaponHolder`] equips, ticks and switches between. Effects are reported
//! through a synchronous [`EventChannel`].

pub mod catalog;
pub mod config;
pub mod event;
pub mod factory;
pub mod fuse;
pub mod holder;
pub mod pool;
pub mod progression;
pub mod runtime;
pub mod scheduler;
pub mod simulation;
pub mod stats;
pub mod tracer;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{CatalogError, WeaponCatalog};
pub use config::{
    FireMode, MeleePayload, PrefabRef, RangedClass, RangedPayload, ThrowablePayload,
    ThrowableType, WeaponCategory, WeaponConfig, WeaponKind, WeaponPayload,
};
pub use event::{EventChannel, WeaponEvent, WeaponEventKind, WeaponEventListener, WeaponRef};
pub use factory::WeaponFactory;
pub use fuse::{falloff_damage, Detonation, FuseSet, ThrowableFuse};
pub use holder::{VisualNode, WeaponHolder, WeaponSlot};
pub use pool::EffectPool;
pub use progression::{
    LevelEntry, MeleeProgression, ProgressionCurve, ProgressionError, RangedProgression,
    StatModifier, ThrowableProgression,
};
pub use runtime::{
    AmmoState, MeleeWeapon, RangedWeapon, ThrowableWeapon, Weapon, WeaponContext,
};
pub use scheduler::{DeferredAction, RuntimeToken, ScheduledTask, Scheduler};
pub use simulation::Simulation;
pub use stats::{
    MeleeModifier, MeleeStats, RangedModifier, RangedStats, ThrowableModifier, ThrowableStats,
};
pub use tracer::{TracerLine, TracerPhase, TracerSettings, TracerSystem};
pub use world::{
    CombatWorld, Damageable, EntitySpawner, OwnerSnapshot, Overlap, RayHit, SpatialQuery,
    WeaponOwner,
};
