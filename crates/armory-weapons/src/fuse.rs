//! Live thrown entities and their detonation
//!
//! A fuse keeps everything its blast needs (stats, owner, listener snapshot),
//! so it detonates correctly even after the runtime that threw it is gone.

use armory_core::{EntityId, Vec3};
use tracing::debug;

use crate::event::{EventChannel, WeaponEvent, WeaponEventKind, WeaponRef};
use crate::stats::ThrowableStats;
use crate::world::CombatWorld;

/// Damage at `distance` from the blast center with linear falloff
pub fn falloff_damage(damage: f32, distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return damage;
    }
    let t = (distance / radius).clamp(0.0, 1.0);
    damage * (1.0 - t)
}

/// Countdown of one thrown entity
#[derive(Debug)]
pub struct ThrowableFuse {
    entity: EntityId,
    stats: ThrowableStats,
    owner: EntityId,
    channel: EventChannel,
    source: WeaponRef,
    elapsed: f32,
    last_position: Vec3,
}

impl ThrowableFuse {
    pub fn new(
        entity: EntityId,
        position: Vec3,
        stats: ThrowableStats,
        owner: EntityId,
        channel: EventChannel,
        source: WeaponRef,
    ) -> Self {
        Self {
            entity,
            stats,
            owner,
            channel,
            source,
            elapsed: 0.0,
            last_position: position,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn detonate(self, world: &mut dyn CombatWorld) -> Detonation {
        let center = self.last_position;
        let stats = self.stats;

        for overlap in world.overlap_sphere(center, stats.radius) {
            let Some(damageable) = world.damageable_mut(overlap.entity) else {
                continue;
            };
            let amount = if stats.damage_falloff {
                falloff_damage(stats.damage, center.distance(overlap.position), stats.radius)
            } else {
                stats.damage
            };
            damageable.apply_damage(amount, center, Vec3::Y);
        }

        debug!("{} detonated at {:?}", self.source.id(), center);

        Detonation {
            entity: self.entity,
            source: self.source,
            owner: self.owner,
            center,
            channel: self.channel,
        }
    }
}

/// A blast that has applied its damage and still has to be announced
#[derive(Debug)]
pub struct Detonation {
    /// Thrown entity, still alive until the caller despawns it
    pub entity: EntityId,
    pub source: WeaponRef,
    pub owner: EntityId,
    pub center: Vec3,
    channel: EventChannel,
}

impl Detonation {
    /// Announce the blast to the listener snapshot captured at throw time
    pub fn emit_local(&self) {
        let event = WeaponEvent::new(
            WeaponEventKind::ThrowableExplode,
            self.source.clone(),
            self.owner,
            self.center,
            Vec3::ZERO,
        )
        .with_hit_point(self.center);
        self.channel.broadcast(&event);
    }
}

/// Every armed fuse in the simulation
#[derive(Debug, Default)]
pub struct FuseSet {
    fuses: Vec<ThrowableFuse>,
}

impl FuseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, fuse: ThrowableFuse) {
        self.fuses.push(fuse);
    }

    pub fn len(&self) -> usize {
        self.fuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuses.is_empty()
    }

    /// Advance every fuse, detonating those that ran out.
    ///
    /// Damage is applied here; announcing and despawning is left to the caller
    /// in the returned order.
    pub fn tick(&mut self, dt: f32, world: &mut dyn CombatWorld) -> Vec<Detonation> {
        let mut remaining = Vec::with_capacity(self.fuses.len());
        let mut detonations = Vec::new();

        for mut fuse in self.fuses.drain(..) {
            fuse.elapsed += dt;
            if let Some(position) = world.position(fuse.entity) {
                fuse.last_position = position;
            }

            if fuse.elapsed >= fuse.stats.fuse_time {
                detonations.push(fuse.detonate(world));
            } else {
                remaining.push(fuse);
            }
        }

        self.fuses = remaining;
        detonations
    }
}
