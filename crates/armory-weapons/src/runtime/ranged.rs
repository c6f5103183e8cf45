use std::sync::Arc;

use armory_core::{EntityId, Quat, Transform, Vec3};
use rand::Rng;
use tracing::debug;

use super::{flatten, AmmoState, Weapon, WeaponContext};
use crate::config::{RangedPayload, WeaponConfig};
use crate::event::{EventChannel, WeaponEvent, WeaponEventKind};
use crate::scheduler::RuntimeToken;
use crate::stats::{action_interval, RangedStats};
use crate::world::OwnerSnapshot;

/// Gun runtime: fire cadence, magazine, and spread/recoil accumulators
#[derive(Debug)]
pub struct RangedWeapon {
    config: Arc<WeaponConfig>,
    payload: RangedPayload,
    owner: EntityId,
    channel: EventChannel,
    token: RuntimeToken,
    level: u32,
    stats: RangedStats,

    ammo: u32,
    last_fire: f64,
    /// Current dispersion in degrees
    spread: f32,
    recoil: f32,
}

impl RangedWeapon {
    pub fn new(
        config: Arc<WeaponConfig>,
        payload: RangedPayload,
        owner: EntityId,
        channel: EventChannel,
        level: u32,
    ) -> Self {
        let mut weapon = Self {
            config,
            payload,
            owner,
            channel,
            token: RuntimeToken::next(),
            level,
            stats: RangedStats::default(),
            ammo: 0,
            last_fire: f64::NEG_INFINITY,
            spread: 0.0,
            recoil: 0.0,
        };
        weapon.set_level(level);
        weapon
    }

    pub fn stats(&self) -> &RangedStats {
        &self.stats
    }

    pub fn current_ammo(&self) -> u32 {
        self.ammo
    }

    pub fn magazine_size(&self) -> u32 {
        self.stats.magazine_size
    }

    /// Current dispersion in degrees
    pub fn current_spread(&self) -> f32 {
        self.spread
    }

    pub fn current_recoil(&self) -> f32 {
        self.recoil
    }

    fn emit(&self, kind: WeaponEventKind, origin: Vec3, direction: Vec3) -> WeaponEvent {
        WeaponEvent::new(kind, self.weapon_ref(), self.owner, origin, direction)
    }

    /// Horizontal shot direction with the current dispersion applied
    fn shot_direction(&self, aim: Vec3, rng: &mut dyn rand::RngCore) -> Vec3 {
        let forward = flatten(aim).unwrap_or(-Vec3::Z);

        let distance_scale = if self.stats.spread_distance_scale <= 0.0 {
            1.0
        } else {
            1.0 + self.stats.max_range / self.stats.spread_distance_scale
        };
        let half_angle = (self.spread * distance_scale).min(180.0);

        let yaw = if half_angle.is_finite() && half_angle > 0.0 {
            rng.gen_range(-half_angle..=half_angle)
        } else {
            0.0
        };

        let dir = Quat::from_rotation_y(yaw.to_radians()) * forward;
        flatten(dir).unwrap_or(forward)
    }

    /// Resolve a hit-scan shot, returning where the trace ends
    fn trace(&self, origin: Vec3, dir: Vec3, ctx: &mut WeaponContext<'_>) -> Vec3 {
        let max_range = self.stats.max_range;
        let Some(hit) = ctx.world.raycast(origin, dir, max_range) else {
            return origin + dir * max_range;
        };

        if let Some(entity) = hit.entity {
            if let Some(damageable) = ctx.world.damageable_mut(entity) {
                damageable.apply_damage(self.stats.damage, hit.point, hit.normal);
                let event = self
                    .emit(WeaponEventKind::Hit, origin, dir)
                    .with_hit_point(hit.point)
                    .with_target(entity);
                self.channel.broadcast(&event);
            }
        }

        hit.point
    }

    fn launch_projectile(&self, origin: Vec3, dir: Vec3, ctx: &mut WeaponContext<'_>) {
        let Some(template) = self.payload.projectile.as_ref() else {
            return;
        };
        if let Some(entity) = ctx
            .world
            .spawn(template, origin, Transform::rotation_facing(dir))
        {
            ctx.world
                .set_velocity(entity, dir * self.payload.projectile_speed);
        }
    }
}

impl Weapon for RangedWeapon {
    fn config(&self) -> &Arc<WeaponConfig> {
        &self.config
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn token(&self) -> RuntimeToken {
        self.token
    }

    fn set_level(&mut self, level: u32) {
        self.level = level;
        self.stats = self
            .payload
            .progression
            .as_ref()
            .map(|curve| curve.resolve(level))
            .unwrap_or_default();

        self.ammo = self.stats.magazine_size;
        self.spread = 0.0;
        self.recoil = 0.0;
        self.last_fire = f64::NEG_INFINITY;
    }

    fn tick(&mut self, dt: f32) {
        self.spread = (self.spread - self.stats.spread_recovery * dt).max(0.0);
        self.recoil = (self.recoil - self.stats.recoil_recovery * dt).max(0.0);
    }

    fn primary_fire(&mut self, held: bool, ctx: &mut WeaponContext<'_>) {
        if !held {
            return;
        }

        if ctx.now - self.last_fire < action_interval(self.stats.fire_rate) {
            return;
        }

        let origin = ctx.owner.fire_point;
        if self.ammo == 0 {
            let event = self.emit(WeaponEventKind::EmptyTrigger, origin, ctx.owner.aim_direction);
            self.channel.broadcast(&event);
            return;
        }

        self.last_fire = ctx.now;
        self.ammo -= 1;

        let dir = self.shot_direction(ctx.owner.aim_direction, &mut *ctx.rng);
        let trace_end = if self.payload.hit_scan {
            Some(self.trace(origin, dir, ctx))
        } else {
            self.launch_projectile(origin, dir, ctx);
            None
        };

        self.spread = (self.spread + self.stats.spread_per_shot).min(self.stats.max_spread);
        self.recoil = (self.recoil + self.stats.recoil_per_shot).min(self.stats.max_recoil);

        debug!(
            "{} fired, {}/{} rounds left",
            self.config.id, self.ammo, self.stats.magazine_size
        );

        let mut event = self.emit(WeaponEventKind::Fired, origin, dir);
        event.hit_point = trace_end;
        self.channel.broadcast(&event);
    }

    fn reload(&mut self, owner: &OwnerSnapshot) {
        let start = self.emit(WeaponEventKind::ReloadStart, owner.fire_point, owner.aim_direction);
        self.channel.broadcast(&start);

        self.ammo = self.stats.magazine_size;

        let end = self.emit(WeaponEventKind::ReloadEnd, owner.fire_point, owner.aim_direction);
        self.channel.broadcast(&end);
    }

    fn ammo(&self) -> Option<AmmoState> {
        Some(AmmoState {
            current: self.ammo,
            magazine: self.stats.magazine_size,
        })
    }
}
