use std::sync::Arc;

use armory_core::{EntityId, Transform, Vec3};
use tracing::{debug, warn};

use super::{Weapon, WeaponContext};
use crate::config::{ThrowablePayload, WeaponConfig};
use crate::event::{EventChannel, WeaponEvent, WeaponEventKind};
use crate::fuse::ThrowableFuse;
use crate::scheduler::RuntimeToken;
use crate::stats::ThrowableStats;

/// Grenade-style runtime: one throw per trigger press
#[derive(Debug)]
pub struct ThrowableWeapon {
    config: Arc<WeaponConfig>,
    payload: ThrowablePayload,
    owner: EntityId,
    channel: EventChannel,
    token: RuntimeToken,
    level: u32,
    stats: ThrowableStats,

    held_last_frame: bool,
}

impl ThrowableWeapon {
    pub fn new(
        config: Arc<WeaponConfig>,
        payload: ThrowablePayload,
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
            stats: ThrowableStats::default(),
            held_last_frame: false,
        };
        weapon.set_level(level);
        weapon
    }

    pub fn stats(&self) -> &ThrowableStats {
        &self.stats
    }

    fn throw(&self, ctx: &mut WeaponContext<'_>) {
        let Some(template) = self.payload.projectile.as_ref() else {
            return;
        };

        let origin = ctx.owner.fire_point;
        let dir = ctx.owner.aim_direction.normalize_or_zero();

        let Some(entity) = ctx
            .world
            .spawn(template, origin, Transform::rotation_facing(dir))
        else {
            warn!(
                "Throwable '{}' could not spawn template '{}'",
                self.config.id,
                template.name()
            );
            return;
        };

        let launch = (dir + Vec3::Y * self.payload.arc_height).normalize_or_zero();
        ctx.world.set_velocity(entity, launch * self.stats.throw_force);

        ctx.fuses.arm(ThrowableFuse::new(
            entity,
            origin,
            self.stats,
            self.owner,
            self.channel.clone(),
            self.weapon_ref(),
        ));
        debug!("{} thrown, fuse {:.2}s", self.config.id, self.stats.fuse_time);

        let event = WeaponEvent::new(
            WeaponEventKind::ThrowableThrow,
            self.weapon_ref(),
            self.owner,
            origin,
            dir,
        );
        self.channel.broadcast(&event);
    }
}

impl Weapon for ThrowableWeapon {
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
    }

    fn tick(&mut self, _dt: f32) {}

    fn primary_fire(&mut self, held: bool, ctx: &mut WeaponContext<'_>) {
        if held && !self.held_last_frame {
            self.throw(ctx);
        }
        self.held_last_frame = held;
    }

    fn notify_explosion(&mut self, center: Vec3) {
        let event = WeaponEvent::new(
            WeaponEventKind::ThrowableExplode,
            self.weapon_ref(),
            self.owner,
            center,
            Vec3::ZERO,
        )
        .with_hit_point(center);
        self.channel.broadcast(&event);
    }
}
