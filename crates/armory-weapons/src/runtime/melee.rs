use std::sync::Arc;

use armory_core::{EntityId, Vec3};
use tracing::debug;

use super::{Weapon, WeaponContext};
use crate::config::{MeleePayload, WeaponConfig};
use crate::event::{EventChannel, WeaponEvent, WeaponEventKind};
use crate::scheduler::{DeferredAction, RuntimeToken};
use crate::stats::{action_interval, MeleeStats};

/// Slack on the range and cone boundaries so targets exactly on them count
const BOUNDARY_EPSILON: f32 = 1e-4;

/// Swing runtime: cooldown gate plus a windup before the hit resolves
#[derive(Debug)]
pub struct MeleeWeapon {
    config: Arc<WeaponConfig>,
    payload: MeleePayload,
    owner: EntityId,
    channel: EventChannel,
    token: RuntimeToken,
    level: u32,
    stats: MeleeStats,

    last_attack: f64,
    attacking: bool,
}

impl MeleeWeapon {
    pub fn new(
        config: Arc<WeaponConfig>,
        payload: MeleePayload,
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
            stats: MeleeStats::default(),
            last_attack: f64::NEG_INFINITY,
            attacking: false,
        };
        weapon.set_level(level);
        weapon
    }

    pub fn stats(&self) -> &MeleeStats {
        &self.stats
    }

    /// Whether a swing is waiting for its windup
    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    fn strike(&mut self, ctx: &mut WeaponContext<'_>) {
        self.attacking = false;

        let origin = ctx.owner.root_position;
        let forward = ctx.owner.aim_direction.normalize_or_zero();
        let range = self.stats.range;
        let half_angle = self.stats.hit_angle * 0.5;

        for overlap in ctx.world.overlap_sphere(origin, range) {
            let mut to_target = overlap.position - origin;
            to_target.y = 0.0;

            if to_target.length() > range + BOUNDARY_EPSILON {
                continue;
            }
            if angle_degrees(forward, to_target) > half_angle + BOUNDARY_EPSILON {
                continue;
            }

            let Some(damageable) = ctx.world.damageable_mut(overlap.entity) else {
                continue;
            };
            damageable.apply_damage(self.stats.damage, overlap.position, -forward);

            let event = WeaponEvent::new(
                WeaponEventKind::MeleeHit,
                self.weapon_ref(),
                self.owner,
                origin,
                forward,
            )
            .with_hit_point(overlap.position)
            .with_target(overlap.entity);
            self.channel.broadcast(&event);
        }
    }
}

/// Unsigned angle in degrees; zero when either vector is degenerate
fn angle_degrees(a: Vec3, b: Vec3) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 0.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

impl Weapon for MeleeWeapon {
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
        self.last_attack = f64::NEG_INFINITY;
        self.attacking = false;
    }

    fn tick(&mut self, _dt: f32) {}

    fn primary_fire(&mut self, held: bool, ctx: &mut WeaponContext<'_>) {
        if !held || self.attacking {
            return;
        }
        if ctx.now - self.last_attack < action_interval(self.stats.attack_rate) {
            return;
        }

        self.last_attack = ctx.now;
        self.attacking = true;

        let swing = WeaponEvent::new(
            WeaponEventKind::MeleeSwing,
            self.weapon_ref(),
            self.owner,
            ctx.owner.fire_point,
            ctx.owner.aim_direction,
        );
        self.channel.broadcast(&swing);

        let windup = self.payload.attack_windup;
        if windup > 0.0 {
            debug!("{} winding up for {:.2}s", self.config.id, windup);
            ctx.scheduler.schedule(
                ctx.now + windup as f64,
                self.owner,
                self.token,
                DeferredAction::MeleeStrike,
            );
        } else {
            self.strike(ctx);
        }
    }

    fn resume(&mut self, action: DeferredAction, ctx: &mut WeaponContext<'_>) {
        match action {
            DeferredAction::MeleeStrike if self.attacking => self.strike(ctx),
            DeferredAction::MeleeStrike => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::WeaponPayload;
    use crate::testing::{melee_config, Harness, RecordingListener};

    fn sword(
        stats: MeleeStats,
        windup: f32,
        owner: EntityId,
    ) -> (MeleeWeapon, Rc<RecordingListener>) {
        let listener = Rc::new(RecordingListener::default());
        let config = Arc::new(melee_config("sword", stats, windup));
        let payload = match &config.payload {
            WeaponPayload::Melee(payload) => payload.clone(),
            _ => unreachable!(),
        };
        let channel = EventChannel::new(vec![listener.clone()]);
        (MeleeWeapon::new(config, payload, owner, channel, 1), listener)
    }

    fn stats() -> MeleeStats {
        MeleeStats {
            damage: 25.0,
            range: 2.0,
            attack_rate: 1.0,
            hit_angle: 90.0,
        }
    }

    /// Point at `distance` from the origin, `degrees` off the -Z aim
    fn at(distance: f32, degrees: f32) -> Vec3 {
        let radians = degrees.to_radians();
        Vec3::new(radians.sin(), 0.0, -radians.cos()) * distance
    }

    #[test]
    fn test_windup_blocks_retrigger() {
        let mut harness = Harness::new();
        let target = harness.world.add_target(at(1.0, 0.0), 0.3);
        let (mut weapon, listener) = sword(stats(), 0.2, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));
        assert!(weapon.is_attacking());
        assert_eq!(harness.scheduler.len(), 1);

        // Mid windup: ignored
        weapon.primary_fire(true, &mut harness.ctx(0.1));
        assert_eq!(listener.kinds(), vec![WeaponEventKind::MeleeSwing]);
        assert_eq!(harness.world.damage_taken(target), 0.0);

        assert!(harness.scheduler.pop_due(0.15).is_empty());
        for task in harness.scheduler.pop_due(0.25) {
            assert_eq!(task.token, weapon.token());
            weapon.resume(task.action, &mut harness.ctx(0.25));
        }
        assert!(!weapon.is_attacking());
        assert_eq!(harness.world.damage_taken(target), 25.0);

        // Cooldown still running after the windup
        weapon.primary_fire(true, &mut harness.ctx(0.5));
        assert_eq!(listener.count(WeaponEventKind::MeleeSwing), 1);

        weapon.primary_fire(true, &mut harness.ctx(1.0));
        assert_eq!(listener.count(WeaponEventKind::MeleeSwing), 2);
    }

    #[test]
    fn test_zero_windup_resolves_immediately() {
        let mut harness = Harness::new();
        let target = harness.world.add_target(at(1.5, 10.0), 0.3);
        let (mut weapon, listener) = sword(stats(), 0.0, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));

        assert!(harness.scheduler.is_empty());
        assert!(!weapon.is_attacking());
        assert_eq!(
            listener.kinds(),
            vec![WeaponEventKind::MeleeSwing, WeaponEventKind::MeleeHit]
        );

        let hit = &listener.events()[1];
        assert_eq!(hit.target, Some(target));
        assert_eq!(hit.hit_point, Some(at(1.5, 10.0)));
        let last = harness.world.last_hit(target).unwrap();
        assert!((last.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_range_boundary() {
        let mut harness = Harness::new();
        let inside = harness.world.add_target(at(2.0, 0.0), 0.3);
        let outside = harness.world.add_target(at(2.01, 5.0), 0.3);
        let (mut weapon, _listener) = sword(stats(), 0.0, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));

        assert_eq!(harness.world.damage_taken(inside), 25.0);
        assert_eq!(harness.world.damage_taken(outside), 0.0);
    }

    #[test]
    fn test_angle_boundary() {
        let mut harness = Harness::new();
        let edge = harness.world.add_target(at(1.5, 45.0), 0.3);
        let beyond = harness.world.add_target(at(1.5, -46.0), 0.3);
        let behind = harness.world.add_target(at(1.5, 180.0), 0.3);
        let (mut weapon, listener) = sword(stats(), 0.0, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));

        assert_eq!(harness.world.damage_taken(edge), 25.0);
        assert_eq!(harness.world.damage_taken(beyond), 0.0);
        assert_eq!(harness.world.damage_taken(behind), 0.0);
        assert_eq!(listener.count(WeaponEventKind::MeleeHit), 1);
    }

    #[test]
    fn test_hits_every_target_in_cone() {
        let mut harness = Harness::new();
        let targets: Vec<EntityId> = [-30.0, 0.0, 30.0]
            .iter()
            .map(|&deg| harness.world.add_target(at(1.0, deg), 0.2))
            .collect();
        harness.world.add_obstacle(at(1.0, 15.0), 0.2);
        let (mut weapon, listener) = sword(stats(), 0.0, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));

        for target in targets {
            assert_eq!(harness.world.damage_taken(target), 25.0);
        }
        assert_eq!(listener.count(WeaponEventKind::MeleeHit), 3);
    }

    #[test]
    fn test_height_difference_is_ignored() {
        let mut harness = Harness::new();
        let target = harness.world.add_target(at(1.0, 0.0) + Vec3::Y * 0.8, 0.3);
        let (mut weapon, _listener) = sword(stats(), 0.0, harness.owner.id);

        weapon.primary_fire(true, &mut harness.ctx(0.0));
        assert_eq!(harness.world.damage_taken(target), 25.0);
    }

    #[test]
    fn test_resume_without_pending_swing_is_noop() {
        let mut harness = Harness::new();
        let target = harness.world.add_target(at(1.0, 0.0), 0.3);
        let (mut weapon, listener) = sword(stats(), 0.2, harness.owner.id);

        weapon.resume(DeferredAction::MeleeStrike, &mut harness.ctx(0.0));
        assert!(listener.kinds().is_empty());
        assert_eq!(harness.world.damage_taken(target), 0.0);
    }

    #[test]
    fn test_set_level_clears_swing() {
        let mut harness = Harness::new();
        let (mut weapon, _listener) = sword(stats(), 0.2, harness.owner.id);
        weapon.primary_fire(true, &mut harness.ctx(0.0));
        assert!(weapon.is_attacking());

        weapon.set_level(2);
        assert!(!weapon.is_attacking());

        weapon.primary_fire(true, &mut harness.ctx(0.0));
        assert!(weapon.is_attacking());
    }

    #[test]
    fn test_angle_of_degenerate_vector_is_zero() {
        assert_eq!(angle_degrees(Vec3::ZERO, -Vec3::Z), 0.0);
        assert!((angle_degrees(Vec3::X, -Vec3::Z) - 90.0).abs() < 1e-4);
    }
}
