//! Shared fakes for unit tests

use std::cell::RefCell;

use armory_core::{EntityId, Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{
    MeleePayload, PrefabRef, RangedClass, RangedPayload, ThrowablePayload, WeaponConfig,
};
use crate::event::{WeaponEvent, WeaponEventKind, WeaponEventListener};
use crate::fuse::FuseSet;
use crate::progression::{MeleeProgression, RangedProgression, ThrowableProgression};
use crate::runtime::WeaponContext;
use crate::scheduler::Scheduler;
use crate::stats::{MeleeStats, RangedStats, ThrowableStats};
use crate::world::{
    CombatWorld, Damageable, EntitySpawner, OwnerSnapshot, Overlap, RayHit, SpatialQuery,
};

/// One recorded `apply_damage` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeHit {
    pub amount: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// A sphere in the fake world
#[derive(Debug)]
pub struct FakeTarget {
    pub id: EntityId,
    pub position: Vec3,
    pub radius: f32,
    pub damageable: bool,
    pub hits: Vec<FakeHit>,
}

impl Damageable for FakeTarget {
    fn apply_damage(&mut self, amount: f32, hit_point: Vec3, hit_normal: Vec3) {
        self.hits.push(FakeHit {
            amount,
            point: hit_point,
            normal: hit_normal,
        });
    }
}

/// Something a weapon spawned
#[derive(Debug, Clone)]
pub struct FakeSpawn {
    pub id: EntityId,
    pub template: PrefabRef,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

/// Static sphere world; spawned entities never move on their own
#[derive(Debug, Default)]
pub struct FakeWorld {
    pub targets: Vec<FakeTarget>,
    spawned: Vec<FakeSpawn>,
    despawned: Vec<EntityId>,
    /// Make every spawn fail, as with an unknown template
    pub reject_spawns: bool,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, position: Vec3, radius: f32, damageable: bool) -> EntityId {
        let id = EntityId::new();
        self.targets.push(FakeTarget {
            id,
            position,
            radius,
            damageable,
            hits: Vec::new(),
        });
        id
    }

    /// Damageable sphere
    pub fn add_target(&mut self, position: Vec3, radius: f32) -> EntityId {
        self.insert(position, radius, true)
    }

    /// Blocking sphere without a damage capability
    pub fn add_obstacle(&mut self, position: Vec3, radius: f32) -> EntityId {
        self.insert(position, radius, false)
    }

    pub fn damage_taken(&self, id: EntityId) -> f32 {
        self.targets
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.hits.iter().map(|h| h.amount).sum())
            .unwrap_or(0.0)
    }

    pub fn last_hit(&self, id: EntityId) -> Option<FakeHit> {
        self.targets
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| t.hits.last().copied())
    }

    pub fn spawned(&self) -> &[FakeSpawn] {
        &self.spawned
    }

    pub fn despawned(&self) -> &[EntityId] {
        &self.despawned
    }

    /// Spawn directly, bypassing a weapon
    pub fn spawn_at(&mut self, template: &str, position: Vec3) -> EntityId {
        let id = EntityId::new();
        self.spawned.push(FakeSpawn {
            id,
            template: PrefabRef::new(template),
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        });
        id
    }

    pub fn move_entity(&mut self, id: EntityId, position: Vec3) {
        if let Some(spawn) = self.spawned.iter_mut().find(|s| s.id == id) {
            spawn.position = position;
        }
    }
}

impl SpatialQuery for FakeWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.targets
            .iter()
            .filter_map(|target| {
                // Ray/sphere intersection, nearest root in front of the origin
                let to_origin = origin - target.position;
                let b = to_origin.dot(direction);
                let c = to_origin.length_squared() - target.radius * target.radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let distance = -b - discriminant.sqrt();
                if !(0.0..=max_distance).contains(&distance) {
                    return None;
                }
                let point = origin + direction * distance;
                Some(RayHit {
                    entity: Some(target.id),
                    point,
                    normal: (point - target.position).normalize_or_zero(),
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap> {
        self.targets
            .iter()
            .filter(|target| center.distance(target.position) <= radius + target.radius + 1e-3)
            .map(|target| Overlap {
                entity: target.id,
                position: target.position,
            })
            .collect()
    }
}

impl EntitySpawner for FakeWorld {
    fn spawn(&mut self, template: &PrefabRef, position: Vec3, rotation: Quat) -> Option<EntityId> {
        if self.reject_spawns {
            return None;
        }
        let id = EntityId::new();
        self.spawned.push(FakeSpawn {
            id,
            template: template.clone(),
            position,
            rotation,
            velocity: Vec3::ZERO,
        });
        Some(id)
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec3) {
        if let Some(spawn) = self.spawned.iter_mut().find(|s| s.id == entity) {
            spawn.velocity = velocity;
        }
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.spawned
            .iter()
            .find(|s| s.id == entity)
            .map(|s| s.position)
    }

    fn despawn(&mut self, entity: EntityId) {
        self.spawned.retain(|s| s.id != entity);
        self.despawned.push(entity);
    }
}

impl CombatWorld for FakeWorld {
    fn damageable_mut(&mut self, entity: EntityId) -> Option<&mut dyn Damageable> {
        self.targets
            .iter_mut()
            .find(|t| t.id == entity && t.damageable)
            .map(|t| t as &mut dyn Damageable)
    }
}

/// Records every event it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: RefCell<Vec<WeaponEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<WeaponEvent> {
        self.events.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<WeaponEventKind> {
        self.events.borrow().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: WeaponEventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind == kind).count()
    }
}

impl WeaponEventListener for RecordingListener {
    fn on_weapon_event(&self, event: &WeaponEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// World, queues and an owner at the origin aiming down -Z
pub struct Harness {
    pub world: FakeWorld,
    pub scheduler: Scheduler,
    pub fuses: FuseSet,
    pub rng: StdRng,
    pub owner: OwnerSnapshot,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            world: FakeWorld::new(),
            scheduler: Scheduler::new(),
            fuses: FuseSet::new(),
            rng: StdRng::seed_from_u64(42),
            owner: OwnerSnapshot::default(),
        }
    }

    pub fn ctx(&mut self, now: f64) -> WeaponContext<'_> {
        WeaponContext::new(
            now,
            self.owner,
            &mut self.world,
            &mut self.scheduler,
            &mut self.fuses,
            &mut self.rng,
        )
    }
}

/// Accurate rifle: 10 damage, 100 range, no spread or recoil
pub fn rifle_stats(magazine_size: u32, fire_rate: f32) -> RangedStats {
    RangedStats {
        damage: 10.0,
        max_range: 100.0,
        magazine_size,
        fire_rate,
        ..Default::default()
    }
}

pub fn ranged_config(id: &str, stats: RangedStats) -> WeaponConfig {
    WeaponConfig::ranged(
        id,
        id,
        RangedPayload::hit_scan(RangedClass::AssaultRifle, RangedProgression::flat(stats)),
    )
}

pub fn melee_config(id: &str, stats: MeleeStats, windup: f32) -> WeaponConfig {
    WeaponConfig::melee(id, id, MeleePayload::new(windup, MeleeProgression::flat(stats)))
}

/// The "knife": 10 damage, 2 range, one swing per second, 90 degree cone
pub fn knife_config(windup: f32) -> WeaponConfig {
    let stats = MeleeStats {
        damage: 10.0,
        range: 2.0,
        attack_rate: 1.0,
        hit_angle: 90.0,
    };
    melee_config("knife", stats, windup)
}

/// Grenade throwing at force 10 for 100 damage, spawning the "grenade" template
pub fn grenade_config(id: &str, fuse_time: f32, radius: f32, damage_falloff: bool) -> WeaponConfig {
    let stats = ThrowableStats {
        throw_force: 10.0,
        fuse_time,
        damage: 100.0,
        radius,
        damage_falloff,
    };
    WeaponConfig::throwable(
        id,
        id,
        ThrowablePayload::new(PrefabRef::new("grenade"), ThrowableProgression::flat(stats)),
    )
}
