//! Armory Physics - rapier3d arena the weapon layer fires into
//!
//! [`ArenaWorld`] implements [`CombatWorld`]: hit-scan rays and blast overlaps
//! run on the rapier query pipeline, thrown entities and projectiles are
//! dynamic bodies, and targets are static ball colliders carrying health.
//! Every collider that stands for an entity stores its [`EntityId`] in
//! `user_data`; level geometry stores zero.

use std::collections::HashMap;

use armory_core::{EntityId, Quat, Vec3};
use armory_weapons::{
    CombatWorld, Damageable, EntitySpawner, Overlap, PrefabRef, RayHit, SpatialQuery,
};
use nalgebra::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use tracing::{debug, info, warn};

/// Physics world configuration
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 on Y axis)
    pub gravity: Vec3,
    /// Physics timestep (default: 1/60)
    pub timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 60.0,
        }
    }
}

/// Body shape spawned for a named template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTemplate {
    pub radius: f32,
    /// 0 for straight-flying rockets, 1 for lobbed grenades
    pub gravity_scale: f32,
    pub restitution: f32,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self {
            radius: 0.1,
            gravity_scale: 1.0,
            restitution: 0.3,
        }
    }
}

/// Hit points of a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHealth {
    pub current: f32,
    pub max: f32,
    /// Where the last damage landed
    pub last_hit: Option<(Vec3, Vec3)>,
}

impl TargetHealth {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            last_hit: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Damageable for TargetHealth {
    fn apply_damage(&mut self, amount: f32, hit_point: Vec3, hit_normal: Vec3) {
        self.current = (self.current - amount).max(0.0);
        self.last_hit = Some((hit_point, hit_normal));
    }
}

struct Target {
    collider: ColliderHandle,
    health: TargetHealth,
}

/// Combat arena on top of rapier3d
pub struct ArenaWorld {
    /// Configuration
    pub config: PhysicsConfig,

    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,

    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    targets: HashMap<EntityId, Target>,
    bodies: HashMap<EntityId, RigidBodyHandle>,
    templates: HashMap<String, ProjectileTemplate>,
}

impl ArenaWorld {
    /// Create an empty arena with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep;

        Self {
            config,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            targets: HashMap::new(),
            bodies: HashMap::new(),
            templates: HashMap::new(),
        }
    }

    /// Step the physics simulation by one timestep
    pub fn step(&mut self) {
        let gravity = to_vector(self.config.gravity);

        self.physics_pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        self.query_pipeline.update(&self.collider_set);
    }

    /// Make `name` spawnable
    pub fn register_template(&mut self, name: impl Into<String>, template: ProjectileTemplate) {
        let name = name.into();
        debug!("Registered projectile template '{}'", name);
        self.templates.insert(name, template);
    }

    /// Static damageable ball
    pub fn add_target(&mut self, position: Vec3, radius: f32, health: f32) -> EntityId {
        let id = EntityId::new();
        let collider = ColliderBuilder::ball(radius)
            .translation(to_vector(position))
            .user_data(id.as_u128())
            .build();
        let collider = self.collider_set.insert(collider);
        self.targets.insert(
            id,
            Target {
                collider,
                health: TargetHealth::new(health),
            },
        );
        self.query_pipeline.update(&self.collider_set);
        id
    }

    pub fn target_health(&self, id: EntityId) -> Option<&TargetHealth> {
        self.targets.get(&id).map(|target| &target.health)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Ground plane at height `y`
    pub fn create_ground(&mut self, y: f32) -> ColliderHandle {
        let normal = nalgebra::Unit::new_normalize(vector![0.0, 1.0, 0.0]);
        let ground = ColliderBuilder::halfspace(normal)
            .translation(vector![0.0, y, 0.0])
            .friction(0.7)
            .restitution(0.0)
            .build();
        self.add_static_collider(ground)
    }

    /// Wall or crate; blocks rays but takes no damage
    pub fn create_static_box(&mut self, half_extents: Vec3, position: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_vector(position))
            .friction(0.7)
            .build();
        self.add_static_collider(collider)
    }

    fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        let handle = self.collider_set.insert(collider);
        self.query_pipeline.update(&self.collider_set);
        handle
    }

    /// Number of live spawned bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn entity_of(&self, handle: ColliderHandle) -> Option<EntityId> {
        let bits = self.collider_set.get(handle)?.user_data;
        (bits != 0).then(|| EntityId::from_u128(bits))
    }
}

impl Default for ArenaWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialQuery for ArenaWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_vector(direction));

        // Spawned bodies never block shots
        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                QueryFilter::exclude_dynamic(),
            )
            .map(|(handle, intersection)| RayHit {
                entity: self.entity_of(handle),
                point: origin + direction * intersection.time_of_impact,
                normal: from_vector(&intersection.normal),
                distance: intersection.time_of_impact,
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap> {
        let mut overlaps = Vec::new();
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape,
            QueryFilter::exclude_dynamic(),
            |handle| {
                if let (Some(entity), Some(collider)) =
                    (self.entity_of(handle), self.collider_set.get(handle))
                {
                    overlaps.push(Overlap {
                        entity,
                        position: from_vector(collider.translation()),
                    });
                }
                true
            },
        );
        overlaps
    }
}

impl EntitySpawner for ArenaWorld {
    fn spawn(&mut self, template: &PrefabRef, position: Vec3, rotation: Quat) -> Option<EntityId> {
        let Some(shape) = self.templates.get(template.name()).copied() else {
            warn!("Unknown projectile template '{}'", template.name());
            return None;
        };

        let id = EntityId::new();
        let body = RigidBodyBuilder::dynamic()
            .position(to_isometry(position, rotation))
            .gravity_scale(shape.gravity_scale)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::ball(shape.radius)
            .restitution(shape.restitution)
            .user_data(id.as_u128())
            .build();

        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.bodies.insert(id, handle);
        debug!("Spawned '{}' at {:?}", template.name(), position);
        Some(id)
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec3) {
        let Some(body) = self
            .bodies
            .get(&entity)
            .and_then(|handle| self.rigid_body_set.get_mut(*handle))
        else {
            return;
        };
        body.set_linvel(to_vector(velocity), true);
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        if let Some(handle) = self.bodies.get(&entity) {
            return self
                .rigid_body_set
                .get(*handle)
                .map(|body| from_vector(body.translation()));
        }
        self.targets
            .get(&entity)
            .and_then(|target| self.collider_set.get(target.collider))
            .map(|collider| from_vector(collider.translation()))
    }

    fn despawn(&mut self, entity: EntityId) {
        let Some(handle) = self.bodies.remove(&entity) else {
            return;
        };
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);
    }
}

impl CombatWorld for ArenaWorld {
    fn damageable_mut(&mut self, entity: EntityId) -> Option<&mut dyn Damageable> {
        self.targets
            .get_mut(&entity)
            .map(|target| &mut target.health as &mut dyn Damageable)
    }
}

/// Log every target's remaining health
pub fn report_targets(world: &ArenaWorld) {
    for (id, target) in &world.targets {
        info!(
            "Target {}: {:.1}/{:.1} hp",
            id.0, target.health.current, target.health.max
        );
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let rotation = UnitQuaternion::new_normalize(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use armory_core::TimeConfig;
    use armory_weapons::{
        RangedPayload, RangedClass, RangedProgression, RangedStats, Simulation, TracerSettings,
        WeaponConfig, WeaponHolder, WeaponSlot,
    };

    use super::*;

    #[test]
    fn test_raycast_hits_target() {
        let mut world = ArenaWorld::new();
        let target = world.add_target(Vec3::new(0.0, 1.0, -10.0), 0.5, 100.0);

        let hit = world.raycast(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z, 100.0).unwrap();
        assert_eq!(hit.entity, Some(target));
        assert!((hit.distance - 9.5).abs() < 1e-3);
        assert!((hit.normal - Vec3::Z).length() < 1e-3);
    }

    #[test]
    fn test_wall_blocks_without_entity() {
        let mut world = ArenaWorld::new();
        world.add_target(Vec3::new(0.0, 1.0, -10.0), 0.5, 100.0);
        world.create_static_box(Vec3::new(2.0, 2.0, 0.1), Vec3::new(0.0, 1.0, -5.0));

        let hit = world.raycast(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z, 100.0).unwrap();
        assert!(hit.entity.is_none());
        assert!(hit.distance < 5.0);
    }

    #[test]
    fn test_overlap_finds_targets_only() {
        let mut world = ArenaWorld::new();
        world.create_ground(0.0);
        let near = world.add_target(Vec3::new(1.0, 1.0, 0.0), 0.5, 100.0);
        world.add_target(Vec3::new(20.0, 1.0, 0.0), 0.5, 100.0);

        let overlaps = world.overlap_sphere(Vec3::new(0.0, 1.0, 0.0), 3.0);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].entity, near);
        assert!((overlaps[0].position - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_damage_reduces_health() {
        let mut world = ArenaWorld::new();
        let target = world.add_target(Vec3::ZERO, 0.5, 30.0);

        let health = world.damageable_mut(target).unwrap();
        health.apply_damage(20.0, Vec3::ZERO, Vec3::Y);
        health.apply_damage(20.0, Vec3::ZERO, Vec3::Y);

        let health = world.target_health(target).unwrap();
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead());
        assert_eq!(health.last_hit, Some((Vec3::ZERO, Vec3::Y)));
        assert!(world.damageable_mut(EntityId::new()).is_none());
    }

    #[test]
    fn test_unknown_template_spawns_nothing() {
        let mut world = ArenaWorld::new();
        let spawned = world.spawn(&PrefabRef::new("missing"), Vec3::ZERO, Quat::IDENTITY);
        assert!(spawned.is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_spawned_body_moves_and_despawns() {
        let mut world = ArenaWorld::new();
        world.register_template(
            "rocket",
            ProjectileTemplate {
                gravity_scale: 0.0,
                ..Default::default()
            },
        );
        let start = Vec3::new(0.0, 5.0, 0.0);
        let rocket = world
            .spawn(&PrefabRef::new("rocket"), start, Quat::IDENTITY)
            .unwrap();
        assert_eq!(world.position(rocket), Some(start));

        world.set_velocity(rocket, Vec3::new(0.0, 0.0, -10.0));
        for _ in 0..10 {
            world.step();
        }
        let moved = world.position(rocket).unwrap();
        assert!(moved.z < -1.0);

        world.despawn(rocket);
        assert!(world.position(rocket).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_rifle_damages_arena_target() {
        let mut world = ArenaWorld::new();
        let target = world.add_target(Vec3::new(0.0, 0.0, -10.0), 0.5, 100.0);

        let stats = RangedStats {
            damage: 10.0,
            max_range: 100.0,
            magazine_size: 3,
            fire_rate: 10.0,
            ..Default::default()
        };
        let config = WeaponConfig::ranged(
            "rifle",
            "Rifle",
            RangedPayload::hit_scan(RangedClass::AssaultRifle, RangedProgression::flat(stats)),
        );
        let mut sim = Simulation::new(TimeConfig::default(), TracerSettings::default(), 1);
        let tracers = sim.tracer_listener();
        let owner = sim.add_holder(WeaponHolder::new(
            EntityId::new(),
            vec![WeaponSlot::new(Arc::new(config))],
            vec![tracers],
        ));
        sim.holder_mut(owner).unwrap().set_fire_input(true);

        for _ in 0..60 {
            sim.step(1.0 / 60.0, &mut world);
            world.step();
        }

        let health = world.target_health(target).unwrap();
        assert_eq!(health.current, 70.0);
        assert_eq!(sim.tracers().borrow().pool().created_count(), 20);
    }
}
