//! Collaborators the weapon layer acts on
//!
//! Weapons only see the world through these traits: a spatial query, a
//! damage capability on targets, a spawner for projectiles, and the owner
//! that supplies fire point and aim.

use armory_core::{EntityId, Quat, Vec3};

use crate::config::PrefabRef;

/// First blocking surface along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity that owns the surface, if it is one the world tracks
    pub entity: Option<EntityId>,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// An entity found by a sphere overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub entity: EntityId,
    pub position: Vec3,
}

/// Something that can take damage
pub trait Damageable {
    fn apply_damage(&mut self, amount: f32, hit_point: Vec3, hit_normal: Vec3);
}

pub trait SpatialQuery {
    /// Closest blocking hit within `max_distance`, `direction` normalized
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Every entity whose collider touches the sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap>;
}

/// Creates and moves the transient entities weapons launch
pub trait EntitySpawner {
    /// Spawn `template` at `position`; `None` if the template is unknown
    fn spawn(&mut self, template: &PrefabRef, position: Vec3, rotation: Quat) -> Option<EntityId>;

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec3);

    /// Current position, `None` once the entity is gone
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    fn despawn(&mut self, entity: EntityId);
}

/// The full world surface a weapon needs
pub trait CombatWorld: SpatialQuery + EntitySpawner {
    /// Damage capability of `entity`, if it has one
    fn damageable_mut(&mut self, entity: EntityId) -> Option<&mut dyn Damageable>;
}

/// Whoever wields a weapon
pub trait WeaponOwner {
    fn owner_id(&self) -> EntityId;

    /// World-space point shots and throws originate from
    fn fire_point(&self) -> Vec3;

    /// Horizontal unit aim direction
    fn aim_direction(&self) -> Vec3;

    /// World-space root, the center of melee sweeps
    fn root_position(&self) -> Vec3;

    /// Capture the current values
    fn snapshot(&self) -> OwnerSnapshot {
        OwnerSnapshot {
            id: self.owner_id(),
            fire_point: self.fire_point(),
            aim_direction: self.aim_direction(),
            root_position: self.root_position(),
        }
    }
}

/// Owner state sampled at the moment of an action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnerSnapshot {
    pub id: EntityId,
    pub fire_point: Vec3,
    pub aim_direction: Vec3,
    pub root_position: Vec3,
}

impl Default for OwnerSnapshot {
    fn default() -> Self {
        Self {
            id: EntityId::new(),
            fire_point: Vec3::ZERO,
            aim_direction: -Vec3::Z,
            root_position: Vec3::ZERO,
        }
    }
}

impl WeaponOwner for OwnerSnapshot {
    fn owner_id(&self) -> EntityId {
        self.id
    }

    fn fire_point(&self) -> Vec3 {
        self.fire_point
    }

    fn aim_direction(&self) -> Vec3 {
        self.aim_direction
    }

    fn root_position(&self) -> Vec3 {
        self.root_position
    }

    fn snapshot(&self) -> OwnerSnapshot {
        *self
    }
}
