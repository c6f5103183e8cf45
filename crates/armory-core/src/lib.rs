//! Armory Core - Shared types for the Armory combat layer
//!
//! This crate provides the foundational types used by the weapon and physics crates:
//! - Mathematical primitives (re-exported from glam)
//! - Transform and color types for fire points and effects
//! - Entity identifiers shared with the physics world
//! - The monotonic simulation clock

pub mod time;
pub mod types;

pub use glam::{Quat, Vec3};
pub use time::{SimClock, TimeConfig};
pub use types::{Color, EntityId, Transform};
