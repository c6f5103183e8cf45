//! Maps a configuration payload to its runtime

use std::sync::Arc;

use armory_core::EntityId;
use tracing::warn;

use crate::config::{WeaponConfig, WeaponPayload};
use crate::event::EventChannel;
use crate::runtime::{MeleeWeapon, RangedWeapon, ThrowableWeapon, Weapon};

/// Builds weapon runtimes from configuration
pub struct WeaponFactory;

impl WeaponFactory {
    /// Build a fresh runtime for `config` at `level`.
    ///
    /// A config without a progression curve still yields a runtime, running on
    /// zeroed stats.
    pub fn create(
        config: Arc<WeaponConfig>,
        owner: EntityId,
        channel: EventChannel,
        level: u32,
    ) -> Box<dyn Weapon> {
        if !config.payload.has_progression() {
            warn!(
                "Weapon '{}' has no progression curve, using default stats",
                config.id
            );
        }

        match config.payload.clone() {
            WeaponPayload::Ranged(payload) => {
                Box::new(RangedWeapon::new(config, payload, owner, channel, level))
            }
            WeaponPayload::Melee(payload) => {
                Box::new(MeleeWeapon::new(config, payload, owner, channel, level))
            }
            WeaponPayload::Throwable(payload) => {
                Box::new(ThrowableWeapon::new(config, payload, owner, channel, level))
            }
        }
    }
}
