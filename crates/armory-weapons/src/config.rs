//! Weapon configuration assets
//!
//! A [`WeaponConfig`] is immutable design data. Its category is derived from
//! the payload variant, so a tag can never disagree with the payload it labels.

use serde::{Deserialize, Serialize};

use crate::progression::{MeleeProgression, RangedProgression, ThrowableProgression};

/// Designer-facing weapon category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Melee,
    Pistol,
    Smg,
    AssaultRifle,
    Sniper,
    Rocket,
    Throwable,
}

/// Which runtime state machine drives a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponKind {
    Ranged,
    Melee,
    Throwable,
}

impl WeaponCategory {
    /// Runtime family for this category
    pub fn kind(self) -> WeaponKind {
        match self {
            Self::Melee => WeaponKind::Melee,
            Self::Throwable => WeaponKind::Throwable,
            Self::Pistol | Self::Smg | Self::AssaultRifle | Self::Sniper | Self::Rocket => {
                WeaponKind::Ranged
            }
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Melee => "Melee",
            Self::Pistol => "Pistol",
            Self::Smg => "SMG",
            Self::AssaultRifle => "Assault Rifle",
            Self::Sniper => "Sniper",
            Self::Rocket => "Rocket",
            Self::Throwable => "Throwable",
        }
    }
}

/// Sub-category of a ranged weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangedClass {
    #[default]
    Pistol,
    Smg,
    AssaultRifle,
    Sniper,
    Rocket,
}

impl From<RangedClass> for WeaponCategory {
    fn from(class: RangedClass) -> Self {
        match class {
            RangedClass::Pistol => Self::Pistol,
            RangedClass::Smg => Self::Smg,
            RangedClass::AssaultRifle => Self::AssaultRifle,
            RangedClass::Sniper => Self::Sniper,
            RangedClass::Rocket => Self::Rocket,
        }
    }
}

/// Trigger behaviour label carried with ranged configs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    #[default]
    Single,
    Burst,
    Auto,
}

/// What a throwable carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrowableType {
    #[default]
    Grenade,
    Flash,
    Molotov,
    Kunai,
}

/// Name of a spawnable template owned by the world (projectiles, grenades)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabRef(pub String);

impl PrefabRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

fn default_equip_time() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_projectile_speed() -> f32 {
    30.0
}

fn default_attack_windup() -> f32 {
    0.1
}

fn default_arc_height() -> f32 {
    0.5
}

/// Ranged payload: hit-scan or projectile guns
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangedPayload {
    #[serde(default)]
    pub class: RangedClass,
    #[serde(default)]
    pub fire_mode: FireMode,
    /// Resolve shots with an instant ray query instead of a projectile
    #[serde(default = "default_true")]
    pub hit_scan: bool,
    #[serde(default)]
    pub projectile: Option<PrefabRef>,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
    #[serde(default)]
    pub progression: Option<RangedProgression>,
}

/// Melee payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeleePayload {
    /// Seconds between the swing starting and the hit resolving
    #[serde(default = "default_attack_windup")]
    pub attack_windup: f32,
    #[serde(default)]
    pub progression: Option<MeleeProgression>,
}

/// Throwable payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThrowablePayload {
    #[serde(default)]
    pub throwable_type: ThrowableType,
    #[serde(default)]
    pub projectile: Option<PrefabRef>,
    /// Upward bias added to the aim direction before normalizing
    #[serde(default = "default_arc_height")]
    pub arc_height: f32,
    #[serde(default)]
    pub progression: Option<ThrowableProgression>,
}

/// Category-specific configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeaponPayload {
    Ranged(RangedPayload),
    Melee(MeleePayload),
    Throwable(ThrowablePayload),
}

impl WeaponPayload {
    pub fn kind(&self) -> WeaponKind {
        match self {
            Self::Ranged(_) => WeaponKind::Ranged,
            Self::Melee(_) => WeaponKind::Melee,
            Self::Throwable(_) => WeaponKind::Throwable,
        }
    }

    /// Whether a progression curve was authored
    pub fn has_progression(&self) -> bool {
        match self {
            Self::Ranged(p) => p.progression.is_some(),
            Self::Melee(p) => p.progression.is_some(),
            Self::Throwable(p) => p.progression.is_some(),
        }
    }
}

/// Static description of one weapon
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeaponConfig {
    /// Stable identifier
    pub id: String,
    pub display_name: String,
    /// UI icon asset path
    #[serde(default)]
    pub icon: Option<String>,
    /// Seconds an equip animation takes; carried for presentation only
    #[serde(default = "default_equip_time")]
    pub equip_time: f32,
    pub payload: WeaponPayload,
}

impl WeaponConfig {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, payload: WeaponPayload) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon: None,
            equip_time: default_equip_time(),
            payload,
        }
    }

    /// Convenience constructor for a ranged weapon
    pub fn ranged(id: impl Into<String>, display_name: impl Into<String>, payload: RangedPayload) -> Self {
        Self::new(id, display_name, WeaponPayload::Ranged(payload))
    }

    /// Convenience constructor for a melee weapon
    pub fn melee(id: impl Into<String>, display_name: impl Into<String>, payload: MeleePayload) -> Self {
        Self::new(id, display_name, WeaponPayload::Melee(payload))
    }

    /// Convenience constructor for a throwable
    pub fn throwable(
        id: impl Into<String>,
        display_name: impl Into<String>,
        payload: ThrowablePayload,
    ) -> Self {
        Self::new(id, display_name, WeaponPayload::Throwable(payload))
    }

    /// Category tag, derived from the payload
    pub fn category(&self) -> WeaponCategory {
        match &self.payload {
            WeaponPayload::Ranged(p) => p.class.into(),
            WeaponPayload::Melee(_) => WeaponCategory::Melee,
            WeaponPayload::Throwable(_) => WeaponCategory::Throwable,
        }
    }
}

impl RangedPayload {
    /// Hit-scan payload with the default projectile settings
    pub fn hit_scan(class: RangedClass, progression: RangedProgression) -> Self {
        Self {
            class,
            fire_mode: FireMode::default(),
            hit_scan: true,
            projectile: None,
            projectile_speed: default_projectile_speed(),
            progression: Some(progression),
        }
    }
}

impl MeleePayload {
    pub fn new(attack_windup: f32, progression: MeleeProgression) -> Self {
        Self {
            attack_windup,
            progression: Some(progression),
        }
    }
}

impl ThrowablePayload {
    pub fn new(projectile: PrefabRef, progression: ThrowableProgression) -> Self {
        Self {
            throwable_type: ThrowableType::default(),
            projectile: Some(projectile),
            arc_height: default_arc_height(),
            progression: Some(progression),
        }
    }
}
