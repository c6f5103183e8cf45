//! Weapon event broadcast
//!
//! Runtimes report what happened through an [`EventChannel`]: a fixed,
//! immutable snapshot of listeners called synchronously in registration order.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use armory_core::{EntityId, Vec3};
use tracing::warn;

use crate::config::{WeaponCategory, WeaponConfig};
use crate::scheduler::RuntimeToken;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponEventKind {
    Fired,
    Hit,
    ReloadStart,
    ReloadEnd,
    EmptyTrigger,
    Equip,
    Unequip,
    MeleeSwing,
    MeleeHit,
    ThrowableThrow,
    ThrowableExplode,
}

/// Which runtime produced an event
#[derive(Debug, Clone)]
pub struct WeaponRef {
    pub token: RuntimeToken,
    pub config: Arc<WeaponConfig>,
    pub level: u32,
}

impl WeaponRef {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn category(&self) -> WeaponCategory {
        self.config.category()
    }
}

/// One broadcast record
#[derive(Debug, Clone)]
pub struct WeaponEvent {
    pub kind: WeaponEventKind,
    pub weapon: WeaponRef,
    pub owner: EntityId,
    pub origin: Vec3,
    pub direction: Vec3,
    /// Trace end for hit-scan shots, impact point for hits, blast center for explosions
    pub hit_point: Option<Vec3>,
    /// Damaged entity, for `Hit` and `MeleeHit`
    pub target: Option<EntityId>,
}

impl WeaponEvent {
    pub fn new(kind: WeaponEventKind, weapon: WeaponRef, owner: EntityId, origin: Vec3, direction: Vec3) -> Self {
        Self {
            kind,
            weapon,
            owner,
            origin,
            direction,
            hit_point: None,
            target: None,
        }
    }

    pub fn with_hit_point(mut self, point: Vec3) -> Self {
        self.hit_point = Some(point);
        self
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }
}

/// Receives weapon events (audio, UI, tracers, analytics)
pub trait WeaponEventListener {
    fn on_weapon_event(&self, event: &WeaponEvent);
}

/// Immutable listener snapshot shared by a holder and its runtimes
#[derive(Clone)]
pub struct EventChannel {
    listeners: Rc<[Rc<dyn WeaponEventListener>]>,
}

impl EventChannel {
    pub fn new(listeners: Vec<Rc<dyn WeaponEventListener>>) -> Self {
        Self {
            listeners: listeners.into(),
        }
    }

    /// A channel nobody listens to
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in order.
    ///
    /// A listener that panics is logged and skipped; the remaining listeners
    /// still receive the event.
    pub fn broadcast(&self, event: &WeaponEvent) {
        let listeners = Rc::clone(&self.listeners);
        for listener in listeners.iter() {
            let delivered = catch_unwind(AssertUnwindSafe(|| listener.on_weapon_event(event)));
            if delivered.is_err() {
                warn!(
                    "Listener panicked while handling {:?} from weapon '{}'",
                    event.kind,
                    event.weapon.id()
                );
            }
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
