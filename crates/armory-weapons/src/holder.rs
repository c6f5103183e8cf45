//! Weapon holder: owns the slots, equips one of them, and routes input to it
//!
//! The holder is also the weapon owner. Locomotion pushes the root pose and
//! character facing in through [`WeaponHolder::set_pose`]; weapons sample fire
//! point and aim from the holder at the moment they act.

use std::rc::Rc;
use std::sync::Arc;

use armory_core::{EntityId, Transform, Vec3};
use tracing::{debug, info, warn};

use crate::config::WeaponConfig;
use crate::event::{EventChannel, WeaponEvent, WeaponEventKind, WeaponEventListener};
use crate::factory::WeaponFactory;
use crate::runtime::{flatten, Weapon, WeaponContext};
use crate::scheduler::{RuntimeToken, ScheduledTask};
use crate::world::WeaponOwner;

/// Child names searched for a muzzle, in order
const FIRE_POINT_NAMES: [&str; 2] = ["FirePoint", "Muzzle"];

/// Equip-time visual of a weapon: a small node tree positioned relative to
/// its parent
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub name: String,
    pub offset: Vec3,
    pub active: bool,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(name: impl Into<String>, offset: Vec3) -> Self {
        Self {
            name: name.into(),
            offset,
            active: true,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    /// Direct child with the given name
    pub fn find_child(&self, name: &str) -> Option<&VisualNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// One weapon the holder can switch to
#[derive(Debug, Clone)]
pub struct WeaponSlot {
    pub config: Option<Arc<WeaponConfig>>,
    pub visual: Option<VisualNode>,
    /// Fire point in holder space; filled from the visual when unset
    pub fire_point_override: Option<Vec3>,
    pub start_level: u32,
}

impl Default for WeaponSlot {
    fn default() -> Self {
        Self {
            config: None,
            visual: None,
            fire_point_override: None,
            start_level: 1,
        }
    }
}

impl WeaponSlot {
    pub fn new(config: Arc<WeaponConfig>) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }

    pub fn with_visual(mut self, visual: VisualNode) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_fire_point(mut self, fire_point: Vec3) -> Self {
        self.fire_point_override = Some(fire_point);
        self
    }

    pub fn with_start_level(mut self, level: u32) -> Self {
        self.start_level = level;
        self
    }

    /// Fill the override from a `FirePoint`/`Muzzle` child of the visual
    fn resolve_fire_point(&mut self) {
        if self.fire_point_override.is_some() {
            return;
        }
        let Some(visual) = &self.visual else {
            return;
        };
        self.fire_point_override = FIRE_POINT_NAMES
            .iter()
            .find_map(|name| visual.find_child(name))
            .map(|child| visual.offset + child.offset);
    }
}

/// Owns weapon slots and the single active runtime
pub struct WeaponHolder {
    owner_id: EntityId,
    slots: Vec<WeaponSlot>,
    current_index: usize,
    current: Option<Box<dyn Weapon>>,
    channel: EventChannel,

    fire_held: bool,
    /// Active fire point in holder space; `None` means the holder root
    current_fire_point: Option<Vec3>,
    root: Transform,
    character_forward: Option<Vec3>,
}

impl WeaponHolder {
    /// Resolve every slot's fire point, hide all visuals, then equip slot 0
    pub fn new(
        owner_id: EntityId,
        slots: Vec<WeaponSlot>,
        listeners: Vec<Rc<dyn WeaponEventListener>>,
    ) -> Self {
        let mut holder = Self {
            owner_id,
            slots,
            current_index: 0,
            current: None,
            channel: EventChannel::new(listeners),
            fire_held: false,
            current_fire_point: None,
            root: Transform::default(),
            character_forward: None,
        };

        for slot in &mut holder.slots {
            slot.resolve_fire_point();
            if let Some(visual) = &mut slot.visual {
                visual.active = false;
            }
        }

        info!(
            "Weapon holder created with {} slots and {} listeners",
            holder.slots.len(),
            holder.channel.len()
        );
        holder.equip_index(0);
        holder
    }

    /// Equip slot `index` (clamped), replacing the current runtime with a fresh one
    pub fn equip_index(&mut self, index: usize) {
        if let Some(outgoing) = self.current.take() {
            self.broadcast(WeaponEventKind::Unequip, outgoing.as_ref());
        }

        if self.slots.is_empty() {
            self.current_fire_point = None;
            return;
        }

        self.current_index = index.min(self.slots.len() - 1);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(visual) = &mut slot.visual {
                visual.active = i == self.current_index;
            }
        }

        let slot = &mut self.slots[self.current_index];
        slot.resolve_fire_point();
        self.current_fire_point = slot
            .fire_point_override
            .or_else(|| slot.visual.as_ref().map(|visual| visual.offset));

        let Some(config) = slot.config.clone() else {
            warn!("Weapon slot {} has no config, nothing equipped", self.current_index);
            return;
        };
        let start_level = slot.start_level;

        let weapon = WeaponFactory::create(config, self.owner_id, self.channel.clone(), start_level);
        debug!(
            "Equipped '{}' (slot {}, level {})",
            weapon.config().id,
            self.current_index,
            start_level
        );
        self.broadcast(WeaponEventKind::Equip, weapon.as_ref());
        self.current = Some(weapon);
    }

    pub fn next_weapon(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        self.equip_index((self.current_index + 1) % self.slots.len());
    }

    pub fn previous_weapon(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let index = match self.current_index {
            0 => self.slots.len() - 1,
            i => i - 1,
        };
        self.equip_index(index);
    }

    pub fn set_fire_input(&mut self, held: bool) {
        self.fire_held = held;
    }

    pub fn reload(&mut self) {
        let owner = self.snapshot();
        if let Some(weapon) = self.current.as_mut() {
            weapon.reload(&owner);
        }
    }

    /// Root transform and optional character facing from locomotion
    pub fn set_pose(&mut self, root: Transform, character_forward: Option<Vec3>) {
        self.root = root;
        self.character_forward = character_forward;
    }

    /// Per-frame routing: recovery tick, then this frame's fire input.
    ///
    /// `ctx.owner` is expected to be this holder's [`snapshot`](WeaponOwner::snapshot).
    pub fn update(&mut self, dt: f32, ctx: &mut WeaponContext<'_>) {
        let held = self.fire_held;
        if let Some(weapon) = self.current.as_mut() {
            weapon.tick(dt);
            weapon.primary_fire(held, ctx);
        }
    }

    /// Hand a due task to the runtime that scheduled it, if it is still equipped
    pub fn resume(&mut self, task: &ScheduledTask, ctx: &mut WeaponContext<'_>) {
        match self.current.as_mut() {
            Some(weapon) if weapon.token() == task.token => weapon.resume(task.action, ctx),
            _ => debug!("Dropping {:?} for a runtime that is no longer equipped", task.action),
        }
    }

    /// Forward a detonation to the runtime that threw it; false if it is gone
    pub fn notify_explosion(&mut self, token: RuntimeToken, center: Vec3) -> bool {
        match self.current.as_mut() {
            Some(weapon) if weapon.token() == token => {
                weapon.notify_explosion(center);
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&dyn Weapon> {
        self.current.as_deref()
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn Weapon + 'static)> {
        self.current.as_deref_mut()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn slots(&self) -> &[WeaponSlot] {
        &self.slots
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    pub fn root(&self) -> &Transform {
        &self.root
    }

    fn broadcast(&self, kind: WeaponEventKind, weapon: &dyn Weapon) {
        let event = WeaponEvent::new(
            kind,
            weapon.weapon_ref(),
            self.owner_id,
            self.fire_point(),
            self.aim_direction(),
        );
        self.channel.broadcast(&event);
    }
}

impl WeaponOwner for WeaponHolder {
    fn owner_id(&self) -> EntityId {
        self.owner_id
    }

    fn fire_point(&self) -> Vec3 {
        match self.current_fire_point {
            Some(local) => self.root.transform_point(local),
            None => self.root.position,
        }
    }

    fn aim_direction(&self) -> Vec3 {
        self.character_forward
            .and_then(flatten)
            .or_else(|| flatten(self.root.forward()))
            .unwrap_or(-Vec3::Z)
    }

    fn root_position(&self) -> Vec3 {
        self.root.position
    }
}
