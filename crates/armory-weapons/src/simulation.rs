//! One frame of weapon simulation
//!
//! [`Simulation::step`] runs, in order: clock update, fuse countdowns and
//! detonations, holder input and recovery, due deferred actions, tracer
//! playback. Fuses tick ahead of the holders so a grenade thrown this frame
//! starts counting on the next one.

use std::cell::RefCell;
use std::rc::Rc;

use armory_core::{EntityId, SimClock, TimeConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::event::WeaponEventListener;
use crate::fuse::{Detonation, FuseSet};
use crate::holder::WeaponHolder;
use crate::runtime::WeaponContext;
use crate::scheduler::Scheduler;
use crate::tracer::{TracerSettings, TracerSystem};
use crate::world::{CombatWorld, WeaponOwner};

/// Owns the clock, the deferred-work queues and every holder
pub struct Simulation {
    clock: SimClock,
    scheduler: Scheduler,
    fuses: FuseSet,
    rng: StdRng,
    holders: Vec<WeaponHolder>,
    tracers: Rc<RefCell<TracerSystem>>,
}

impl Simulation {
    pub fn new(time: TimeConfig, tracer: TracerSettings, seed: u64) -> Self {
        info!("Simulation created (seed {})", seed);
        Self {
            clock: SimClock::new(time),
            scheduler: Scheduler::new(),
            fuses: FuseSet::new(),
            rng: StdRng::seed_from_u64(seed),
            holders: Vec::new(),
            tracers: Rc::new(RefCell::new(TracerSystem::new(tracer))),
        }
    }

    /// Listener that feeds hit-scan shots into the tracer system
    pub fn tracer_listener(&self) -> Rc<dyn WeaponEventListener> {
        self.tracers.clone()
    }

    pub fn tracers(&self) -> &Rc<RefCell<TracerSystem>> {
        &self.tracers
    }

    /// Register a holder, returning its owner id
    pub fn add_holder(&mut self, holder: WeaponHolder) -> EntityId {
        let owner = holder.owner_id();
        self.holders.push(holder);
        owner
    }

    pub fn holder(&self, owner: EntityId) -> Option<&WeaponHolder> {
        self.holders.iter().find(|h| h.owner_id() == owner)
    }

    pub fn holder_mut(&mut self, owner: EntityId) -> Option<&mut WeaponHolder> {
        self.holders.iter_mut().find(|h| h.owner_id() == owner)
    }

    /// Remove a holder and cancel the deferred work it queued
    pub fn remove_holder(&mut self, owner: EntityId) -> Option<WeaponHolder> {
        let index = self.holders.iter().position(|h| h.owner_id() == owner)?;
        let cancelled = self.scheduler.cancel_owner(owner);
        if cancelled > 0 {
            debug!("Cancelled {} pending actions for removed holder", cancelled);
        }
        Some(self.holders.remove(index))
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn fuses(&self) -> &FuseSet {
        &self.fuses
    }

    /// Advance the simulation by one frame of `raw_delta` seconds
    pub fn step(&mut self, raw_delta: f32, world: &mut dyn CombatWorld) {
        self.clock.update(raw_delta);
        let dt = self.clock.delta();
        let now = self.clock.now();

        for detonation in self.fuses.tick(dt, world) {
            self.announce(&detonation);
            world.despawn(detonation.entity);
        }

        for holder in &mut self.holders {
            let mut ctx = WeaponContext::new(
                now,
                holder.snapshot(),
                world,
                &mut self.scheduler,
                &mut self.fuses,
                &mut self.rng,
            );
            holder.update(dt, &mut ctx);
        }

        for task in self.scheduler.pop_due(now) {
            let Some(holder) = self.holders.iter_mut().find(|h| h.owner_id() == task.owner) else {
                debug!("Dropping {:?} for an unknown owner", task.action);
                continue;
            };
            let mut ctx = WeaponContext::new(
                now,
                holder.snapshot(),
                world,
                &mut self.scheduler,
                &mut self.fuses,
                &mut self.rng,
            );
            holder.resume(&task, &mut ctx);
        }

        self.tracers.borrow_mut().tick(dt);
    }

    /// Runtime echo first (if the thrower is still equipped), then the fuse's own
    fn announce(&mut self, detonation: &Detonation) {
        if let Some(holder) = self.holder_mut(detonation.owner) {
            holder.notify_explosion(detonation.source.token, detonation.center);
        }
        detonation.emit_local();
    }
}
