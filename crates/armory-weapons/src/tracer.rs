//! Hit-scan tracer lines
//!
//! The tracer system listens for hit-scan `Fired` events, borrows a line from
//! its [`EffectPool`], plays it from muzzle to trace end, and returns it to the
//! pool once it has finished lingering.

use std::cell::RefCell;

use armory_core::{Color, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{WeaponEvent, WeaponEventKind, WeaponEventListener};
use crate::pool::EffectPool;

/// Tracer appearance and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerSettings {
    pub color: Color,
    pub width: f32,
    /// Head speed in units per second
    pub travel_speed: f32,
    /// Seconds the full line stays visible after the head arrives
    pub stay_duration: f32,
    /// Lines built up front
    pub prewarm: usize,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            color: Color::YELLOW,
            width: 0.04,
            travel_speed: 200.0,
            stay_duration: 0.05,
            prewarm: 20,
        }
    }
}

/// Playback state of a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TracerPhase {
    Idle,
    /// Head moving from start to end; `progress` is the distance covered
    Travelling { progress: f32 },
    Lingering { remaining: f32 },
    Finished,
}

/// A pooled line effect
#[derive(Debug, Clone)]
pub struct TracerLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
    pub width: f32,
    travel_speed: f32,
    stay_duration: f32,
    phase: TracerPhase,
}

impl TracerLine {
    pub fn new(travel_speed: f32, stay_duration: f32) -> Self {
        Self {
            start: Vec3::ZERO,
            end: Vec3::ZERO,
            color: Color::WHITE,
            width: 0.0,
            travel_speed,
            stay_duration,
            phase: TracerPhase::Idle,
        }
    }

    pub fn phase(&self) -> TracerPhase {
        self.phase
    }

    /// Start drawing from `start` to `end`
    pub fn play(&mut self, start: Vec3, end: Vec3, color: Color, width: f32) {
        self.start = start;
        self.end = end;
        self.color = color;
        self.width = width;
        self.phase = if start.distance_squared(end) <= f32::EPSILON {
            TracerPhase::Lingering {
                remaining: self.stay_duration,
            }
        } else {
            TracerPhase::Travelling { progress: 0.0 }
        };
    }

    /// Advance playback; returns true once the line is finished
    pub fn advance(&mut self, dt: f32) -> bool {
        self.phase = match self.phase {
            TracerPhase::Travelling { progress } => {
                let progress = progress + self.travel_speed * dt;
                if progress >= self.start.distance(self.end) {
                    TracerPhase::Lingering {
                        remaining: self.stay_duration,
                    }
                } else {
                    TracerPhase::Travelling { progress }
                }
            }
            TracerPhase::Lingering { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    TracerPhase::Finished
                } else {
                    TracerPhase::Lingering { remaining }
                }
            }
            phase => phase,
        };
        self.phase == TracerPhase::Finished
    }

    /// Visible segment: from start to the current head
    pub fn segment(&self) -> (Vec3, Vec3) {
        let head = match self.phase {
            TracerPhase::Idle => self.start,
            TracerPhase::Travelling { progress } => {
                let length = self.start.distance(self.end);
                self.start.lerp(self.end, (progress / length).min(1.0))
            }
            TracerPhase::Lingering { .. } | TracerPhase::Finished => self.end,
        };
        (self.start, head)
    }

    fn reset(&mut self) {
        self.phase = TracerPhase::Idle;
    }
}

/// Owns the tracer pool and the lines currently playing
#[derive(Debug)]
pub struct TracerSystem {
    pool: EffectPool<TracerLine>,
    active: Vec<TracerLine>,
    settings: TracerSettings,
}

impl TracerSystem {
    pub fn new(settings: TracerSettings) -> Self {
        let mut pool = EffectPool::new();
        let (travel_speed, stay_duration) = (settings.travel_speed, settings.stay_duration);
        pool.configure(
            move || TracerLine::new(travel_speed, stay_duration),
            Some("tracers".to_string()),
        );
        pool.prewarm(settings.prewarm);

        Self {
            pool,
            active: Vec::new(),
            settings,
        }
    }

    /// Play a line from `start` to `end` with the configured look
    pub fn spawn(&mut self, start: Vec3, end: Vec3) {
        let Some(mut line) = self.pool.get() else {
            debug!("Tracer pool has no template, skipping tracer");
            return;
        };
        line.play(start, end, self.settings.color, self.settings.width);
        self.active.push(line);
    }

    /// Advance every line, returning finished ones to the pool
    pub fn tick(&mut self, dt: f32) {
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].advance(dt) {
                let mut line = self.active.swap_remove(index);
                line.reset();
                self.pool.release(line);
            } else {
                index += 1;
            }
        }
    }

    pub fn active(&self) -> &[TracerLine] {
        &self.active
    }

    pub fn pool(&self) -> &EffectPool<TracerLine> {
        &self.pool
    }

    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }
}

impl WeaponEventListener for RefCell<TracerSystem> {
    fn on_weapon_event(&self, event: &WeaponEvent) {
        if event.kind != WeaponEventKind::Fired {
            return;
        }
        let Some(end) = event.hit_point else {
            return;
        };
        match self.try_borrow_mut() {
            Ok(mut tracers) => tracers.spawn(event.origin, end),
            Err(_) => debug!("Tracer system busy, dropping tracer"),
        }
    }
}
