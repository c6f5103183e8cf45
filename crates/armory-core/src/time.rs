//! Simulation clock
//!
//! Weapon timing gates compare a snapshot of [`SimClock::now`] against stored
//! "last action" timestamps, so the clock only ever moves forward.

use serde::{Deserialize, Serialize};

/// Configuration for the simulation clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// How many simulated seconds pass per real second
    pub time_scale: f32,
    /// Step the headless driver feeds into the simulation (in seconds)
    pub fixed_timestep: f32,
    /// Maximum delta time to prevent spiral of death
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// Monotonic simulation time
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    /// Configuration
    pub config: TimeConfig,
    /// Seconds since the simulation started
    elapsed: f64,
    /// Scaled delta of the last update
    delta: f32,
    /// Number of updates so far
    frame: u64,
}

impl SimClock {
    /// Create a clock with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance by the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        let clamped = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.frame += 1;
        self.delta = clamped * self.config.time_scale;
        self.elapsed += self.delta as f64;
    }

    /// Current time snapshot in seconds
    pub fn now(&self) -> f64 {
        self.elapsed
    }

    /// Scaled delta of the last update
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
