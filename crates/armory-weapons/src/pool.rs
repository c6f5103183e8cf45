//! Reusable effect objects
//!
//! An [`EffectPool`] hands out idle items and builds new ones from its template
//! when it runs dry. It never shrinks.

use std::fmt;

use tracing::debug;

type Template<T> = Box<dyn Fn() -> T>;

/// Unbounded pool of short-lived visual effects
pub struct EffectPool<T> {
    template: Option<Template<T>>,
    /// Name of the scope new items are created under (for diagnostics)
    scope: Option<String>,
    idle: Vec<T>,
    created: usize,
}

impl<T> EffectPool<T> {
    /// An unconfigured pool; `get` yields nothing until a template is set
    pub fn new() -> Self {
        Self {
            template: None,
            scope: None,
            idle: Vec::new(),
            created: 0,
        }
    }

    /// Set the template new items are built from, and the scope they live under
    pub fn configure(&mut self, template: impl Fn() -> T + 'static, scope: Option<String>) {
        self.template = Some(Box::new(template));
        self.scope = scope;
    }

    /// Build `count` items and park them idle
    pub fn prewarm(&mut self, count: usize) {
        for _ in 0..count {
            match self.create() {
                Some(item) => self.idle.push(item),
                None => break,
            }
        }
        debug!(
            "Prewarmed pool '{}' with {} idle items",
            self.scope.as_deref().unwrap_or("root"),
            self.idle.len()
        );
    }

    /// Take an idle item, or build one; `None` if empty and unconfigured
    pub fn get(&mut self) -> Option<T> {
        self.idle.pop().or_else(|| self.create())
    }

    /// Return an item to the idle set
    pub fn release(&mut self, item: T) {
        self.idle.push(item);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Total items ever built by this pool
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    fn create(&mut self) -> Option<T> {
        let item = (self.template.as_ref()?)();
        self.created += 1;
        Some(item)
    }
}

impl<T> Default for EffectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EffectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectPool")
            .field("configured", &self.template.is_some())
            .field("scope", &self.scope)
            .field("idle", &self.idle.len())
            .field("created", &self.created)
            .finish()
    }
}
