//! Field and form configuration.

use crate::events::{EventHooksConfig, FieldControl};
use std::any::Any;

/// Observer gating for a field's standing validation reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverConfig {
    /// The reaction runs while more than this many watchers are attached.
    /// Default: 0.
    pub low_water_mark: usize,
    /// Buffered lifecycle events per subscriber. Default: 16.
    pub lifecycle_capacity: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            low_water_mark: 0,
            lifecycle_capacity: 16,
        }
    }
}

/// Options accepted by field constructors.
///
/// # Example
///
/// ```rust,ignore
/// use reform_core::{Field, FieldOptions};
///
/// let options = FieldOptions::new()
///     .on_blur(|_| {})
///     .low_water_mark(1);
/// let field: Field<u32> = Field::with_options(options);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Hooks overriding the field defaults.
    pub events: EventHooksConfig,
    /// Reaction gating.
    pub observers: ObserverConfig,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(mut self, events: EventHooksConfig) -> Self {
        self.events = events;
        self
    }

    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl, &dyn Any) + Send + Sync + 'static,
    {
        self.events = self.events.on_change(hook);
        self
    }

    pub fn on_focus<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl) + Send + Sync + 'static,
    {
        self.events = self.events.on_focus(hook);
        self
    }

    pub fn on_blur<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl) + Send + Sync + 'static,
    {
        self.events = self.events.on_blur(hook);
        self
    }

    pub fn low_water_mark(mut self, mark: usize) -> Self {
        self.observers.low_water_mark = mark;
        self
    }

    pub fn lifecycle_capacity(mut self, capacity: usize) -> Self {
        self.observers.lifecycle_capacity = capacity;
        self
    }
}

/// Options accepted by [`Form::with_options`](crate::Form::with_options).
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    /// Form-level hooks, run after each bound field's own hook.
    pub events: EventHooksConfig,
}

impl FormOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(mut self, events: EventHooksConfig) -> Self {
        self.events = events;
        self
    }
}
