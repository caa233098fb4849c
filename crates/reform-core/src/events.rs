//! Change, focus and blur hooks.
//!
//! Every field carries an [`EventHooks`] table. The field's UI-facing entry
//! points (`on_change_*`, `on_focus`, `on_blur`) call into it, passing the
//! field itself as a [`FieldControl`]. A form binding a field chains its
//! own table after the field's.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The part of a field a hook may drive.
pub trait FieldControl: Send + Sync {
    fn is_valid(&self) -> bool;

    fn is_dirty(&self) -> bool;

    fn hide_errors(&self);

    fn show_errors(&self);

    fn clear_errors(&self);

    /// Start a validation pass without waiting for it.
    fn validate_in_background(&self);
}

/// Hook run on a change, with the new input (or value) type-erased.
pub type ChangeHook = Arc<dyn Fn(&dyn FieldControl, &dyn Any) + Send + Sync>;

/// Hook run on focus or blur.
pub type FocusHook = Arc<dyn Fn(&dyn FieldControl) + Send + Sync>;

/// A complete hook table.
#[derive(Clone)]
pub struct EventHooks {
    pub on_change: ChangeHook,
    pub on_focus: FocusHook,
    pub on_blur: FocusHook,
}

impl EventHooks {
    /// Field defaults: a change hides errors, blur validates in the
    /// background, focus does nothing.
    pub fn field_defaults() -> Self {
        Self {
            on_change: Arc::new(|field, _| field.hide_errors()),
            on_focus: Arc::new(|_| {}),
            on_blur: Arc::new(|field| field.validate_in_background()),
        }
    }

    /// Form defaults: every hook is a no-op.
    pub fn form_defaults() -> Self {
        Self {
            on_change: Arc::new(|_, _| {}),
            on_focus: Arc::new(|_| {}),
            on_blur: Arc::new(|_| {}),
        }
    }

    /// Overlay the hooks set in `config`.
    pub fn merged(mut self, config: &EventHooksConfig) -> Self {
        if let Some(hook) = &config.on_change {
            self.on_change = Arc::clone(hook);
        }
        if let Some(hook) = &config.on_focus {
            self.on_focus = Arc::clone(hook);
        }
        if let Some(hook) = &config.on_blur {
            self.on_blur = Arc::clone(hook);
        }
        self
    }

    /// A table running these hooks first, then whatever `next` holds at
    /// call time.
    pub fn chained(self, next: SharedHooks) -> Self {
        let Self {
            on_change,
            on_focus,
            on_blur,
        } = self;

        let change_next = next.clone();
        let focus_next = next.clone();
        Self {
            on_change: Arc::new(move |field, input| {
                on_change(field, input);
                let hook = Arc::clone(&change_next.get().on_change);
                hook(field, input);
            }),
            on_focus: Arc::new(move |field| {
                on_focus(field);
                let hook = Arc::clone(&focus_next.get().on_focus);
                hook(field);
            }),
            on_blur: Arc::new(move |field| {
                on_blur(field);
                let hook = Arc::clone(&next.get().on_blur);
                hook(field);
            }),
        }
    }
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks").finish_non_exhaustive()
    }
}

/// A partial hook table; unset hooks keep their defaults.
#[derive(Clone, Default)]
pub struct EventHooksConfig {
    /// Replaces the change hook.
    pub on_change: Option<ChangeHook>,
    /// Replaces the focus hook.
    pub on_focus: Option<FocusHook>,
    /// Replaces the blur hook.
    pub on_blur: Option<FocusHook>,
}

impl EventHooksConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl, &dyn Any) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(hook));
        self
    }

    pub fn on_focus<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl) + Send + Sync + 'static,
    {
        self.on_focus = Some(Arc::new(hook));
        self
    }

    pub fn on_blur<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn FieldControl) + Send + Sync + 'static,
    {
        self.on_blur = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for EventHooksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooksConfig")
            .field("on_change", &self.on_change.is_some())
            .field("on_focus", &self.on_focus.is_some())
            .field("on_blur", &self.on_blur.is_some())
            .finish()
    }
}

/// A hook table shared between a form and the fields bound to it.
#[derive(Clone, Debug)]
pub struct SharedHooks(Arc<RwLock<EventHooks>>);

impl SharedHooks {
    pub fn new(hooks: EventHooks) -> Self {
        Self(Arc::new(RwLock::new(hooks)))
    }

    /// Snapshot of the current table.
    pub fn get(&self) -> EventHooks {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the table; bound fields see the change on their next event.
    pub fn set(&self, hooks: EventHooks) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = hooks;
    }
}
