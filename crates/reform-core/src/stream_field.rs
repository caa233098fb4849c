//! Fields driven by a streamed validator.
//!
//! A [`StreamField`] delegates each validation pass to a
//! [`ValueValidator`], pulling its step stream and publishing errors as
//! they arrive. Passes are sequenced: a pass that falls behind a newer one
//! stops mutating the field the moment it notices.

use crate::events::{EventHooks, FieldControl, SharedHooks};
use crate::options::FieldOptions;
use crate::pass::PassSequence;
use crate::reactive::{Lifecycle, LifecycleEvent, Notifier, Observers, WatchGuard, Watched};
use crate::FieldError;
use futures_util::{stream, FutureExt, StreamExt};
use reform_validate::{InputOrValue, Step, StepStream, ValidatorError, ValueValidator};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};

struct StreamState<V, IN, E> {
    input_value: Option<IN>,
    value: Option<V>,
    is_dirty: bool,
    errors: Vec<E>,
    errors_visible: bool,
    passes: PassSequence,
    initialized: bool,
    validator: Arc<dyn ValueValidator<IN, V, E>>,
    events: EventHooks,
    // The field's own hooks, kept while form hooks are chained after them.
    own_events: Option<EventHooks>,
    reaction: Option<Handle>,
}

impl<V, IN, E> StreamState<V, IN, E> {
    fn is_valid(&self) -> bool {
        self.errors.is_empty() && !self.passes.is_validating()
    }
}

struct StreamInner<V, IN, E> {
    state: Mutex<StreamState<V, IN, E>>,
    notifier: Notifier,
    observers: Observers,
    lifecycle: Lifecycle,
}

impl<V, IN, E> StreamInner<V, IN, E> {
    fn lock(&self) -> MutexGuard<'_, StreamState<V, IN, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Send, IN: Send, E: Send> Watched for StreamInner<V, IN, E> {
    fn observers(&self) -> &Observers {
        &self.observers
    }

    fn on_unwatched(&self) {
        {
            let mut state = self.lock();
            state.reaction = None;
            if state.passes.is_validating() {
                state.passes.invalidate();
            }
        }
        trace_debug!("stream field reaction torn down");
        self.notifier.notify();
    }
}

/// A field validated by a [`ValueValidator`] step stream.
///
/// `IN` is the raw input type, `V` the value type and `E` the error type.
/// Either the input or the value is authoritative: [`StreamField::on_change`]
/// clears the value, [`StreamField::set_value`] clears the input.
///
/// Unlike [`Field`](crate::Field), a pass starts with an empty, visible
/// error list and fills it as the validator yields errors. The field is
/// valid only when no errors are recorded and no pass is running.
pub struct StreamField<V, IN = String, E = String> {
    inner: Arc<StreamInner<V, IN, E>>,
}

impl<V, IN, E> Clone for StreamField<V, IN, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, IN, E> StreamField<V, IN, E>
where
    V: Clone + Send + Sync + 'static,
    IN: Clone + Send + Sync + 'static,
    E: From<String> + Clone + Send + Sync + 'static,
{
    pub fn new<T>(validator: T) -> Self
    where
        T: ValueValidator<IN, V, E> + 'static,
    {
        Self::with_options(validator, FieldOptions::default())
    }

    pub fn with_options<T>(validator: T, options: FieldOptions) -> Self
    where
        T: ValueValidator<IN, V, E> + 'static,
    {
        let state = StreamState {
            input_value: None,
            value: None,
            is_dirty: false,
            errors: Vec::new(),
            errors_visible: false,
            passes: PassSequence::new(),
            initialized: false,
            validator: Arc::new(validator),
            events: EventHooks::field_defaults().merged(&options.events),
            own_events: None,
            reaction: None,
        };

        Self {
            inner: Arc::new(StreamInner {
                state: Mutex::new(state),
                notifier: Notifier::new(),
                observers: Observers::new(options.observers.low_water_mark),
                lifecycle: Lifecycle::with_capacity(options.observers.lifecycle_capacity),
            }),
        }
    }

    /// Replace the validator. Takes effect on the next pass.
    pub fn set_validator<T>(&self, validator: T)
    where
        T: ValueValidator<IN, V, E> + 'static,
    {
        self.inner.lock().validator = Arc::new(validator);
    }

    pub fn input_value(&self) -> Option<IN> {
        self.inner.lock().input_value.clone()
    }

    pub fn value(&self) -> Option<V> {
        self.inner.lock().value.clone()
    }

    /// The input when present, else the value.
    pub fn input_or_value(&self) -> InputOrValue<IN, V> {
        let state = self.inner.lock();
        InputOrValue::from_parts(state.input_value.clone(), state.value.clone())
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().is_dirty
    }

    pub fn is_validating(&self) -> bool {
        self.inner.lock().passes.is_validating()
    }

    /// No errors recorded and no pass running.
    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid()
    }

    /// Visible, non-empty errors.
    pub fn errors(&self) -> Option<Vec<E>> {
        let state = self.inner.lock();
        if state.errors_visible && !state.errors.is_empty() {
            Some(state.errors.clone())
        } else {
            None
        }
    }

    pub fn first_error(&self) -> Option<E> {
        self.inner.lock().errors.first().cloned()
    }

    pub fn are_errors_visible(&self) -> bool {
        self.inner.lock().errors_visible
    }

    /// Trusted direct set: no validation pass runs and in-flight passes
    /// become obsolete.
    ///
    /// Recorded errors are cleared too. They described the input this
    /// value replaces, and no pass will run to refresh them.
    pub fn set_value(&self, value: Option<V>) {
        {
            let mut state = self.inner.lock();
            state.input_value = None;
            state.value = value;
            state.is_dirty = false;
            state.errors.clear();
            state.passes.invalidate();
        }
        self.inner.notifier.notify();
    }

    /// Input from the user. Clears the value and, while watched, starts a
    /// pass.
    pub fn on_change(&self, input: IN) {
        self.inner.lifecycle.emit(LifecycleEvent::Changing);
        let hook = Arc::clone(&self.inner.lock().events.on_change);
        hook(self, &input);

        let reaction = {
            let mut state = self.inner.lock();
            state.input_value = Some(input);
            state.value = None;
            state.is_dirty = true;
            state.reaction.clone()
        };
        self.inner.notifier.notify();

        if let Some(handle) = reaction {
            handle.spawn(self.clone().run_pass());
        }
    }

    pub fn on_focus(&self) {
        let hook = Arc::clone(&self.inner.lock().events.on_focus);
        hook(self);
    }

    pub fn on_blur(&self) {
        let hook = Arc::clone(&self.inner.lock().events.on_blur);
        hook(self);
    }

    /// Run a pass and wait for it. Returns the value when valid afterwards.
    pub async fn validate(&self) -> Option<V> {
        self.clone().run_pass().await
    }

    pub fn clear_errors(&self) {
        {
            let mut state = self.inner.lock();
            state.errors.clear();
            state.errors_visible = false;
        }
        self.inner.notifier.notify();
    }

    pub fn hide_errors(&self) {
        self.set_errors_visible(false);
    }

    pub fn show_errors(&self) {
        self.set_errors_visible(true);
    }

    fn set_errors_visible(&self, visible: bool) {
        self.inner.lock().errors_visible = visible;
        self.inner.notifier.notify();
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.notifier.subscribe()
    }

    /// Receiver of [`LifecycleEvent`]s.
    pub fn lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.lifecycle.subscribe()
    }

    /// Wait until no validation pass is running.
    pub async fn settled(&self) {
        let mut changes = self.subscribe();
        while self.is_validating() {
            if changes.changed().await.is_err() {
                break;
            }
        }
    }

    /// Attach a watcher. Activating the reaction runs a pass right away.
    pub fn watch(&self) -> Result<WatchGuard, FieldError> {
        if self.inner.observers.attach() {
            let handle = match Handle::try_current() {
                Ok(handle) => handle,
                Err(_) => {
                    self.inner.observers.detach();
                    return Err(FieldError::NoRuntime);
                }
            };
            self.inner.lock().reaction = Some(handle.clone());
            trace_debug!("stream field reaction created");
            handle.spawn(self.clone().run_pass());
        }
        let weak = Arc::downgrade(&self.inner);
        let target: Weak<dyn Watched> = weak;
        Ok(WatchGuard::new(target))
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.observers.count()
    }

    async fn run_pass(self) -> Option<V> {
        let (ticket, validator, subject) = {
            let mut state = self.inner.lock();
            let ticket = state.passes.begin();
            state.errors.clear();
            state.errors_visible = true;
            let subject = InputOrValue::from_parts(state.input_value.clone(), state.value.clone());
            (ticket, Arc::clone(&state.validator), subject)
        };
        trace_debug!(ticket, "stream validation pass started");
        self.inner.notifier.notify();

        // A validator that panics before yielding a stream fails the pass
        // with a single error step.
        let mut steps: StepStream<V, E> =
            match std::panic::catch_unwind(AssertUnwindSafe(|| validator.validate(&subject))) {
                Ok(steps) => steps,
                Err(payload) => {
                    let err = ValidatorError::from_panic(payload);
                    stream::once(async move { Err(err) }).boxed()
                }
            };

        let mut candidate = None;
        loop {
            let (step, exhausted) = match AssertUnwindSafe(steps.next()).catch_unwind().await {
                Ok(Some(step)) => (step, false),
                Ok(None) => break,
                Err(payload) => (Err(ValidatorError::from_panic(payload)), true),
            };

            {
                let mut state = self.inner.lock();
                if !state.passes.is_current(ticket) {
                    trace_trace!(ticket, "obsolete stream pass abandoned");
                    return None;
                }
                match step {
                    Ok(Step::Error(error)) => state.errors.push(error),
                    Ok(Step::Continue) => continue,
                    Ok(Step::Done(value)) => {
                        candidate = value;
                        break;
                    }
                    Err(err) => state.errors.push(E::from(err.message())),
                }
            }
            trace_trace!(ticket, "stream pass published an error");
            self.inner.notifier.notify();

            if exhausted {
                break;
            }
        }

        let (result, first) = {
            let mut state = self.inner.lock();
            if !state.passes.commit(ticket) {
                trace_trace!(ticket, "obsolete stream pass abandoned");
                return None;
            }
            if let Some(value) = candidate {
                state.value = Some(value);
                state.is_dirty = false;
            }
            if state.errors.is_empty() {
                state.errors_visible = false;
            }
            let first = !state.initialized;
            state.initialized = true;
            let result = if state.is_valid() {
                state.value.clone()
            } else {
                None
            };
            (result, first)
        };
        trace_debug!(ticket, "stream validation pass committed");
        self.inner.notifier.notify();

        if first {
            self.inner.lifecycle.emit(LifecycleEvent::Init);
        }
        self.inner.lifecycle.emit(LifecycleEvent::Changed);
        result
    }

    pub fn is_bound(&self) -> bool {
        self.inner.lock().own_events.is_some()
    }

    pub(crate) fn bind(&self, form_events: SharedHooks) -> bool {
        {
            let mut state = self.inner.lock();
            if state.own_events.is_some() {
                return false;
            }
            let own = state.events.clone();
            state.events = own.clone().chained(form_events);
            state.own_events = Some(own);
        }
        self.clear_errors();
        true
    }

    /// Detach from a form, restoring the field's own hooks. Returns `false`
    /// if not bound.
    pub(crate) fn unbind(&self) -> bool {
        let mut state = self.inner.lock();
        match state.own_events.take() {
            Some(own) => {
                state.events = own;
                true
            }
            None => false,
        }
    }

    /// Identity shared by every handle to this field.
    pub(crate) fn field_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl<V, IN, E> FieldControl for StreamField<V, IN, E>
where
    V: Clone + Send + Sync + 'static,
    IN: Clone + Send + Sync + 'static,
    E: From<String> + Clone + Send + Sync + 'static,
{
    fn is_valid(&self) -> bool {
        StreamField::is_valid(self)
    }

    fn is_dirty(&self) -> bool {
        StreamField::is_dirty(self)
    }

    fn hide_errors(&self) {
        StreamField::hide_errors(self);
    }

    fn show_errors(&self) {
        StreamField::show_errors(self);
    }

    fn clear_errors(&self) {
        StreamField::clear_errors(self);
    }

    fn validate_in_background(&self) {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().run_pass());
            }
            Err(_) => {
                trace_warn!("background validation skipped: no tokio runtime");
            }
        }
    }
}

impl<V: fmt::Debug, IN: fmt::Debug, E: fmt::Debug> fmt::Debug for StreamField<V, IN, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("StreamField")
            .field("input_value", &state.input_value)
            .field("value", &state.value)
            .field("errors", &state.errors)
            .field("errors_visible", &state.errors_visible)
            .field("is_dirty", &state.is_dirty)
            .field("is_validating", &state.passes.is_validating())
            .finish()
    }
}
