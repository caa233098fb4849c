//! Rule-based fields.
//!
//! A [`Field`] owns one text input, the value parsed from it, a [`RuleSet`]
//! validating the input, and the error visibility state a UI renders from.
//!
//! Input and value derive each other: setting input runs the parser,
//! setting a value runs the formatter. Validation is either explicit
//! ([`Field::validate`], blur) or driven by the standing reaction that
//! exists while the field is watched.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reform_core::Field;
//! use reform_validate::Rule;
//!
//! let age: Field<i64> = Field::new();
//! age.set_value_parser(|input| input.and_then(|s| s.parse().ok()));
//! age.add_rule(
//!     Rule::new(|input: &Option<String>| {
//!         input.as_deref().and_then(|s| s.parse::<i64>().ok()).map_or(true, |n| n <= 0)
//!     })
//!     .with_formatter(|_| "Must be positive".to_string()),
//! );
//!
//! age.set_input_value(Some("5".into()))?;
//! assert_eq!(age.validate().await, Some(5));
//! ```

use crate::error::FieldError;
use crate::events::{EventHooks, FieldControl, SharedHooks};
use crate::options::FieldOptions;
use crate::pass::{PassSequence, PassTicket};
use crate::reactive::{Notifier, Observers, WatchGuard, Watched};
use reform_validate::{ErrorMessage, Rule, RuleSet};
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Raw input of a rule-based field, and what its rules receive.
pub type TextInput = Option<String>;

/// Derives a value from raw input.
pub type ValueParser<V> = Arc<dyn Fn(Option<&str>) -> Option<V> + Send + Sync>;

/// Renders a value back into input text.
pub type ValueFormatter<V> = Arc<dyn Fn(Option<&V>) -> Option<String> + Send + Sync>;

struct Reaction {
    handle: Handle,
    runs: u64,
    pending: Option<PassTicket>,
}

struct FieldState<V> {
    input_value: TextInput,
    value: Option<V>,
    is_dirty: bool,
    // `Some(vec![])` until the first validation: not valid, nothing to show.
    errors: Option<Vec<ErrorMessage>>,
    errors_visible: bool,
    passes: PassSequence,
    parser: Option<ValueParser<V>>,
    formatter: ValueFormatter<V>,
    rules: RuleSet<TextInput>,
    events: EventHooks,
    // The field's own hooks, kept while form hooks are chained after them.
    own_events: Option<EventHooks>,
    reaction: Option<Reaction>,
}

impl<V> FieldState<V> {
    fn is_valid(&self) -> bool {
        self.errors.is_none() && !self.passes.is_validating()
    }
}

struct FieldInner<V> {
    state: Mutex<FieldState<V>>,
    notifier: Notifier,
    observers: Observers,
}

impl<V> FieldInner<V> {
    fn lock(&self) -> MutexGuard<'_, FieldState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Send> Watched for FieldInner<V> {
    fn observers(&self) -> &Observers {
        &self.observers
    }

    fn on_unwatched(&self) {
        {
            let mut state = self.lock();
            if let Some(reaction) = state.reaction.take() {
                if let Some(ticket) = reaction.pending {
                    if state.passes.is_current(ticket) {
                        state.passes.invalidate();
                    }
                }
            }
        }
        trace_debug!("field reaction torn down");
        self.notifier.notify();
    }
}

/// A text-backed field validated by a [`RuleSet`].
///
/// `Field` is a cheap handle; clones share state.
pub struct Field<V> {
    inner: Arc<FieldInner<V>>,
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Field<V>
where
    V: Display + Clone + Send + Sync + 'static,
{
    /// Field formatting values with `Display`. A parser must be set before
    /// input is accepted.
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self::with_value_formatter(|value: Option<&V>| value.map(ToString::to_string), options)
    }
}

impl<V> Default for Field<V>
where
    V: Display + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl Field<String> {
    /// Text field: the value is the input itself.
    pub fn text() -> Self {
        Self::text_with_options(FieldOptions::default())
    }

    pub fn text_with_options(options: FieldOptions) -> Self {
        let field = Self::with_options(options);
        field.set_value_parser(|input| input.map(str::to_owned));
        field
    }
}

impl<V> Field<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Field for values without a `Display` rendering.
    pub fn with_value_formatter<F>(formatter: F, options: FieldOptions) -> Self
    where
        F: Fn(Option<&V>) -> Option<String> + Send + Sync + 'static,
    {
        let state = FieldState {
            input_value: None,
            value: None,
            is_dirty: false,
            errors: Some(Vec::new()),
            errors_visible: false,
            passes: PassSequence::new(),
            parser: None,
            formatter: Arc::new(formatter),
            rules: RuleSet::new(),
            events: EventHooks::field_defaults().merged(&options.events),
            own_events: None,
            reaction: None,
        };

        Self {
            inner: Arc::new(FieldInner {
                state: Mutex::new(state),
                notifier: Notifier::new(),
                observers: Observers::new(options.observers.low_water_mark),
            }),
        }
    }

    // --- configuration ---

    pub fn set_value_parser<F>(&self, parser: F)
    where
        F: Fn(Option<&str>) -> Option<V> + Send + Sync + 'static,
    {
        self.inner.lock().parser = Some(Arc::new(parser));
        self.inner.notifier.notify();
    }

    pub fn set_value_formatter<F>(&self, formatter: F)
    where
        F: Fn(Option<&V>) -> Option<String> + Send + Sync + 'static,
    {
        self.inner.lock().formatter = Arc::new(formatter);
        self.inner.notifier.notify();
    }

    /// Append a rule run on every validation pass.
    pub fn add_rule<R>(&self, rule: Rule<TextInput, R>)
    where
        R: Send + 'static,
    {
        self.inner.lock().rules.push(rule);
    }

    /// Builder form of [`Field::add_rule`].
    pub fn with_rule<R>(self, rule: Rule<TextInput, R>) -> Self
    where
        R: Send + 'static,
    {
        self.add_rule(rule);
        self
    }

    pub fn set_rules(&self, rules: RuleSet<TextInput>) {
        self.inner.lock().rules = rules;
    }

    pub fn rules(&self) -> RuleSet<TextInput> {
        self.inner.lock().rules.clone()
    }

    // --- derived state ---

    pub fn input_value(&self) -> TextInput {
        self.inner.lock().input_value.clone()
    }

    pub fn value(&self) -> Option<V> {
        self.inner.lock().value.clone()
    }

    /// The value rendered through the value formatter.
    pub fn formatted_value(&self) -> Option<String> {
        let (formatter, value) = {
            let state = self.inner.lock();
            (Arc::clone(&state.formatter), state.value.clone())
        };
        formatter(value.as_ref())
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().is_dirty
    }

    pub fn is_validating(&self) -> bool {
        self.inner.lock().passes.is_validating()
    }

    /// Valid only after a pass found no errors, and while none is running.
    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid()
    }

    /// Visible, non-empty errors.
    pub fn errors(&self) -> Option<Vec<ErrorMessage>> {
        let state = self.inner.lock();
        match &state.errors {
            Some(errors) if state.errors_visible && !errors.is_empty() => Some(errors.clone()),
            _ => None,
        }
    }

    /// First recorded error, visible or not.
    pub fn first_error(&self) -> Option<ErrorMessage> {
        self.inner
            .lock()
            .errors
            .as_ref()
            .and_then(|errors| errors.first().cloned())
    }

    /// [`Field::first_error`] as a one-element array.
    pub fn first_error_as_slice(&self) -> Option<[ErrorMessage; 1]> {
        self.first_error().map(|error| [error])
    }

    pub fn are_errors_visible(&self) -> bool {
        self.inner.lock().errors_visible
    }

    // --- mutation ---

    /// Store raw input and derive the value from it.
    ///
    /// Visible errors are hidden until the next explicit validation. Fails
    /// without touching the field when no parser is configured.
    pub fn set_input_value(&self, input: TextInput) -> Result<(), FieldError> {
        let parser = self.inner.lock().parser.clone().ok_or(FieldError::MissingParser)?;
        let value = parser(input.as_deref());
        {
            let mut state = self.inner.lock();
            state.value = value;
            state.input_value = input;
            state.errors_visible = false;
            state.is_dirty = false;
        }
        self.inner.notifier.notify();
        self.react();
        Ok(())
    }

    /// Store a value and derive the input from it.
    pub fn set_value(&self, value: Option<V>) {
        let formatter = Arc::clone(&self.inner.lock().formatter);
        let input = formatter(value.as_ref());
        {
            let mut state = self.inner.lock();
            state.input_value = input;
            state.value = value;
            state.is_dirty = false;
        }
        self.inner.notifier.notify();
        self.react();
    }

    /// Run the rules against the current input, then show the outcome.
    ///
    /// Returns the value when the field is valid afterwards. A pass
    /// superseded before it finishes commits nothing.
    pub async fn validate(&self) -> Option<V> {
        let (ticket, rules, input) = {
            let mut state = self.inner.lock();
            let ticket = state.passes.begin();
            (ticket, state.rules.clone(), state.input_value.clone())
        };
        trace_debug!(ticket, "validation pass started");
        self.inner.notifier.notify();

        // Rules may read this field, so they start with the lock released.
        let errors = rules.evaluate(&input).await;

        let result = {
            let mut state = self.inner.lock();
            if state.passes.commit(ticket) {
                trace_debug!(ticket, errors = ?errors, "validation pass committed");
                state.errors = errors;
                state.errors_visible = true;
            } else {
                trace_trace!(ticket, "obsolete validation pass abandoned");
            }
            if state.is_valid() {
                state.value.clone()
            } else {
                None
            }
        };
        self.inner.notifier.notify();
        result
    }

    pub fn clear_errors(&self) {
        {
            let mut state = self.inner.lock();
            state.errors = None;
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

    // --- UI entry points ---

    /// Text typed by the user.
    pub fn on_change_text(&self, text: impl Into<String>) -> Result<(), FieldError> {
        let text = text.into();
        self.mark_dirty();
        let hook = Arc::clone(&self.inner.lock().events.on_change);
        hook(self, &text);
        self.set_input_value(Some(text))
    }

    /// A value picked by the user.
    pub fn on_change_value(&self, value: V) {
        self.mark_dirty();
        let hook = Arc::clone(&self.inner.lock().events.on_change);
        hook(self, &value);
        self.set_value(Some(value));
    }

    pub fn on_focus(&self) {
        let hook = Arc::clone(&self.inner.lock().events.on_focus);
        hook(self);
    }

    pub fn on_blur(&self) {
        let hook = Arc::clone(&self.inner.lock().events.on_blur);
        hook(self);
    }

    fn mark_dirty(&self) {
        self.inner.lock().is_dirty = true;
        self.inner.notifier.notify();
    }

    // --- observation ---

    /// Receiver ticking on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.notifier.subscribe()
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

    /// Attach a watcher.
    ///
    /// While watched, every input change runs a validation pass in the
    /// background. Those passes record errors without changing their
    /// visibility. The pass run when the reaction is created is skipped.
    pub fn watch(&self) -> Result<WatchGuard, FieldError> {
        if self.inner.observers.attach() {
            let handle = match Handle::try_current() {
                Ok(handle) => handle,
                Err(_) => {
                    self.inner.observers.detach();
                    return Err(FieldError::NoRuntime);
                }
            };
            self.inner.lock().reaction = Some(Reaction {
                handle,
                runs: 0,
                pending: None,
            });
            trace_debug!("field reaction created");
            self.react();
        }
        let weak = Arc::downgrade(&self.inner);
        let target: Weak<dyn Watched> = weak;
        Ok(WatchGuard::new(target))
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.observers.count()
    }

    fn react(&self) {
        let mut state = self.inner.lock();
        let (runs, handle) = match state.reaction.as_mut() {
            Some(reaction) => {
                reaction.runs += 1;
                (reaction.runs, reaction.handle.clone())
            }
            None => return,
        };
        if runs == 1 {
            return;
        }

        let ticket = state.passes.begin();
        if let Some(reaction) = state.reaction.as_mut() {
            reaction.pending = Some(ticket);
        }
        let rules = state.rules.clone();
        let input = state.input_value.clone();
        drop(state);
        trace_debug!(ticket, "reaction pass started");
        self.inner.notifier.notify();

        let pending = rules.evaluate(&input);

        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            let errors = pending.await;
            if let Some(inner) = weak.upgrade() {
                Field { inner }.commit_reaction(ticket, errors);
            }
        });
    }

    fn commit_reaction(&self, ticket: PassTicket, errors: Option<Vec<ErrorMessage>>) {
        {
            let mut state = self.inner.lock();
            if !state.passes.commit(ticket) {
                trace_trace!(ticket, "obsolete reaction pass abandoned");
                return;
            }
            state.errors = errors;
        }
        trace_debug!(ticket, "reaction pass committed");
        self.inner.notifier.notify();
    }

    // --- form binding ---

    pub fn is_bound(&self) -> bool {
        self.inner.lock().own_events.is_some()
    }

    /// Bind to a form: clear errors and chain the form hooks after the
    /// field's own. Returns `false` if already bound.
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

impl<V> FieldControl for Field<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn is_valid(&self) -> bool {
        Field::is_valid(self)
    }

    fn is_dirty(&self) -> bool {
        Field::is_dirty(self)
    }

    fn hide_errors(&self) {
        Field::hide_errors(self);
    }

    fn show_errors(&self) {
        Field::show_errors(self);
    }

    fn clear_errors(&self) {
        Field::clear_errors(self);
    }

    fn validate_in_background(&self) {
        match Handle::try_current() {
            Ok(handle) => {
                let field = self.clone();
                handle.spawn(async move {
                    field.validate().await;
                });
            }
            Err(_) => {
                trace_warn!("background validation skipped: no tokio runtime");
            }
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Field")
            .field("input_value", &state.input_value)
            .field("value", &state.value)
            .field("errors", &state.errors)
            .field("errors_visible", &state.errors_visible)
            .field("is_dirty", &state.is_dirty)
            .field("is_validating", &state.passes.is_validating())
            .finish()
    }
}
