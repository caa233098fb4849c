//! # reform-core
//!
//! Reactive field and form state for `reform`.
//!
//! - [`Field`]: text input, parsed value and a rule set, with an error
//!   visibility state machine and a standing validation reaction while
//!   watched.
//! - [`StreamField`]: a field validated by a streamed [`ValueValidator`],
//!   publishing errors incrementally and emitting [`LifecycleEvent`]s.
//! - [`Form`]: a named, ordered set of fields with all-or-nothing and
//!   partial validation.
//!
//! State changes are published through a `tokio::sync::watch` counter
//! ([`Field::subscribe`]); derived state is computed on read.
//!
//! This crate is usually consumed through the `reform` facade.
//!
//! [`ValueValidator`]: reform_validate::ValueValidator

#[macro_use]
mod tracing_macros;

pub mod error;
pub mod events;
pub mod field;
pub mod form;
pub mod options;
pub mod pass;
pub mod reactive;
pub mod stream_field;

pub use error::{FieldError, FormError, Result};
pub use events::{ChangeHook, EventHooks, EventHooksConfig, FieldControl, FocusHook, SharedHooks};
pub use field::{Field, TextInput, ValueFormatter, ValueParser};
pub use form::{Form, FormField};
pub use options::{FieldOptions, FormOptions, ObserverConfig};
pub use pass::{PassSequence, PassTicket};
pub use reactive::{Lifecycle, LifecycleEvent, Notifier, Observers, WatchGuard, Watched};
pub use stream_field::StreamField;
