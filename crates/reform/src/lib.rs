//! # reform
//!
//! Reactive form and field validation state.
//!
//! A field owns raw input, the value derived from it and a set of
//! declarative rules. It exposes "is valid", "errors" and "visible errors"
//! state for a UI layer, and decides when validation reruns. Fields
//! compose into a [`Form`] with all-or-nothing and partial validation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reform::prelude::*;
//!
//! #[derive(Deserialize)]
//! struct Signup {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let name = Field::text().with_rule(
//!         Rule::new(|s: &Option<String>| s.as_deref().map_or(true, str::is_empty))
//!             .with_formatter(|_| "Required".to_string()),
//!     );
//!     let age: Field<u32> = Field::new();
//!     age.set_value_parser(|s| s.and_then(|s| s.parse().ok()));
//!
//!     let mut form: Form<Signup> = Form::new();
//!     form.set_fields([("name", name.form_field()), ("age", age.form_field())])?;
//!
//!     name.on_change_text("Bo")?;
//!     age.on_change_text("42")?;
//!
//!     if let Some(signup) = form.validate_all().await? {
//!         println!("{} ({})", signup.name, signup.age);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Field generations
//!
//! - [`Field`] validates its text input with a [`RuleSet`]. Errors become
//!   visible on explicit validation or blur and hide again on edit.
//! - [`StreamField`] delegates to a [`ValueValidator`] yielding a stream of
//!   [`Step`]s, publishes errors as they arrive and emits
//!   [`LifecycleEvent`]s.
//!
//! Both discard results of validation passes superseded by newer ones.
//!
//! ## Optional Features
//!
//! - `tracing` (default) - debug/trace events for passes and reactions
//! - `testing` - [`testing`] helpers (`Deferred`, `HookRecorder`)

// Re-export core functionality
pub use reform_core::*;

// Re-export the rule pipeline
pub use reform_validate::{
    ErrorMessage, InputOrValue, Outcome, Rule, RuleSet, RulesValidator, Step, StepStream,
    ValidatorError, ValueValidator,
};

#[cfg(feature = "testing")]
pub use reform_testing as testing;

/// Prelude module - import everything you need with `use reform::prelude::*`
pub mod prelude {
    // Fields and forms
    pub use reform_core::{
        EventHooksConfig, Field, FieldControl, FieldError, FieldOptions, Form, FormError,
        FormField, FormOptions, LifecycleEvent, StreamField, TextInput, WatchGuard,
    };

    // Rules and validators
    pub use reform_validate::prelude::*;

    // Re-exports
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Map, Value};
}

// Re-export commonly used external crates
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
