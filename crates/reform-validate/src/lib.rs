//! # reform-validate
//!
//! The rule pipeline behind `reform` fields: single [`Rule`]s, ordered
//! [`RuleSet`]s evaluated concurrently, and step-stream [`ValueValidator`]s
//! for fields that publish errors incrementally.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reform_validate::prelude::*;
//!
//! let rules = RuleSet::new()
//!     .with(Rule::new(|s: &str| if s.is_empty() { "Required" } else { "" }))
//!     .with(
//!         Rule::new(|s: &str| s.len() < 3)
//!             .with_formatter(|_| "At least 3 characters".to_string()),
//!     );
//!
//! assert_eq!(rules.validate("ab").await, Some(vec!["At least 3 characters".into()]));
//! assert_eq!(rules.validate("abc").await, None);
//! ```
//!
//! ## Results
//!
//! A validation function may return anything implementing [`Outcome`].
//! Falsy results (`false`, `""`, `None`, `Ok(())`, `0`, empty collections)
//! are accepted; anything else is rejected and rendered as its own message,
//! unless the rule overrides `valid_when` or the formatter.

pub mod error;
pub mod outcome;
pub mod rule;
pub mod rule_set;
pub mod step;

pub use error::{ErrorMessage, ValidatorError};
pub use outcome::Outcome;
pub use rule::{ErrorFormatter, Rule, ValidWhen, Validation};
pub use rule_set::RuleSet;
pub use step::{InputOrValue, RulesValidator, Step, StepStream, ValueValidator};

/// Prelude module for rule pipelines
pub mod prelude {
    pub use crate::error::{ErrorMessage, ValidatorError};
    pub use crate::outcome::Outcome;
    pub use crate::rule::Rule;
    pub use crate::rule_set::RuleSet;
    pub use crate::step::{InputOrValue, RulesValidator, Step, StepStream, ValueValidator};
}
