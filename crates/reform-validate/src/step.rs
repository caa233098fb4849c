//! Step-stream validators.
//!
//! A [`ValueValidator`] produces, per validation pass, a lazy stream of
//! [`Step`]s. The consumer pulls the stream one step at a time: errors are
//! published as they arrive, `Continue` is skipped and `Done` ends the pass
//! with an optional valid value.

use crate::error::{ErrorMessage, ValidatorError};
use crate::rule_set::RuleSet;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;

/// One step of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<V, E = ErrorMessage> {
    /// A validation error, appended to the running error list.
    Error(E),
    /// Nothing to report yet.
    Continue,
    /// End of the pass; `Some` carries the candidate valid value.
    Done(Option<V>),
}

impl<V, E> Step<V, E> {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }
}

/// A pass in progress. A step that fails yields `Err`; the pass continues.
pub type StepStream<V, E = ErrorMessage> = BoxStream<'static, Result<Step<V, E>, ValidatorError>>;

/// The subject of a pass: the raw input when present, else the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrValue<IN, V> {
    Input(IN),
    Value(V),
    Empty,
}

impl<IN, V> Default for InputOrValue<IN, V> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<IN, V> InputOrValue<IN, V> {
    /// Input takes precedence over value.
    pub fn from_parts(input: Option<IN>, value: Option<V>) -> Self {
        match (input, value) {
            (Some(input), _) => Self::Input(input),
            (None, Some(value)) => Self::Value(value),
            (None, None) => Self::Empty,
        }
    }

    pub fn input(&self) -> Option<&IN> {
        match self {
            Self::Input(input) => Some(input),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Produces a fresh step stream for every validation pass.
///
/// Closures of the shape `Fn(&InputOrValue<IN, V>) -> StepStream<V, E>`
/// implement this trait directly.
pub trait ValueValidator<IN, V, E = ErrorMessage>: Send + Sync {
    fn validate(&self, subject: &InputOrValue<IN, V>) -> StepStream<V, E>;
}

impl<F, IN, V, E> ValueValidator<IN, V, E> for F
where
    F: Fn(&InputOrValue<IN, V>) -> StepStream<V, E> + Send + Sync,
{
    fn validate(&self, subject: &InputOrValue<IN, V>) -> StepStream<V, E> {
        self(subject)
    }
}

type Parser<IN, V> = Arc<dyn Fn(&IN) -> Option<V> + Send + Sync>;

/// A [`RuleSet`] over the pass subject, plus a parser deriving the value
/// from raw input.
///
/// Each pass evaluates every rule, yields one `Error` step per failed rule
/// (in rule order) and finishes with `Done`. The done value is present only
/// when no rule failed: the subject's value, or the parsed input.
pub struct RulesValidator<IN, V> {
    rules: RuleSet<InputOrValue<IN, V>>,
    parser: Option<Parser<IN, V>>,
}

impl<IN, V> RulesValidator<IN, V>
where
    IN: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(rules: RuleSet<InputOrValue<IN, V>>) -> Self {
        Self {
            rules,
            parser: None,
        }
    }

    /// Derive values from raw input. Without a parser an input subject never
    /// produces a value.
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&IN) -> Option<V> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn rules(&self) -> &RuleSet<InputOrValue<IN, V>> {
        &self.rules
    }
}

impl<IN, V> ValueValidator<IN, V> for RulesValidator<IN, V>
where
    IN: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn validate(&self, subject: &InputOrValue<IN, V>) -> StepStream<V> {
        let candidate = match subject {
            InputOrValue::Input(input) => self.parser.as_ref().and_then(|parse| parse(input)),
            InputOrValue::Value(value) => Some(value.clone()),
            InputOrValue::Empty => None,
        };
        let pending = self.rules.evaluate(subject);

        stream::once(pending)
            .flat_map(move |errors| {
                let done = if errors.is_some() { None } else { candidate.clone() };
                let steps: Vec<Result<Step<V>, ValidatorError>> = errors
                    .unwrap_or_default()
                    .into_iter()
                    .map(|e| Ok(Step::Error(e)))
                    .chain(std::iter::once(Ok(Step::Done(done))))
                    .collect();
                stream::iter(steps)
            })
            .boxed()
    }
}

impl<IN, V> fmt::Debug for RulesValidator<IN, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesValidator")
            .field("rules", &self.rules)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}
