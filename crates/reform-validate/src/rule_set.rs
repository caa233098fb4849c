//! Ordered collections of rules evaluated as one pass.

use crate::error::ErrorMessage;
use crate::rule::{ErasedRule, Rule};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;

/// An ordered collection of [`Rule`]s validated together against one input.
///
/// Every rule runs on every pass; there is no short-circuit. Insertion order
/// decides the order of reported errors, not the order of evaluation.
pub struct RuleSet<I: ?Sized> {
    rules: Vec<Arc<dyn ErasedRule<I>>>,
}

impl<I: ?Sized + 'static> RuleSet<I> {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule.
    pub fn push<R>(&mut self, rule: Rule<I, R>)
    where
        R: Send + 'static,
    {
        self.rules.push(Arc::new(rule));
    }

    /// Builder form of [`RuleSet::push`].
    pub fn with<R>(mut self, rule: Rule<I, R>) -> Self
    where
        R: Send + 'static,
    {
        self.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Start a pass over `input`.
    ///
    /// Every rule is started before anything is awaited, so the returned
    /// future borrows nothing from the caller.
    pub fn evaluate(&self, input: &I) -> BoxFuture<'static, Option<Vec<ErrorMessage>>> {
        let pending: Vec<_> = self.rules.iter().map(|rule| rule.check(input)).collect();
        join_all(pending)
            .map(|checked| {
                let errors: Vec<ErrorMessage> = checked.into_iter().flatten().collect();
                if errors.is_empty() {
                    None
                } else {
                    Some(errors)
                }
            })
            .boxed()
    }

    /// Validate `input`: `None` when every rule accepts it, otherwise the
    /// failed rules' messages in rule order.
    pub async fn validate(&self, input: &I) -> Option<Vec<ErrorMessage>> {
        self.evaluate(input).await
    }
}

impl<I: ?Sized + 'static> Default for RuleSet<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> Clone for RuleSet<I> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<I: ?Sized> fmt::Debug for RuleSet<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl<I: ?Sized + 'static, R: Send + 'static> FromIterator<Rule<I, R>> for RuleSet<I> {
    fn from_iter<T: IntoIterator<Item = Rule<I, R>>>(iter: T) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.push(rule);
        }
        set
    }
}
