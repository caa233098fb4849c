//! A single validation unit.

use crate::error::{ErrorMessage, ValidatorError};
use crate::outcome::Outcome;
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Boxed validation function: input in, (eventually) a result out.
pub type Validation<I, R> =
    Arc<dyn Fn(&I) -> BoxFuture<'static, Result<R, ValidatorError>> + Send + Sync>;

/// Predicate deciding whether a validation result is acceptable.
pub type ValidWhen<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Renders a rejected validation result into an error message.
pub type ErrorFormatter<R> = Arc<dyn Fn(&R) -> ErrorMessage + Send + Sync>;

/// One validation function paired with its acceptance predicate and
/// error formatter.
///
/// The validation function is fixed at construction. `valid_when` defaults
/// to "the result is falsy" and the formatter to the result's own message
/// (see [`Outcome`]); both may be replaced before the rule is used, the
/// last replacement wins.
///
/// ## Example
///
/// ```rust,ignore
/// use reform_validate::Rule;
///
/// let positive = Rule::new(|input: &Option<String>| {
///     let n: f64 = input.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0.0);
///     n
/// })
/// .with_valid_when(|n| *n > 0.0)
/// .with_formatter(|n| format!("{n} is not positive"));
/// ```
pub struct Rule<I: ?Sized, R> {
    validation: Validation<I, R>,
    valid_when: ValidWhen<R>,
    formatter: ErrorFormatter<R>,
}

impl<I: ?Sized, R> Rule<I, R>
where
    R: Outcome + Send + 'static,
{
    /// Rule backed by a synchronous validation function.
    pub fn new<F>(validation: F) -> Self
    where
        F: Fn(&I) -> R + Send + Sync + 'static,
    {
        Self::from_validation(Arc::new(move |input: &I| {
            let result = validation(input);
            async move { Ok(result) }.boxed()
        }))
    }

    /// Rule backed by an asynchronous validation function.
    ///
    /// The returned future must own whatever it needs from the input.
    pub fn from_async<F, Fut>(validation: F) -> Self
    where
        F: Fn(&I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        Self::from_validation(Arc::new(move |input: &I| validation(input).map(Ok).boxed()))
    }

    /// Rule backed by a synchronous validation function that may fail.
    ///
    /// A failure is reported as an error entry carrying the error's message.
    pub fn try_new<F, E>(validation: F) -> Self
    where
        F: Fn(&I) -> Result<R, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self::from_validation(Arc::new(move |input: &I| {
            let result = validation(input).map_err(ValidatorError::failed);
            async move { result }.boxed()
        }))
    }

    /// Rule backed by an asynchronous validation function that may fail.
    pub fn try_async<F, Fut, E>(validation: F) -> Self
    where
        F: Fn(&I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::from_validation(Arc::new(move |input: &I| {
            validation(input)
                .map(|result| result.map_err(ValidatorError::failed))
                .boxed()
        }))
    }

    fn from_validation(validation: Validation<I, R>) -> Self {
        Self {
            validation,
            valid_when: Arc::new(|result: &R| !result.is_problem()),
            formatter: Arc::new(|result: &R| result.message()),
        }
    }
}

impl<I: ?Sized, R> Rule<I, R> {
    /// Replace the acceptance predicate.
    pub fn with_valid_when<F>(mut self, valid_when: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.valid_when = Arc::new(valid_when);
        self
    }

    /// Replace the error formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&R) -> ErrorMessage + Send + Sync + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    /// The effective acceptance predicate.
    pub fn get_valid_when(&self) -> ValidWhen<R> {
        Arc::clone(&self.valid_when)
    }

    /// The effective error formatter.
    pub fn get_formatter(&self) -> ErrorFormatter<R> {
        Arc::clone(&self.formatter)
    }

    /// The validation function.
    pub fn validation(&self) -> Validation<I, R> {
        Arc::clone(&self.validation)
    }

    /// Start evaluating the rule against `input`.
    ///
    /// Panics raised by the validation function, either while producing the
    /// future or while polling it, are caught and reported as
    /// [`ValidatorError::Panicked`].
    pub fn evaluate(&self, input: &I) -> BoxFuture<'static, Result<R, ValidatorError>>
    where
        R: Send + 'static,
    {
        match std::panic::catch_unwind(AssertUnwindSafe(|| (self.validation)(input))) {
            Ok(pending) => AssertUnwindSafe(pending)
                .catch_unwind()
                .map(|caught| caught.unwrap_or_else(|payload| Err(ValidatorError::from_panic(payload))))
                .boxed(),
            Err(payload) => {
                let err = ValidatorError::from_panic(payload);
                async move { Err(err) }.boxed()
            }
        }
    }

    /// Judge a result: `None` when acceptable, else the formatted message.
    pub fn judge(&self, result: &R) -> Option<ErrorMessage> {
        if (self.valid_when)(result) {
            None
        } else {
            Some((self.formatter)(result))
        }
    }
}

impl<I: ?Sized, R> Clone for Rule<I, R> {
    fn clone(&self) -> Self {
        Self {
            validation: Arc::clone(&self.validation),
            valid_when: Arc::clone(&self.valid_when),
            formatter: Arc::clone(&self.formatter),
        }
    }
}

impl<I: ?Sized, R> fmt::Debug for Rule<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("result", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

/// A rule with its result type erased, as stored in a rule set.
pub(crate) trait ErasedRule<I: ?Sized>: Send + Sync {
    /// Evaluate and judge in one go.
    fn check(&self, input: &I) -> BoxFuture<'static, Option<ErrorMessage>>;
}

impl<I: ?Sized + 'static, R> ErasedRule<I> for Rule<I, R>
where
    R: Send + 'static,
{
    fn check(&self, input: &I) -> BoxFuture<'static, Option<ErrorMessage>> {
        let pending = self.evaluate(input);
        let rule = Rule {
            validation: Arc::clone(&self.validation),
            valid_when: Arc::clone(&self.valid_when),
            formatter: Arc::clone(&self.formatter),
        };
        async move {
            match pending.await {
                Ok(result) => rule.judge(&result),
                Err(err) => Some(err.message()),
            }
        }
        .boxed()
    }
}
