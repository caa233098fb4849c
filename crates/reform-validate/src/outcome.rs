//! Default interpretation of validation results.
//!
//! A rule's validation function returns an arbitrary result `R`. Unless the
//! rule overrides them, the result is judged by "is it falsy" (falsy means no
//! problem was found) and rendered as the error message as-is.

use crate::error::ErrorMessage;

/// A validation result with a default truthiness and message.
///
/// | result            | valid when            | message              |
/// |-------------------|-----------------------|----------------------|
/// | `bool`            | `false`               | `"true"`             |
/// | `String` / `&str` | empty                 | the string           |
/// | `Option<T>`       | `None` or falsy inner | inner message        |
/// | `Result<(), E>`   | `Ok(())`              | `E` displayed        |
/// | `Vec<T>`          | empty                 | messages joined `, ` |
/// | integers          | `0`                   | the number           |
pub trait Outcome {
    /// Whether this result reports a problem.
    fn is_problem(&self) -> bool;

    /// The result rendered as an error message.
    fn message(&self) -> ErrorMessage;
}

impl Outcome for bool {
    fn is_problem(&self) -> bool {
        *self
    }

    fn message(&self) -> ErrorMessage {
        self.to_string()
    }
}

impl Outcome for String {
    fn is_problem(&self) -> bool {
        !self.is_empty()
    }

    fn message(&self) -> ErrorMessage {
        self.clone()
    }
}

impl Outcome for &str {
    fn is_problem(&self) -> bool {
        !self.is_empty()
    }

    fn message(&self) -> ErrorMessage {
        (*self).to_string()
    }
}

impl<T: Outcome> Outcome for Option<T> {
    fn is_problem(&self) -> bool {
        self.as_ref().is_some_and(Outcome::is_problem)
    }

    fn message(&self) -> ErrorMessage {
        self.as_ref().map(Outcome::message).unwrap_or_default()
    }
}

impl<E: std::fmt::Display> Outcome for Result<(), E> {
    fn is_problem(&self) -> bool {
        self.is_err()
    }

    fn message(&self) -> ErrorMessage {
        match self {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}

impl<T: Outcome> Outcome for Vec<T> {
    fn is_problem(&self) -> bool {
        !self.is_empty()
    }

    fn message(&self) -> ErrorMessage {
        self.iter()
            .map(Outcome::message)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! impl_outcome_for_int {
    ($($t:ty),*) => {
        $(
            impl Outcome for $t {
                fn is_problem(&self) -> bool {
                    *self != 0
                }

                fn message(&self) -> ErrorMessage {
                    self.to_string()
                }
            }
        )*
    };
}

impl_outcome_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
