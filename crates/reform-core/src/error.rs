//! Configuration and usage errors.
//!
//! Validation failures are never errors in this sense: they live in a
//! field's error list. The types here report mistakes in how fields and
//! forms are wired up.

use thiserror::Error;

/// Misconfiguration of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Input was set on a field without a value parser.
    #[error("no value parser configured for this field, use `set_value_parser`")]
    MissingParser,

    /// A standing reaction needs a tokio runtime to spawn passes on.
    #[error("watching a field requires a running tokio runtime")]
    NoRuntime,
}

/// Misuse of a form.
#[derive(Debug, Error)]
pub enum FormError {
    /// `fields` was read before `set_fields`.
    #[error("form fields are not bound, use `set_fields`")]
    FieldsNotBound,

    /// The field is already part of a form.
    #[error("field `{0}` is already bound to a form")]
    FieldAlreadyBound(String),

    /// The same field was given under more than one name.
    #[error("field `{0}` is already in this form under another name")]
    DuplicateField(String),

    /// No field with this name.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A value could not be converted into the field's value type.
    #[error("invalid value for field `{field}`: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be converted to or from the form's value map.
    #[error("invalid form record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    /// A record did not serialize to a JSON object.
    #[error("form records must serialize to a map of field values")]
    NotAnObject,
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
