//! Form aggregate over named fields.

use crate::error::{FormError, Result};
use crate::events::{EventHooks, EventHooksConfig, SharedHooks};
use crate::field::Field;
use crate::options::FormOptions;
use crate::stream_field::StreamField;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

/// A field as seen by a [`Form`]: values travel as JSON.
#[async_trait]
pub trait FormField: Send + Sync {
    fn is_valid(&self) -> bool;

    fn is_bound(&self) -> bool;

    /// Validate, returning the value when valid and `null` otherwise.
    async fn validate_json(&self) -> std::result::Result<Value, serde_json::Error>;

    fn value_json(&self) -> std::result::Result<Value, serde_json::Error>;

    /// Set the value; `null` clears it.
    fn set_value_json(&self, value: Value) -> std::result::Result<(), serde_json::Error>;

    fn clear_errors(&self);

    /// Clear errors and chain `events` after the field's own hooks.
    /// Returns `false` if the field is already bound.
    fn bind(&self, events: SharedHooks) -> bool;

    /// Drop the form hooks again. Returns `false` if the field is not bound.
    fn unbind(&self) -> bool;

    /// Equal for every handle to the same field.
    fn field_id(&self) -> usize;
}

#[async_trait]
impl<V> FormField for Field<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn is_valid(&self) -> bool {
        Field::is_valid(self)
    }

    fn is_bound(&self) -> bool {
        Field::is_bound(self)
    }

    async fn validate_json(&self) -> std::result::Result<Value, serde_json::Error> {
        serde_json::to_value(self.validate().await)
    }

    fn value_json(&self) -> std::result::Result<Value, serde_json::Error> {
        serde_json::to_value(self.value())
    }

    fn set_value_json(&self, value: Value) -> std::result::Result<(), serde_json::Error> {
        self.set_value(serde_json::from_value(value)?);
        Ok(())
    }

    fn clear_errors(&self) {
        Field::clear_errors(self);
    }

    fn bind(&self, events: SharedHooks) -> bool {
        Field::bind(self, events)
    }

    fn unbind(&self) -> bool {
        Field::unbind(self)
    }

    fn field_id(&self) -> usize {
        Field::field_id(self)
    }
}

#[async_trait]
impl<V, IN, E> FormField for StreamField<V, IN, E>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    IN: Clone + Send + Sync + 'static,
    E: From<String> + Clone + Send + Sync + 'static,
{
    fn is_valid(&self) -> bool {
        StreamField::is_valid(self)
    }

    fn is_bound(&self) -> bool {
        StreamField::is_bound(self)
    }

    async fn validate_json(&self) -> std::result::Result<Value, serde_json::Error> {
        serde_json::to_value(self.validate().await)
    }

    fn value_json(&self) -> std::result::Result<Value, serde_json::Error> {
        serde_json::to_value(self.value())
    }

    fn set_value_json(&self, value: Value) -> std::result::Result<(), serde_json::Error> {
        self.set_value(serde_json::from_value(value)?);
        Ok(())
    }

    fn clear_errors(&self) {
        StreamField::clear_errors(self);
    }

    fn bind(&self, events: SharedHooks) -> bool {
        StreamField::bind(self, events)
    }

    fn unbind(&self) -> bool {
        StreamField::unbind(self)
    }

    fn field_id(&self) -> usize {
        StreamField::field_id(self)
    }
}

impl<V> Field<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// A handle to this field for [`Form::set_fields`].
    pub fn form_field(&self) -> Arc<dyn FormField> {
        Arc::new(self.clone())
    }
}

impl<V, IN, E> StreamField<V, IN, E>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    IN: Clone + Send + Sync + 'static,
    E: From<String> + Clone + Send + Sync + 'static,
{
    /// A handle to this field for [`Form::set_fields`].
    pub fn form_field(&self) -> Arc<dyn FormField> {
        Arc::new(self.clone())
    }
}

type FieldMap = Vec<(String, Arc<dyn FormField>)>;

/// A fixed, ordered mapping of names to fields.
///
/// `T` is the record produced by [`Form::validate_all`].
///
/// ## Example
///
/// ```rust,ignore
/// use reform_core::{Field, Form};
///
/// #[derive(serde::Deserialize)]
/// struct Person { name: String, age: u32 }
///
/// let name = Field::text();
/// let age: Field<u32> = Field::new();
///
/// let mut form: Form<Person> = Form::new();
/// form.set_fields([("name", name.form_field()), ("age", age.form_field())])?;
///
/// if let Some(person) = form.validate_all().await? {
///     println!("{} is {}", person.name, person.age);
/// }
/// ```
pub struct Form<T = Map<String, Value>> {
    fields: Option<FieldMap>,
    events: SharedHooks,
    _record: PhantomData<fn() -> T>,
}

impl<T> Form<T> {
    pub fn new() -> Self {
        Self::with_options(FormOptions::default())
    }

    pub fn with_options(options: FormOptions) -> Self {
        Self {
            fields: None,
            events: SharedHooks::new(EventHooks::form_defaults().merged(&options.events)),
            _record: PhantomData,
        }
    }

    /// Current form-level hooks.
    pub fn events(&self) -> EventHooks {
        self.events.get()
    }

    /// Override form-level hooks. Bound fields pick up the change.
    pub fn set_events(&self, config: &EventHooksConfig) {
        self.events.set(self.events.get().merged(config));
    }

    /// Bind the form's fields.
    ///
    /// Each field has its errors cleared and its hooks chained to the
    /// form's. Fields of a previous mapping that are not part of the new one
    /// are detached and stop firing this form's hooks. Fails if a field is
    /// bound to another form or given under two names, in which case the
    /// previous mapping is kept as it was.
    pub fn set_fields<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Arc<dyn FormField>)>,
        S: Into<String>,
    {
        let mut map: FieldMap = Vec::new();
        for (name, field) in fields {
            let name = name.into();
            map.retain(|(existing, _)| *existing != name);
            map.push((name, field));
        }

        let previous = self.fields.take().unwrap_or_default();
        let is_previous = |field: &Arc<dyn FormField>| {
            previous
                .iter()
                .any(|(_, old)| old.field_id() == field.field_id())
        };

        let mut seen = HashSet::new();
        let mut rejected = None;
        for (name, field) in &map {
            if !seen.insert(field.field_id()) {
                rejected = Some(FormError::DuplicateField(name.clone()));
                break;
            }
            if field.is_bound() && !is_previous(field) {
                rejected = Some(FormError::FieldAlreadyBound(name.clone()));
                break;
            }
        }
        if let Some(err) = rejected {
            self.fields = Some(previous);
            return Err(err);
        }

        let mut newly_bound: Vec<&Arc<dyn FormField>> = Vec::new();
        for (name, field) in &map {
            if is_previous(field) {
                continue;
            }
            if !field.bind(self.events.clone()) {
                for bound in newly_bound {
                    bound.unbind();
                }
                self.fields = Some(previous);
                return Err(FormError::FieldAlreadyBound(name.clone()));
            }
            newly_bound.push(field);
        }

        for (_, old) in &previous {
            let kept = map.iter().any(|(_, field)| field.field_id() == old.field_id());
            if kept {
                old.clear_errors();
            } else {
                old.unbind();
            }
        }

        trace_debug!(fields = map.len(), "form fields bound");
        self.fields = Some(map);
        Ok(())
    }

    pub fn fields(&self) -> Result<&[(String, Arc<dyn FormField>)]> {
        self.fields.as_deref().ok_or(FormError::FieldsNotBound)
    }

    pub fn field(&self, name: &str) -> Result<&Arc<dyn FormField>> {
        self.fields()?
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, field)| field)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn is_valid(&self) -> Result<bool> {
        Ok(self.fields()?.iter().all(|(_, field)| field.is_valid()))
    }

    /// Every field's value, or `None` unless the whole form is valid.
    pub fn values(&self) -> Result<Option<Map<String, Value>>> {
        if !self.is_valid()? {
            return Ok(None);
        }
        let mut values = Map::new();
        for (name, field) in self.fields()? {
            values.insert(name.clone(), field_value(name, field.value_json())?);
        }
        Ok(Some(values))
    }

    /// Validate the named fields (all when `names` is empty) concurrently.
    ///
    /// All or nothing: `None` if any of them ends invalid.
    pub async fn validate(&self, names: &[&str]) -> Result<Option<Map<String, Value>>> {
        let outcomes = self.run(names).await?;
        let mut values = Map::new();
        for (name, valid, value) in outcomes {
            if !valid {
                return Ok(None);
            }
            values.insert(name, value);
        }
        Ok(if values.is_empty() { None } else { Some(values) })
    }

    /// Validate the named fields (all when `names` is empty) concurrently,
    /// keeping only those that ended valid. `None` when none did.
    pub async fn validate_partial(&self, names: &[&str]) -> Result<Option<Map<String, Value>>> {
        let values: Map<String, Value> = self
            .run(names)
            .await?
            .into_iter()
            .filter(|(_, valid, _)| *valid)
            .map(|(name, _, value)| (name, value))
            .collect();
        Ok(if values.is_empty() { None } else { Some(values) })
    }

    /// Validate every field and build the record from their values.
    pub async fn validate_all(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.validate(&[]).await? {
            Some(values) => Ok(Some(serde_json::from_value(Value::Object(values))?)),
            None => Ok(None),
        }
    }

    /// Push values into fields.
    ///
    /// Present, non-null entries are set. Other fields are cleared when
    /// `clear` is set and left alone otherwise.
    pub fn set_values(&self, values: &Map<String, Value>, clear: bool) -> Result<()> {
        for (name, field) in self.fields()? {
            let value = match values.get(name) {
                Some(value) if !value.is_null() => value.clone(),
                _ if clear => Value::Null,
                _ => continue,
            };
            field
                .set_value_json(value)
                .map_err(|source| FormError::InvalidValue {
                    field: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// [`Form::set_values`] from any record serializing to a map.
    pub fn set_record<S: Serialize>(&self, record: &S, clear: bool) -> Result<()> {
        match serde_json::to_value(record)? {
            Value::Object(values) => self.set_values(&values, clear),
            _ => Err(FormError::NotAnObject),
        }
    }

    async fn run(&self, names: &[&str]) -> Result<Vec<(String, bool, Value)>> {
        let selected: Vec<&(String, Arc<dyn FormField>)> = if names.is_empty() {
            self.fields()?.iter().collect()
        } else {
            let fields = self.fields()?;
            names
                .iter()
                .map(|name| {
                    fields
                        .iter()
                        .find(|(candidate, _)| candidate == name)
                        .ok_or_else(|| FormError::UnknownField((*name).to_string()))
                })
                .collect::<Result<_>>()?
        };

        let validated = join_all(selected.iter().map(|(_, field)| field.validate_json())).await;

        selected
            .into_iter()
            .zip(validated)
            .map(|((name, field), value)| {
                Ok((name.clone(), field.is_valid(), field_value(name, value)?))
            })
            .collect()
    }
}

fn field_value(name: &str, value: std::result::Result<Value, serde_json::Error>) -> Result<Value> {
    value.map_err(|source| FormError::InvalidValue {
        field: name.to_string(),
        source,
    })
}

impl<T> Default for Form<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Form<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Option<Vec<&str>> = self
            .fields
            .as_ref()
            .map(|fields| fields.iter().map(|(name, _)| name.as_str()).collect());
        f.debug_struct("Form").field("fields", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unbound_form_fails_fast() {
        let form: Form = Form::new();
        assert!(matches!(form.fields(), Err(FormError::FieldsNotBound)));
        assert!(matches!(form.is_valid(), Err(FormError::FieldsNotBound)));
        assert!(matches!(
            form.set_values(&Map::new(), true),
            Err(FormError::FieldsNotBound)
        ));
    }

    #[test]
    fn fields_bind_once() {
        let name = Field::text();
        let mut form: Form = Form::new();
        form.set_fields([("name", name.form_field())]).unwrap();
        assert!(name.is_bound());
        assert!(name.is_valid());

        let mut other: Form = Form::new();
        let err = other.set_fields([("name", name.form_field())]).unwrap_err();
        assert!(matches!(err, FormError::FieldAlreadyBound(field) if field == "name"));
        assert!(other.fields().is_err());

        let fresh = Field::text();
        form.set_fields([("name", fresh.form_field())]).unwrap();
        assert_eq!(form.fields().unwrap().len(), 1);
    }

    #[test]
    fn same_field_under_two_names_is_rejected() {
        let name = Field::text();
        let mut form: Form = Form::new();
        let err = form
            .set_fields([("a", name.form_field()), ("b", name.form_field())])
            .unwrap_err();
        assert!(matches!(err, FormError::DuplicateField(field) if field == "b"));
        assert!(!name.is_bound());
        assert!(form.fields().is_err());

        form.set_fields([("a", name.form_field())]).unwrap();
        assert!(name.is_bound());
    }

    #[test]
    fn failed_rebind_keeps_previous_mapping() {
        let taken = Field::text();
        let mut owner: Form = Form::new();
        owner.set_fields([("taken", taken.form_field())]).unwrap();

        let current = Field::text();
        let fresh = Field::text();
        let mut form: Form = Form::new();
        form.set_fields([("current", current.form_field())]).unwrap();

        let err = form
            .set_fields([("fresh", fresh.form_field()), ("taken", taken.form_field())])
            .unwrap_err();
        assert!(matches!(err, FormError::FieldAlreadyBound(field) if field == "taken"));
        assert!(!fresh.is_bound());
        assert!(current.is_bound());
        assert!(form.field("current").is_ok());
    }

    #[test]
    fn replaced_fields_are_detached() {
        let focused = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&focused);
        let mut form: Form = Form::with_options(FormOptions::new().events(
            EventHooksConfig::new().on_focus(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ));

        let old = Field::text();
        let kept = Field::text();
        form.set_fields([("old", old.form_field()), ("kept", kept.form_field())])
            .unwrap();

        let fresh = Field::text();
        form.set_fields([("kept", kept.form_field()), ("fresh", fresh.form_field())])
            .unwrap();
        assert!(!old.is_bound());
        assert!(kept.is_bound());
        assert!(fresh.is_bound());

        old.on_focus();
        assert_eq!(focused.load(Ordering::SeqCst), 0);
        kept.on_focus();
        fresh.on_focus();
        assert_eq!(focused.load(Ordering::SeqCst), 2);

        let mut other: Form = Form::new();
        other.set_fields([("old", old.form_field())]).unwrap();
    }

    #[test]
    fn unknown_field_is_reported() {
        let mut form: Form = Form::new();
        form.set_fields([("name", Field::text().form_field())]).unwrap();
        assert!(matches!(form.field("nope"), Err(FormError::UnknownField(n)) if n == "nope"));
        assert!(form.field("name").is_ok());
    }

    #[test]
    fn wrong_value_shape_is_rejected() {
        let age: Field<u32> = Field::new();
        let mut form: Form = Form::new();
        form.set_fields([("age", age.form_field())]).unwrap();

        let values = json!({ "age": "old" });
        let err = form
            .set_values(values.as_object().unwrap(), false)
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidValue { field, .. } if field == "age"));
        assert!(matches!(form.set_record(&3, false), Err(FormError::NotAnObject)));
    }
}
