//! Integration tests for reform
//!
//! These tests drive fields and forms together the way a UI layer would.

use futures_util::stream;
use futures_util::StreamExt;
use reform::prelude::*;
use reform_testing::{HookRecorder, Times};

fn number_field() -> Field<f64> {
    let field = Field::new();
    field.set_value_parser(|input| input.and_then(|s| s.parse().ok()));
    field.add_rule(
        Rule::new(|input: &TextInput| {
            input
                .as_deref()
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(true, |n| n <= 0.0)
        })
        .with_formatter(|_| "Value must be greater than 0".to_string()),
    );
    field
}

fn required_text() -> Field<String> {
    Field::text().with_rule(
        Rule::new(|input: &TextInput| input.as_deref().map_or(true, str::is_empty))
            .with_formatter(|_| "Required".to_string()),
    )
}

// ============================================================================
// Field scenarios
// ============================================================================

mod field_tests {
    use super::*;

    #[tokio::test]
    async fn test_positive_number_field() {
        let field = number_field();

        field.set_input_value(Some("5".into())).unwrap();
        assert_eq!(field.validate().await, Some(5.0));
        assert!(field.is_valid());
        assert_eq!(field.errors(), None);

        field.set_input_value(Some("-1".into())).unwrap();
        assert_eq!(field.validate().await, None);
        assert_eq!(field.errors().map(|errors| errors.len()), Some(1));
        assert!(!field.is_valid());
    }

    #[tokio::test]
    async fn test_edit_hides_errors_until_blur() {
        let field = required_text();
        field.on_change_text("").unwrap();
        field.validate().await;
        assert_eq!(field.errors(), Some(vec!["Required".to_string()]));

        field.on_change_text("B").unwrap();
        assert_eq!(field.errors(), None);
        assert_eq!(field.value(), Some("B".to_string()));
        assert!(!field.is_dirty());

        field.on_change_text("").unwrap();
        field.on_blur();
        tokio::task::yield_now().await;
        field.settled().await;
        assert_eq!(field.errors(), Some(vec!["Required".to_string()]));
    }
}

// ============================================================================
// Form scenarios
// ============================================================================

mod form_tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: f64,
    }

    fn person_form() -> (Form<Person>, Field<String>, Field<f64>) {
        let name = required_text();
        let age = number_field();
        let mut form = Form::new();
        form.set_fields([("name", name.form_field()), ("age", age.form_field())])
            .unwrap();
        (form, name, age)
    }

    #[tokio::test]
    async fn test_validate_is_all_or_nothing() {
        let (form, name, age) = person_form();
        name.set_input_value(Some("Bo".into())).unwrap();
        age.set_input_value(Some("-3".into())).unwrap();

        assert_eq!(form.validate(&[]).await.unwrap(), None);
        assert!(!form.is_valid().unwrap());

        let partial = form.validate_partial(&[]).await.unwrap();
        assert_eq!(partial, json!({ "name": "Bo" }).as_object().cloned());
    }

    #[tokio::test]
    async fn test_validate_named_fields() {
        let (form, name, age) = person_form();
        name.set_input_value(Some("Bo".into())).unwrap();
        age.set_input_value(Some("-3".into())).unwrap();

        let values = form.validate(&["name"]).await.unwrap();
        assert_eq!(values, json!({ "name": "Bo" }).as_object().cloned());
        assert_eq!(age.errors(), None);

        assert!(matches!(
            form.validate(&["email"]).await,
            Err(FormError::UnknownField(name)) if name == "email"
        ));
    }

    #[tokio::test]
    async fn test_validate_all_builds_record() {
        let (form, name, age) = person_form();
        name.on_change_text("Bo").unwrap();
        age.on_change_text("42").unwrap();

        let person = form.validate_all().await.unwrap();
        assert_eq!(
            person,
            Some(Person {
                name: "Bo".into(),
                age: 42.0
            })
        );
        assert_eq!(
            form.values().unwrap(),
            json!({ "name": "Bo", "age": 42.0 }).as_object().cloned()
        );
    }

    #[tokio::test]
    async fn test_partial_with_nothing_valid_is_none() {
        let (form, _name, _age) = person_form();
        form.set_values(&Map::new(), true).unwrap();
        assert_eq!(form.validate_partial(&[]).await.unwrap(), None);
    }

    #[test]
    fn test_set_values_respects_clear() {
        let (form, name, age) = person_form();
        age.set_value(Some(30.0));

        form.set_values(json!({ "name": "Bo" }).as_object().unwrap(), false)
            .unwrap();
        assert_eq!(name.value(), Some("Bo".to_string()));
        assert_eq!(age.value(), Some(30.0));

        form.set_values(&Map::new(), true).unwrap();
        assert_eq!(name.value(), None);
        assert_eq!(age.value(), None);
        assert_eq!(age.input_value(), None);
    }

    #[test]
    fn test_set_record_skips_null_entries() {
        #[derive(Serialize)]
        struct Patch {
            name: Option<String>,
            age: Option<f64>,
        }

        let (form, name, age) = person_form();
        age.set_value(Some(7.0));
        form.set_record(
            &Patch {
                name: Some("Al".into()),
                age: None,
            },
            false,
        )
        .unwrap();

        assert_eq!(name.value(), Some("Al".to_string()));
        assert_eq!(age.value(), Some(7.0));
    }

    #[test]
    fn test_set_fields_clears_errors() {
        let name = required_text();
        assert!(!name.is_valid());

        let mut form: Form = Form::new();
        form.set_fields([("name", name.form_field())]).unwrap();
        assert!(name.is_valid());
        assert!(form.is_valid().unwrap());
    }
}

// ============================================================================
// Event propagation
// ============================================================================

mod event_tests {
    use super::*;

    #[tokio::test]
    async fn test_field_hook_runs_before_form_hook() {
        let recorder = HookRecorder::new();

        let field_focus = recorder.hook("field.focus");
        let field_blur = recorder.hook("field.blur");
        let name = Field::text_with_options(
            FieldOptions::new()
                .on_focus(move |_| field_focus())
                .on_blur(move |_| field_blur()),
        );

        let form_change = recorder.hook("form.change");
        let form_blur = recorder.hook("form.blur");
        let mut form: Form = Form::with_options(FormOptions::new().events(
            EventHooksConfig::new()
                .on_change(move |_, _| form_change())
                .on_blur(move |_| form_blur()),
        ));
        form.set_fields([("name", name.form_field())]).unwrap();

        name.on_focus();
        name.on_change_text("Bo").unwrap();
        name.on_blur();

        assert_eq!(
            recorder.events(),
            vec!["field.focus", "form.change", "field.blur", "form.blur"]
        );
        recorder.verify("form.change", Times::Once);
    }

    #[tokio::test]
    async fn test_form_hooks_can_change_after_binding() {
        let recorder = HookRecorder::new();
        let name = Field::text();
        let mut form: Form = Form::new();
        form.set_fields([("name", name.form_field())]).unwrap();

        let focus = recorder.hook("form.focus");
        form.set_events(&EventHooksConfig::new().on_focus(move |_| focus()));
        name.on_focus();

        recorder.verify("form.focus", Times::Once);
    }
}

// ============================================================================
// Streamed validators in forms
// ============================================================================

mod stream_tests {
    use super::*;

    fn even_validator(subject: &InputOrValue<String, u32>) -> StepStream<u32> {
        let parsed = match subject {
            InputOrValue::Input(s) => s.parse::<u32>().ok(),
            InputOrValue::Value(n) => Some(*n),
            InputOrValue::Empty => None,
        };
        let steps = match parsed {
            Some(n) if n % 2 == 0 => vec![Ok(Step::Done(Some(n)))],
            Some(_) => vec![Ok(Step::Error("Must be even".to_string())), Ok(Step::Done(None))],
            None => vec![Ok(Step::Error("Not a number".to_string())), Ok(Step::Done(None))],
        };
        stream::iter(steps).boxed()
    }

    #[tokio::test]
    async fn test_stream_field_in_form() {
        let count: StreamField<u32> = StreamField::new(even_validator);
        let label = Field::text();

        let mut form: Form = Form::new();
        form.set_fields([("count", count.form_field()), ("label", label.form_field())])
            .unwrap();

        count.on_change("3".to_string());
        label.on_change_text("pairs").unwrap();
        assert_eq!(form.validate(&[]).await.unwrap(), None);
        assert_eq!(count.errors(), Some(vec!["Must be even".to_string()]));

        count.on_change("4".to_string());
        let values = form.validate(&[]).await.unwrap();
        assert_eq!(
            values,
            json!({ "count": 4, "label": "pairs" }).as_object().cloned()
        );

        form.set_values(json!({ "count": 8 }).as_object().unwrap(), false)
            .unwrap();
        assert_eq!(count.value(), Some(8));
        assert_eq!(count.input_value(), None);
    }

    #[tokio::test]
    async fn test_rules_validator_drives_stream_field() {
        let rules = RuleSet::new().with(
            Rule::new(|subject: &InputOrValue<String, String>| {
                subject.input().map_or(false, |s| s.len() < 3)
            })
            .with_formatter(|_| "At least 3 characters".to_string()),
        );
        let field: StreamField<String> =
            StreamField::new(RulesValidator::new(rules).with_parser(|s: &String| Some(s.clone())));

        field.on_change("ab".to_string());
        assert_eq!(field.validate().await, None);
        assert_eq!(field.first_error(), Some("At least 3 characters".to_string()));

        field.on_change("abc".to_string());
        assert_eq!(field.validate().await, Some("abc".to_string()));
        assert!(field.is_valid());
    }
}
