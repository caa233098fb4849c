//! Field and form pass benchmarks
//!
//! Measures a full explicit validation pass through a field, and form-wide
//! validation fanning out to several fields.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reform_core::{Field, Form, TextInput};
use reform_validate::Rule;
use tokio::runtime::Runtime;

fn required_text() -> Field<String> {
    Field::text().with_rule(
        Rule::new(|input: &TextInput| input.as_deref().map_or(true, str::is_empty))
            .with_formatter(|_| "Required".to_string()),
    )
}

/// Benchmark set-input-then-validate on one field
fn bench_field_pass(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let field = required_text();

    c.bench_function("field_set_and_validate", |b| {
        b.iter(|| {
            field
                .set_input_value(Some(black_box("value").to_string()))
                .unwrap();
            rt.block_on(field.validate())
        })
    });
}

/// Benchmark form validation over a growing number of fields
fn bench_form_validate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("form_validate");

    for count in [2usize, 8, 32] {
        let fields: Vec<Field<String>> = (0..count).map(|_| required_text()).collect();
        for field in &fields {
            field.set_input_value(Some("value".to_string())).unwrap();
        }
        let mut form: Form = Form::new();
        form.set_fields(
            fields
                .iter()
                .enumerate()
                .map(|(i, field)| (format!("field_{i}"), field.form_field())),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), &form, |b, form| {
            b.iter(|| rt.block_on(form.validate(&[])).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_field_pass, bench_form_validate);
criterion_main!(benches);
