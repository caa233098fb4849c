//! Property and scenario tests for rule evaluation.

use async_stream::stream;
use futures_util::StreamExt;
use proptest::prelude::*;
use reform_validate::prelude::*;
use std::time::Duration;

fn threshold_rule(threshold: i64, label: usize) -> Rule<i64, bool> {
    Rule::new(move |x: &i64| *x < threshold).with_formatter(move |_| format!("rule {label}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A rule with default predicate and formatter accepts empty strings and
    /// reports non-empty ones verbatim.
    #[test]
    fn prop_default_rule_is_identity(message in ".{0,24}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let rule = Rule::new(|s: &String| s.clone());
        let set = RuleSet::new().with(rule);

        let result = rt.block_on(set.validate(&message));
        if message.is_empty() {
            prop_assert_eq!(result, None);
        } else {
            prop_assert_eq!(result, Some(vec![message.clone()]));
        }
    }

    /// The rule set reports `None` exactly when every rule accepts, and
    /// otherwise lists the failed rules in insertion order.
    #[test]
    fn prop_errors_follow_rule_order(
        thresholds in prop::collection::vec(-50i64..50, 0..8),
        input in -60i64..60,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let set: RuleSet<i64> = thresholds
            .iter()
            .enumerate()
            .map(|(label, t)| threshold_rule(*t, label))
            .collect();

        let expected: Vec<String> = thresholds
            .iter()
            .enumerate()
            .filter(|(_, t)| input < **t)
            .map(|(label, _)| format!("rule {label}"))
            .collect();

        let result = rt.block_on(set.validate(&input));
        if expected.is_empty() {
            prop_assert_eq!(result, None);
        } else {
            prop_assert_eq!(result, Some(expected));
        }
    }

    /// Validating twice with the same input yields the same errors.
    #[test]
    fn prop_validation_is_idempotent(
        thresholds in prop::collection::vec(-50i64..50, 1..6),
        input in -60i64..60,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let set: RuleSet<i64> = thresholds
            .iter()
            .enumerate()
            .map(|(label, t)| threshold_rule(*t, label))
            .collect();

        let first = rt.block_on(set.validate(&input));
        let second = rt.block_on(set.validate(&input));
        prop_assert_eq!(first, second);
    }
}

#[tokio::test]
async fn slow_rules_keep_their_position() {
    let slow = Rule::from_async(|_: &str| async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        "slow failure"
    });
    let fast = Rule::from_async(|_: &str| async { "fast failure" });

    let set = RuleSet::new().with(slow).with(fast);
    assert_eq!(
        set.validate("x").await,
        Some(vec!["slow failure".to_string(), "fast failure".to_string()])
    );
}

#[tokio::test]
async fn failing_rule_does_not_abort_siblings() {
    let set = RuleSet::new()
        .with(Rule::<str, bool>::try_async(|_| async {
            Err::<bool, _>("service unavailable")
        }))
        .with(Rule::new(|s: &str| if s.is_empty() { "Required" } else { "" }))
        .with(Rule::<str, bool>::new(|_| panic!("broken rule")));

    let errors = set.validate("").await.unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "service unavailable");
    assert_eq!(errors[1], "Required");
    assert!(errors[2].contains("broken rule"));
}

#[tokio::test]
async fn streamed_validator_yields_steps_lazily() {
    let validator = |subject: &InputOrValue<String, u32>| -> StepStream<u32> {
        let input = subject.input().cloned().unwrap_or_default();
        stream! {
            if input.is_empty() {
                yield Ok(Step::Error("Required".to_string()));
            }
            yield Ok(Step::Continue);
            tokio::time::sleep(Duration::from_millis(5)).await;
            match input.parse::<u32>() {
                Ok(n) => yield Ok(Step::Done(Some(n))),
                Err(e) => {
                    yield Err(ValidatorError::failed(e));
                    yield Ok(Step::Done(None));
                }
            }
        }
        .boxed()
    };

    let steps: Vec<_> = validator
        .validate(&InputOrValue::Input("42".to_string()))
        .collect()
        .await;
    assert_eq!(steps, vec![Ok(Step::Continue), Ok(Step::Done(Some(42)))]);

    let steps: Vec<_> = validator.validate(&InputOrValue::Empty).collect().await;
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0], Ok(Step::Error("Required".to_string())));
    assert!(steps[2].is_err());
    assert_eq!(steps[3], Ok(Step::Done(None)));
}
