//! Hook invocation recording.

use std::sync::{Arc, Mutex, PoisonError};

/// How many times a hook is expected to have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    Any,
}

/// Shared, ordered log of labelled hook invocations.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: impl Into<String>) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label.into());
    }

    /// A closure recording `label` each time it is called.
    pub fn hook(&self, label: impl Into<String>) -> impl Fn() + Send + Sync + 'static {
        let recorder = self.clone();
        let label = label.into();
        move || recorder.record(label.clone())
    }

    /// Every recorded label, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|recorded| *recorded == label)
            .count()
    }

    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Assert how often `label` was recorded.
    pub fn verify(&self, label: &str, times: Times) {
        let calls = self.count(label);
        match times {
            Times::Once => assert_eq!(calls, 1, "hook {label:?} expected 1 call, got {calls}"),
            Times::Exactly(n) => {
                assert_eq!(calls, n, "hook {label:?} expected {n} calls, got {calls}")
            }
            Times::AtLeast(n) => assert!(
                calls >= n,
                "hook {label:?} expected at least {n} calls, got {calls}"
            ),
            Times::AtMost(n) => assert!(
                calls <= n,
                "hook {label:?} expected at most {n} calls, got {calls}"
            ),
            Times::Any => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_record_in_order() {
        let recorder = HookRecorder::new();
        let blur = recorder.hook("blur");
        recorder.record("focus");
        blur();
        blur();

        assert_eq!(recorder.events(), vec!["focus", "blur", "blur"]);
        recorder.verify("blur", Times::Exactly(2));
        recorder.verify("focus", Times::Once);
        recorder.verify("change", Times::AtMost(0));
    }
}
