//! Diff customization: rules run against a proposed change before any
//! API call is made.

use std::fmt;
use tracing::debug;

use crate::error::{DiffError, DiffErrors};
use crate::schema::Value;

use super::resource_diff::ResourceDiff;

type Check = Box<dyn Fn(&ResourceDiff<'_>) -> Result<(), DiffError> + Send + Sync>;

/// A single rule evaluated against a [`ResourceDiff`].
pub struct DiffRule {
    description: String,
    check: Check,
}

impl DiffRule {
    /// Runs `check` against the whole diff.
    pub fn validate<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ResourceDiff<'_>) -> Result<(), DiffError> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Box::new(check),
        }
    }

    /// Runs `check` with the applied and proposed value of `key`.
    pub fn validate_change<F>(key: &str, check: F) -> Self
    where
        F: Fn(&str, Option<&Value>, Option<&Value>) -> Result<(), DiffError>
            + Send
            + Sync
            + 'static,
    {
        let key = key.to_string();
        Self {
            description: format!("change of '{key}'"),
            check: Box::new(move |diff: &ResourceDiff<'_>| {
                let (old, new) = diff.get_change(&key);
                check(key.as_str(), old, new)
            }),
        }
    }

    /// Runs `check` with the proposed value of `key`.
    pub fn validate_value<F>(key: &str, check: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<(), DiffError> + Send + Sync + 'static,
    {
        let key = key.to_string();
        Self {
            description: format!("value of '{key}'"),
            check: Box::new(move |diff: &ResourceDiff<'_>| check(diff.get(&key))),
        }
    }

    /// Runs `rule` only when `condition` holds for the proposed value of `key`.
    pub fn if_value<P>(key: &str, condition: P, rule: Self) -> Self
    where
        P: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        let key = key.to_string();
        let Self { description, check } = rule;
        Self {
            description: format!("{description} (if '{key}' matches)"),
            check: Box::new(move |diff: &ResourceDiff<'_>| {
                if condition(diff.get(&key)) {
                    check(diff)
                } else {
                    Ok(())
                }
            }),
        }
    }

    /// Runs `rule` only when `condition` holds for the whole diff.
    pub fn if_diff<P>(condition: P, rule: Self) -> Self
    where
        P: Fn(&ResourceDiff<'_>) -> bool + Send + Sync + 'static,
    {
        let Self { description, check } = rule;
        Self {
            description: format!("{description} (if diff matches)"),
            check: Box::new(move |diff: &ResourceDiff<'_>| {
                if condition(diff) {
                    check(diff)
                } else {
                    Ok(())
                }
            }),
        }
    }

    /// Short description used in logs.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for DiffRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffRule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered set of rules; every rule runs and every rejection is reported.
#[derive(Debug, Default)]
pub struct CustomizeDiff {
    rules: Vec<DiffRule>,
}

impl CustomizeDiff {
    /// Creates an empty rule set, which accepts every change.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule(mut self, rule: DiffRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule against `diff`.
    ///
    /// # Errors
    ///
    /// Returns all rejections if at least one rule rejected the change.
    pub fn run(&self, diff: &ResourceDiff<'_>) -> Result<(), DiffErrors> {
        let errors: Vec<DiffError> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let outcome = (rule.check)(diff);
                debug!(
                    "Diff rule {}: {}",
                    rule.description,
                    if outcome.is_ok() { "accepted" } else { "rejected" }
                );
                outcome.err()
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DiffErrors(errors))
        }
    }
}
