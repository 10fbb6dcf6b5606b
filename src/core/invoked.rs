// src/core/invoked.rs

use crate::core::action::Action;
use crate::models::{ExportedAction, RawValue, RawValues};
use std::collections::HashSet;

/// The result of [`Action::invoke`]: candidates with no callback left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokedAction {
    pub(crate) raw_values: RawValues,
    pub(crate) nospace: bool,
    pub(crate) skipcache: bool,
}

impl InvokedAction {
    /// Wraps already resolved values and their flags.
    pub fn new(raw_values: RawValues, nospace: bool, skipcache: bool) -> Self {
        Self {
            raw_values,
            nospace,
            skipcache,
        }
    }

    /// The candidates, sentinel rows included.
    pub fn raw_values(&self) -> &[RawValue] {
        &self.raw_values
    }

    /// Whether the shell should not append a space.
    pub fn nospace(&self) -> bool {
        self.nospace
    }

    /// Whether an enclosing cache must not persist these values.
    pub fn skipcache(&self) -> bool {
        self.skipcache
    }

    /// Messages of all diagnostic rows, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.raw_values
            .iter()
            .filter(|v| v.is_diagnostic())
            .map(|v| v.description.as_str())
            .collect()
    }

    pub(crate) fn with_flags(mut self, nospace: bool, skipcache: bool) -> Self {
        self.nospace |= nospace;
        self.skipcache |= skipcache;
        self
    }

    /// Back to a static Action carrying the same values and flags.
    pub fn to_action(&self) -> Action {
        self.clone().into_action()
    }

    /// Consuming form of [`to_action`](Self::to_action).
    pub fn into_action(self) -> Action {
        Action::raw_values(self.raw_values).with_flags(self.nospace, self.skipcache)
    }

    /// Prepends `prefix` to the value of every candidate. Display and sentinel
    /// rows are left alone.
    pub fn prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            for value in self.raw_values.iter_mut().filter(|v| !v.is_sentinel()) {
                value.value.insert_str(0, prefix);
            }
        }
        self
    }

    /// Appends `suffix` to the value of every candidate.
    pub fn suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            for value in self.raw_values.iter_mut().filter(|v| !v.is_sentinel()) {
                value.value.push_str(suffix);
            }
        }
        self
    }

    /// Drops candidates whose value is one of `values` (e.g. arguments already
    /// given on the command line).
    pub fn filter<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skip: HashSet<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        self.raw_values
            .retain(|v| v.is_sentinel() || !skip.contains(&v.value));
        self
    }

    /// Combines several results. The first occurrence of a value wins, flags
    /// are ORed.
    pub fn merge<I>(self, others: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut seen = HashSet::new();
        let mut merged = Self::default();
        for invoked in std::iter::once(self).chain(others) {
            merged.nospace |= invoked.nospace;
            merged.skipcache |= invoked.skipcache;
            for value in invoked.raw_values {
                if value.is_sentinel() || seen.insert(value.value.clone()) {
                    merged.raw_values.push(value);
                }
            }
        }
        merged
    }

    /// The versioned export structure.
    pub fn export(&self) -> ExportedAction {
        ExportedAction {
            version: env!("CARGO_PKG_VERSION").to_string(),
            nospace: self.nospace,
            raw_values: self.raw_values.clone(),
        }
    }

    /// [`export`](Self::export) as JSON.
    pub fn export_json(&self) -> String {
        // Plain strings and bools always serialize.
        serde_json::to_string(&self.export()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Action {
    /// Rebuilds a static Action from [`InvokedAction::export_json`] output.
    /// Malformed input yields a diagnostic.
    pub fn import(json: &[u8]) -> Self {
        match serde_json::from_slice::<ExportedAction>(json) {
            Ok(exported) => {
                let action = Self::raw_values(exported.raw_values);
                if exported.nospace {
                    action.no_space()
                } else {
                    action
                }
            }
            Err(e) => Self::message(format!("failed to import completion values: {}", e)),
        }
    }
}
