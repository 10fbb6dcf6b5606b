// src/core/context.rs

use std::collections::HashMap;

/// The environment a completion is resolved in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// The (partial) value currently being completed. During
    /// [`Action::multi_parts`](crate::Action::multi_parts) only the part after
    /// the last divider.
    pub callback_value: String,
    /// Positional arguments of the current (sub)command, excluding the one
    /// being completed.
    pub args: Vec<String>,
    /// Already completed parts of a multi-part value.
    pub parts: Vec<String>,
    /// `KEY=VALUE` overlay passed to any process started during resolution.
    pub env: Vec<String>,
}

impl Context {
    /// A context completing `value` with no prior arguments.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            callback_value: value.into(),
            ..Self::default()
        }
    }

    /// A context completing `value` after the given positional arguments.
    pub fn with_args<I, S>(value: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            callback_value: value.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns a copy with `KEY=VALUE` appended to the env overlay.
    ///
    /// Earlier assignments of the same key are kept; whoever consumes the
    /// overlay applies them in order, so the last one wins.
    pub fn setenv(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    /// Looks up a key in the env overlay only (not the process environment).
    pub fn getenv(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .filter_map(|entry| entry.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Folds the overlay into a map. Malformed entries without `=` are skipped.
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env
            .iter()
            .filter_map(|entry| entry.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setenv_appends_without_touching_original() {
        let base = Context::new("val");
        let derived = base.clone().setenv("A", "1");
        assert!(base.env.is_empty());
        assert_eq!(derived.env, vec!["A=1".to_string()]);
        assert_eq!(derived.callback_value, "val");
    }

    #[test]
    fn test_last_assignment_wins() {
        let c = Context::default().setenv("A", "1").setenv("B", "x").setenv("A", "2");
        assert_eq!(c.env.len(), 3);
        assert_eq!(c.getenv("A"), Some("2"));
        assert_eq!(c.env_vars().get("A").map(String::as_str), Some("2"));
        assert_eq!(c.getenv("C"), None);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let c = Context::default().setenv("OPTS", "a=b");
        assert_eq!(c.getenv("OPTS"), Some("a=b"));
    }
}
