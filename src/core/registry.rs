// src/core/registry.rs

//! The table of Actions a host program registers at startup.
//!
//! ```
//! use quiver::{Action, Registry};
//!
//! let mut registry = Registry::new();
//! registry
//!     .command(&["example", "remote"])
//!     .flag("url", Action::values(["https://", "ssh://"]).no_space())
//!     .positional(0, Action::values(["origin", "upstream"]));
//! ```

use crate::core::action::{Action, ActionMap};
use crate::core::uid;
use std::collections::HashMap;

/// Actions keyed by the identifiers of [`crate::core::uid`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    actions: HashMap<String, Action>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts registering completions for the command at `path` (root first).
    pub fn command<S: AsRef<str>>(&mut self, path: &[S]) -> CommandCompletion<'_> {
        CommandCompletion {
            command_uid: uid::command(path),
            registry: self,
        }
    }

    /// Registers `action` under a raw identifier.
    pub fn insert(&mut self, uid: impl Into<String>, action: Action) {
        let uid = uid.into();
        if self.actions.insert(uid.clone(), action).is_some() {
            log::debug!("Replaced completion registered for '{}'", uid);
        }
    }

    /// The Action registered under exactly `uid`.
    pub fn get(&self, uid: &str) -> Option<&Action> {
        self.actions.get(uid)
    }

    /// Number of registered Actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The Action of a flag, trying each of `names` (long name first, then
    /// short) in order.
    pub fn find_flag(&self, command_uid: &str, names: &[&str]) -> Option<&Action> {
        names.iter().find_map(|name| self.get(&uid::flag(command_uid, name)))
    }

    /// The Action of the positional at `index`, falling back to the
    /// catch-all positional.
    pub fn find_positional(&self, command_uid: &str, index: usize) -> Option<&Action> {
        self.get(&uid::positional(command_uid, index))
            .or_else(|| self.get(&uid::positional_any(command_uid)))
    }

    /// The Action of the `index`th argument after `--`, falling back to the
    /// catch-all dash completion.
    pub fn find_dash(&self, command_uid: &str, index: usize) -> Option<&Action> {
        self.get(&uid::dash(command_uid, index))
            .or_else(|| self.get(&uid::dash_any(command_uid)))
    }

    /// [`find_flag`](Self::find_flag), or an empty Action when nothing is
    /// registered.
    /// Like [`find_flag`](Self::find_flag), with no candidates when nothing is
    /// registered.
    pub fn flag_action(&self, command_uid: &str, names: &[&str]) -> Action {
        self.find_flag(command_uid, names).cloned().unwrap_or_default()
    }

    /// Like [`find_positional`](Self::find_positional), with no candidates when
    /// nothing is registered.
    pub fn positional_action(&self, command_uid: &str, index: usize) -> Action {
        self.find_positional(command_uid, index).cloned().unwrap_or_default()
    }

    /// Like [`find_dash`](Self::find_dash), with no candidates when nothing is
    /// registered.
    pub fn dash_action(&self, command_uid: &str, index: usize) -> Action {
        self.find_dash(command_uid, index).cloned().unwrap_or_default()
    }
}

/// Builder returned by [`Registry::command`].
#[derive(Debug)]
pub struct CommandCompletion<'a> {
    registry: &'a mut Registry,
    command_uid: String,
}

impl CommandCompletion<'_> {
    /// Completion for the value of the flag `name` (long or short).
    pub fn flag(self, name: &str, action: Action) -> Self {
        self.registry.insert(uid::flag(&self.command_uid, name), action);
        self
    }

    /// [`flag`](Self::flag) for every entry of `actions`.
    pub fn flags(self, actions: ActionMap) -> Self {
        for (name, action) in actions {
            self.registry.insert(uid::flag(&self.command_uid, &name), action);
        }
        self
    }

    /// Completion for the `index`th positional argument.
    pub fn positional(self, index: usize, action: Action) -> Self {
        self.registry.insert(uid::positional(&self.command_uid, index), action);
        self
    }

    /// Completion for positionals without an index-specific Action.
    pub fn positional_any(self, action: Action) -> Self {
        self.registry.insert(uid::positional_any(&self.command_uid), action);
        self
    }

    /// Completion for the `index`th argument after `--`.
    pub fn dash(self, index: usize, action: Action) -> Self {
        self.registry.insert(uid::dash(&self.command_uid, index), action);
        self
    }

    /// Completion for arguments after `--` without an index-specific Action.
    pub fn dash_any(self, action: Action) -> Self {
        self.registry.insert(uid::dash_any(&self.command_uid), action);
        self
    }
}
