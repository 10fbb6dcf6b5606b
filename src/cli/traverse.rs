// src/cli/traverse.rs

//! Walks a `clap::Command` tree over the words a shell passed in, to find out
//! what the last word is: a flag value, a flag name, a positional argument or
//! an argument after `--`.
//!
//! This is not a parser. Words are only classified as far as completion needs
//! it; nothing is validated.

use crate::core::uid;
use clap::{Arg, ArgAction, Command};
use std::collections::HashSet;

/// What the word being completed is.
#[derive(Debug, Clone)]
pub enum Target {
    /// The value of `arg`. `prefix` is the part of the word before the value
    /// (`--output=`, `-o`), `value` the part being completed.
    FlagValue {
        arg: Box<Arg>,
        prefix: String,
        value: String,
    },
    /// A flag name (`-`, `--ver`, `-ab`).
    FlagNames,
    /// The positional argument at `index`.
    Positional { index: usize },
    /// The `index`th word after `--`.
    Dash { index: usize },
}

/// The state reached after walking every word but the last.
#[derive(Debug, Clone)]
pub struct Traversal {
    /// The innermost subcommand, built (globals propagated, help flags added).
    pub command: Command,
    /// Command names from the root to [`command`](Self::command).
    pub path: Vec<String>,
    /// Positional arguments of the innermost command.
    pub args: Vec<String>,
    /// Words after `--`.
    pub dash_args: Vec<String>,
    /// Ids of the flags already present on the line.
    pub used_flags: HashSet<String>,
    /// The word being completed.
    pub current: String,
    /// What the current word completes.
    pub target: Target,
}

impl Traversal {
    /// Walks `root` over `words`. The first word is the program name, the
    /// last the (possibly empty) word being completed.
    pub fn walk(root: &Command, words: &[String]) -> Self {
        let mut command = root.clone();
        command.build();

        let (current, previous) = match words.split_last() {
            Some((current, previous)) => (current.clone(), previous.get(1..).unwrap_or_default()),
            None => (String::new(), &[][..]),
        };

        let mut path = vec![command.get_name().to_string()];
        let mut args = Vec::new();
        let mut dash_args = Vec::new();
        let mut used_flags = HashSet::new();
        let mut dash = false;
        let mut pending: Option<Arg> = None;

        for word in previous {
            if dash {
                dash_args.push(word.clone());
                continue;
            }
            if pending.take().is_some() {
                continue;
            }
            if word == "--" {
                dash = true;
                continue;
            }

            if let Some(long) = word.strip_prefix("--") {
                let (name, inline) = match long.split_once('=') {
                    Some((name, _)) => (name, true),
                    None => (long, false),
                };
                if let Some(arg) = find_long(&command, name) {
                    used_flags.insert(arg.get_id().to_string());
                    if takes_value(arg) && !inline {
                        pending = Some(arg.clone());
                    }
                }
                continue;
            }

            if let Some(cluster) = word.strip_prefix('-').filter(|c| !c.is_empty()) {
                for (idx, ch) in cluster.char_indices() {
                    let Some(arg) = find_short(&command, ch) else {
                        continue;
                    };
                    used_flags.insert(arg.get_id().to_string());
                    if takes_value(arg) {
                        // `-ovalue` carries its value, `-o` takes the next word.
                        if cluster.len() == idx + ch.len_utf8() {
                            pending = Some(arg.clone());
                        }
                        break;
                    }
                }
                continue;
            }

            if args.is_empty()
                && let Some(sub) = command.find_subcommand(word)
            {
                let sub = sub.clone();
                path.push(sub.get_name().to_string());
                used_flags.clear();
                command = sub;
                continue;
            }
            args.push(word.clone());
        }

        let target = if let Some(arg) = pending {
            Target::FlagValue {
                arg: Box::new(arg),
                prefix: String::new(),
                value: current.clone(),
            }
        } else if dash {
            Target::Dash {
                index: dash_args.len(),
            }
        } else {
            classify_current(&command, &current, args.len())
        };

        log::debug!(
            "Traversed to '{}' with args {:?}, target {:?}",
            path.join(" "),
            args,
            target
        );

        Self {
            command,
            path,
            args,
            dash_args,
            used_flags,
            current,
            target,
        }
    }

    /// Uid of the innermost command.
    pub fn command_uid(&self) -> String {
        uid::command(&self.path)
    }

    /// Uids from the innermost command up to the root. Global flags are
    /// registered on the command declaring them.
    pub fn ancestor_uids(&self) -> Vec<String> {
        (1..=self.path.len())
            .rev()
            .map(|n| uid::command(self.path.get(..n).unwrap_or_default()))
            .collect()
    }
}

fn classify_current(command: &Command, current: &str, index: usize) -> Target {
    if let Some(long) = current.strip_prefix("--") {
        if let Some((name, value)) = long.split_once('=') {
            if let Some(arg) = find_long(command, name).filter(|a| takes_value(a)) {
                return Target::FlagValue {
                    arg: Box::new(arg.clone()),
                    prefix: format!("--{}=", name),
                    value: value.to_string(),
                };
            }
        }
        return Target::FlagNames;
    }

    if let Some(cluster) = current.strip_prefix('-') {
        for (idx, ch) in cluster.char_indices() {
            let Some(arg) = find_short(command, ch).filter(|a| takes_value(a)) else {
                continue;
            };
            let split = idx + ch.len_utf8();
            if split < cluster.len() {
                return Target::FlagValue {
                    arg: Box::new(arg.clone()),
                    prefix: format!("-{}", cluster.get(..split).unwrap_or_default()),
                    value: cluster.get(split..).unwrap_or_default().to_string(),
                };
            }
            break;
        }
        return Target::FlagNames;
    }

    Target::Positional { index }
}

pub(crate) fn takes_value(arg: &Arg) -> bool {
    arg.get_action().takes_values()
}

/// Flags that may appear more than once.
pub(crate) fn is_repeatable(arg: &Arg) -> bool {
    matches!(arg.get_action(), ArgAction::Append | ArgAction::Count)
}

fn find_long<'a>(command: &'a Command, name: &str) -> Option<&'a Arg> {
    command.get_arguments().find(|a| {
        a.get_long() == Some(name)
            || a.get_all_aliases().is_some_and(|aliases| aliases.contains(&name))
    })
}

fn find_short(command: &Command, ch: char) -> Option<&Arg> {
    command.get_arguments().find(|a| {
        a.get_short() == Some(ch)
            || a.get_all_short_aliases().is_some_and(|aliases| aliases.contains(&ch))
    })
}
