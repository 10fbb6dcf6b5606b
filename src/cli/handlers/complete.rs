// src/cli/handlers/complete.rs

use crate::cli::Host;
use crate::cli::traverse::{self, Target, Traversal};
use crate::core::action::Action;
use crate::core::context::Context;
use crate::core::invoked::InvokedAction;
use crate::core::style_config;
use crate::models::RawValue;
use crate::system::shell::Shell;
use anyhow::Result;
use clap::{Arg, Command};
use std::io::Write;

/// Completes the last of `words` and writes it encoded for `shell`.
pub fn handle(host: &Host, shell: Shell, words: Vec<String>, out: &mut dyn Write) -> Result<()> {
    let words = normalize_words(shell, words);
    let current = words.last().cloned().unwrap_or_default();
    let invoked = complete(host, &words);
    log::debug!(
        "Completed '{}' with {} values (nospace: {})",
        current,
        invoked.raw_values().len(),
        invoked.nospace()
    );
    write!(out, "{}", shell.encode(&invoked, &current))?;
    Ok(())
}

/// PowerShell cannot pass an empty argument to a native command; its snippet
/// sends `""` instead.
fn normalize_words(shell: Shell, mut words: Vec<String>) -> Vec<String> {
    if shell == Shell::Powershell {
        for word in words.iter_mut().filter(|w| w.as_str() == "\"\"") {
            word.clear();
        }
    }
    if words.len() < 2 {
        words.resize(2, String::new());
    }
    words
}

/// Resolves the completion for the last of `words` (program name first).
pub fn complete(host: &Host, words: &[String]) -> InvokedAction {
    let traversal = Traversal::walk(&host.command, words);
    let registry = &host.registry;

    match &traversal.target {
        Target::FlagValue { arg, prefix, value } => {
            let names = flag_names(arg);
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let action = traversal
                .ancestor_uids()
                .iter()
                .find_map(|uid| registry.find_flag(uid, &names))
                .cloned()
                .unwrap_or_else(|| possible_values(arg));
            let context = Context::with_args(value.clone(), traversal.args.clone());
            action.invoke(&context).prefix(prefix)
        }
        Target::FlagNames => flag_names_action(&traversal).invoke(&Context::new(&traversal.current)),
        Target::Positional { index } => {
            let action = registry
                .find_positional(&traversal.command_uid(), *index)
                .cloned()
                .unwrap_or_else(|| positional_fallback(&traversal.command, *index));
            let context = Context::with_args(traversal.current.clone(), traversal.args.clone());
            let invoked = action.invoke(&context);
            if traversal.args.is_empty() {
                subcommands(&traversal.command)
                    .invoke(&context)
                    .merge([invoked])
            } else {
                invoked
            }
        }
        Target::Dash { index } => {
            let context =
                Context::with_args(traversal.current.clone(), traversal.dash_args.clone());
            registry
                .dash_action(&traversal.command_uid(), *index)
                .invoke(&context)
        }
    }
}

/// Registry names of a flag: long name first, then short.
fn flag_names(arg: &Arg) -> Vec<String> {
    arg.get_long()
        .map(str::to_string)
        .into_iter()
        .chain(arg.get_short().map(String::from))
        .collect()
}

fn possible_values(arg: &Arg) -> Action {
    Action::values_described(
        arg.get_possible_values()
            .iter()
            .filter(|v| !v.is_hide_set())
            .map(|v| {
                let help = v.get_help().map(ToString::to_string).unwrap_or_default();
                (v.get_name().to_string(), help)
            }),
    )
}

fn positional_fallback(command: &Command, index: usize) -> Action {
    let positionals: Vec<&Arg> = command.get_positionals().collect();
    let arg = positionals.get(index).or_else(|| {
        positionals
            .last()
            .filter(|a| traverse::is_repeatable(a) || a.get_num_args().is_some_and(|r| r.max_values() > 1))
    });
    arg.map(|a| possible_values(a)).unwrap_or_default()
}

fn subcommands(command: &Command) -> Action {
    Action::values_described(
        command
            .get_subcommands()
            .filter(|sub| !sub.is_hide_set())
            .map(|sub| {
                let about = sub.get_about().map(ToString::to_string).unwrap_or_default();
                (sub.get_name().to_string(), about)
            }),
    )
}

fn describe_flag(arg: &Arg, name: String) -> RawValue {
    let config = style_config::current();
    let style = if traverse::takes_value(arg) {
        &config.flag_arg
    } else {
        &config.flag
    };
    let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
    RawValue::styled(name, help, style.clone())
}

/// Flag names valid for the current word: `--long` names after `--`, short
/// names (and long-only flags) after a lone `-`, and the shorts still missing
/// from a cluster such as `-ab`.
fn flag_names_action(traversal: &Traversal) -> Action {
    let current = traversal.current.as_str();
    let available: Vec<&Arg> = traversal
        .command
        .get_arguments()
        .filter(|a| !a.is_positional() && !a.is_hide_set())
        .filter(|a| !traversal.used_flags.contains(a.get_id().as_str()) || traverse::is_repeatable(a))
        .collect();

    if current.starts_with("--") {
        return Action::raw_values(
            available
                .iter()
                .filter_map(|a| a.get_long().map(|long| describe_flag(a, format!("--{}", long))))
                .collect(),
        );
    }

    let cluster = current.strip_prefix('-').unwrap_or_default();
    if cluster.is_empty() {
        return Action::raw_values(
            available
                .iter()
                .filter_map(|a| match (a.get_short(), a.get_long()) {
                    (Some(short), _) => Some(describe_flag(a, format!("-{}", short))),
                    (None, Some(long)) => Some(describe_flag(a, format!("--{}", long))),
                    (None, None) => None,
                })
                .collect(),
        );
    }

    // A value-taking flag ends the cluster; what follows would be its value.
    let ends_in_value = cluster
        .chars()
        .last()
        .and_then(|ch| traversal.command.get_arguments().find(|a| a.get_short() == Some(ch)))
        .is_some_and(traverse::takes_value);
    if ends_in_value {
        return Action::values([current]);
    }

    let remaining: Vec<RawValue> = available
        .iter()
        .filter_map(|a| a.get_short().map(|short| (a, short)))
        .filter(|(_, short)| !cluster.contains(*short))
        .map(|(a, short)| describe_flag(a, short.to_string()))
        .collect();
    let prefix = current.to_string();
    Action::callback(move |c| {
        Action::raw_values(remaining.clone())
            .no_space()
            .invoke(c)
            .prefix(&prefix)
            .into_action()
    })
}
