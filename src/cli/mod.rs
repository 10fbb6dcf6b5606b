// src/cli/mod.rs

//! The hidden `_quiver` command a host program exposes to shells.
//!
//! ```text
//! <host> _quiver <shell>                  print the completion snippet
//! <host> _quiver <shell> <words...>       complete the last word
//! <host> _quiver style list|set k=v...    inspect or change styles
//! <host> _quiver cache inspect|clear      inspect or clear cached values
//! ```

use crate::constants::COMPLETION_COMMAND;
use crate::core::registry::Registry;
use crate::system::shell::Shell;
use anyhow::{Result, anyhow};
use clap::ValueEnum;
use std::io::{self, Write};

pub mod handlers;
pub mod traverse;

/// A host program's command model plus the completions registered for it.
#[derive(Debug, Clone)]
pub struct Host {
    /// The host's command tree.
    pub command: clap::Command,
    /// Completions keyed by command, flag and positional.
    pub registry: Registry,
}

impl Host {
    /// Pairs a command tree with its completions.
    pub fn new(command: clap::Command, registry: Registry) -> Self {
        Self { command, registry }
    }

    /// The name shells know the host program by.
    pub fn name(&self) -> &str {
        self.command.get_name()
    }
}

// --- Command Definition and Registry ---

/// A `_quiver` subcommand that is not a shell name.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(&Host, Vec<String>, &mut dyn Write) -> Result<()>,
}

static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "style",
        aliases: &["styles"],
        handler: handlers::styles::handle,
    },
    CommandDefinition {
        name: "cache",
        aliases: &[],
        handler: handlers::cache::handle,
    },
];

fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Whether `args` (as from `std::env::args`) ask for completion.
pub fn is_completion_request(args: &[String]) -> bool {
    args.get(1).is_some_and(|arg| arg == COMPLETION_COMMAND)
}

/// Handles the arguments following `_quiver`, writing the result to `out`.
///
/// # Errors
/// Fails for an unknown subcommand or shell, and when a handler fails.
/// Completion itself never fails: problems end up as diagnostics inside the
/// encoded output.
pub fn dispatch(host: &Host, args: Vec<String>, out: &mut dyn Write) -> Result<()> {
    log::debug!("Dispatching completion request: {:?}", args);

    let Some((first, rest)) = args.split_first() else {
        return Err(anyhow!(t!("cli.error.missing_request")));
    };

    if let Some(command) = find_command(first) {
        return (command.handler)(host, rest.to_vec(), out);
    }

    let shell = Shell::from_str(first, true)
        .map_err(|_| anyhow!(t!("cli.error.unknown_shell"), shell = first))?;
    if rest.is_empty() {
        handlers::snippet::handle(host, shell, out)
    } else {
        handlers::complete::handle(host, shell, rest.to_vec(), out)
    }
}

/// Runs [`dispatch`] for a full argument list (program name first) and prints
/// to stdout.
pub fn run(host: &Host, args: &[String]) -> Result<()> {
    let request = args.get(2..).unwrap_or_default().to_vec();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(host, request, &mut out)?;
    out.flush()?;
    Ok(())
}
