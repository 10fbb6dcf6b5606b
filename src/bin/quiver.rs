// src/bin/quiver.rs

//! A small host program showing how to wire completions into a clap CLI.
//!
//! ```text
//! quiver _quiver bash > ~/.local/share/bash-completion/completions/quiver
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use quiver::cli::{self, Host};
use quiver::core::style;
use quiver::{Action, ActionMap, Registry};
use std::env;
use std::fs;
use std::time::Duration;

/// quiver: a demo of composable shell completions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// When to color the output.
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: DemoCommand,
}

#[derive(Subcommand, Debug)]
enum DemoCommand {
    /// Completes files, optionally filtered by extension.
    Files {
        /// Only offer files with this extension.
        #[arg(long, short)]
        ext: Option<String>,
        paths: Vec<String>,
    },
    /// Completes directories.
    Cd { dir: Option<String> },
    /// Completes files in the home directory.
    Home { file: Option<String> },
    /// Completes environment variable names, cached for a minute.
    Env { name: Option<String> },
    /// Completes `user@host`.
    Ssh { destination: Option<String> },
    /// Completes anything after `--` with directories.
    Exec {
        #[arg(last = true)]
        rest: Vec<String>,
    },
}

fn registry() -> Registry {
    let mut registry = Registry::new();

    registry.command(&["quiver"]).flags(ActionMap::from([(
        "color".to_string(),
        Action::values(["always", "never", "auto"]).style_f(style::for_keyword),
    )]));

    registry
        .command(&["quiver", "files"])
        .flag("ext", Action::values([".rs", ".toml", ".md"]))
        .positional_any(Action::files(Vec::<String>::new()));

    registry.command(&["quiver", "cd"]).positional(0, Action::directories());

    registry
        .command(&["quiver", "home"])
        .positional(0, Action::files(Vec::<String>::new()).chdir("~"));

    registry.command(&["quiver", "env"]).positional(
        0,
        Action::exec_command("env", Vec::<String>::new(), |output| {
            let text = String::from_utf8_lossy(output);
            Action::values_described(
                text.lines()
                    .filter_map(|line| line.split_once('='))
                    .map(|(name, value)| (name.to_string(), value.to_string())),
            )
        })
        .cache(Duration::from_secs(60), ["env"]),
    );

    registry.command(&["quiver", "ssh"]).positional(
        0,
        Action::multi_parts("@", |c| {
            if c.parts.is_empty() {
                let user = env::var("USER").unwrap_or_default();
                return Action::values([format!("{}@", user)]).no_space();
            }
            Action::callback(|_| match fs::read_to_string("/etc/hosts") {
                Ok(content) => Action::values(
                    content
                        .lines()
                        .filter(|line| !line.trim_start().starts_with('#'))
                        .flat_map(|line| line.split_whitespace().skip(1))
                        .map(str::to_string)
                        .collect::<Vec<_>>(),
                ),
                Err(e) => Action::message(format!("/etc/hosts: {}", e)),
            })
            .suppress(["No such file"])
        }),
    );

    registry.command(&["quiver", "exec"]).dash_any(Action::directories());

    registry
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let result = if cli::is_completion_request(&args) {
        let host = Host::new(Cli::command(), registry());
        cli::run(&host, &args)
    } else {
        run_demo(Cli::parse_from(&args))
    };

    if let Err(e) = result {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_demo(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let command = format!("{:?}", cli.command);
    println!("{}", format!(quiver::t!("demo.info.parsed"), command = command).dimmed());
    Ok(())
}
