// src/cli/handlers/styles.rs

use crate::cli::Host;
use crate::core::style;
use crate::core::style_config::{self, SECTION, StyleConfig};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;

// --- Command Argument Parsing ---

/// Inspect or change the styles used in completion menus.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct StyleArgs {
    #[command(subcommand)]
    command: StyleSubcommand,
}

#[derive(Subcommand, Debug)]
enum StyleSubcommand {
    /// Lists every style field with its current value.
    List,
    /// Sets styles, e.g. `quiver.error=red,bold`. An empty value restores the
    /// default.
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

// --- Main Handler ---

/// Runs `_quiver style ...`.
pub fn handle(_host: &Host, args: Vec<String>, out: &mut dyn Write) -> Result<()> {
    let style_args = StyleArgs::try_parse_from(&args)?;
    match style_args.command {
        StyleSubcommand::List => {
            let config = StyleConfig::load().context(t!("styles.error.load"))?;
            list_styles(&config, out)
        }
        StyleSubcommand::Set { assignments } => set_styles(&assignments, out),
    }
}

fn list_styles(config: &StyleConfig, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", format!("[{}]", SECTION).bold())?;
    for (name, description, value) in config.fields() {
        let sample = match style::to_ansi(&value) {
            ansi if ansi.is_empty() => value.clone(),
            ansi => format!("{}{}\x1b[0m", ansi, value),
        };
        // Padding is applied before the escape codes so columns line up.
        let padding = " ".repeat(24usize.saturating_sub(value.len()));
        writeln!(out, "  {:<20} {}{} {}", name.cyan(), sample, padding, description.dimmed())?;
    }
    Ok(())
}

fn set_styles(assignments: &[String], out: &mut dyn Write) -> Result<()> {
    for assignment in assignments {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!(t!("styles.error.assignment"), assignment = assignment))?;
        style_config::set_style(key, value)?;
        log::info!("Style '{}' set to '{}'", key, value);
        writeln!(out, "{}", format!(t!("styles.info.set"), key = key).green())?;
    }
    Ok(())
}
