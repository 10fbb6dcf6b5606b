// src/cli/handlers/cache.rs

use crate::cli::Host;
use crate::core::cache::CacheStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::fs;
use std::io::Write;
use std::time::{Duration, SystemTime};

// --- Command Argument Parsing ---

/// (Internal) Inspect or clear the completion cache of the host program.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, hide = true)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Lists cache entries with their age and number of values.
    Inspect {
        /// Also prints the cached values as JSON.
        #[arg(long)]
        values: bool,
    },
    /// Deletes the whole cache directory.
    Clear {
        /// Skips the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

// --- Main Handler ---

/// Runs `_quiver cache ...`.
pub fn handle(_host: &Host, args: Vec<String>, out: &mut dyn Write) -> Result<()> {
    let cache_args = CacheArgs::try_parse_from(&args)?;
    let store = CacheStore::default_location().context(t!("cache.error.location"))?;

    match cache_args.command {
        CacheSubcommand::Inspect { values } => inspect_cache(&store, values, out),
        CacheSubcommand::Clear { yes } => clear_cache(&store, yes, out),
    }
}

// --- Subcommand Logic ---

fn inspect_cache(store: &CacheStore, show_values: bool, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "  {:<15} {}", "Cache Path:".blue(), store.root().display())?;

    let entries = store.entries()?;
    if entries.is_empty() {
        writeln!(out, "{}", t!("cache.info.empty").yellow())?;
        return Ok(());
    }

    for path in entries {
        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map_or_else(|| "?".to_string(), |age| format!("{}s", age.as_secs()));

        // Inspection ignores expiry; timeouts belong to the call sites.
        match store.load(&path, Duration::MAX) {
            Ok(values) => {
                writeln!(
                    out,
                    "  {} ({} values, {} old)",
                    path.display(),
                    values.len().to_string().green(),
                    age
                )?;
                if show_values {
                    let json = serde_json::to_string_pretty(&values)
                        .context("Failed to serialize cache data to JSON.")?;
                    writeln!(out, "{}", json)?;
                }
            }
            Err(e) => writeln!(out, "  {} ({})", path.display(), e.to_string().red())?,
        }
    }
    Ok(())
}

fn clear_cache(store: &CacheStore, yes: bool, out: &mut dyn Write) -> Result<()> {
    if !store.root().exists() {
        writeln!(out, "{}", t!("cache.info.empty").yellow())?;
        return Ok(());
    }

    if !yes
        && !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(t!("cache.prompt.clear"), path = store.root().display()))
            .default(false)
            .interact()?
    {
        writeln!(out, "{}", t!("common.info.operation_cancelled"))?;
        return Ok(());
    }

    if store.clear()? {
        log::info!("Cleared completion cache at '{}'", store.root().display());
        writeln!(out, "{}", t!("cache.info.cleared").green())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawValue;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_lists_entries() {
        colored::control::set_override(false);
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let file = store.file("site", &["k".into()]).unwrap();
        store.write(&file, &vec![RawValue::new("a"), RawValue::new("b")]).unwrap();

        let mut out = Vec::new();
        inspect_cache(&store, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2 values"));
        assert!(text.contains("\"Value\": \"a\""));
    }

    #[test]
    fn test_clear_with_yes_removes_store() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache"));
        let file = store.file("site", &[]).unwrap();
        store.write(&file, &vec![RawValue::new("a")]).unwrap();

        let mut out = Vec::new();
        clear_cache(&store, true, &mut out).unwrap();
        assert!(!store.root().exists());
    }
}
