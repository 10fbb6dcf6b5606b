// src/cli/handlers/snippet.rs

use crate::cli::Host;
use crate::core::uid;
use crate::system::shell::Shell;
use anyhow::{Context, Result};
use std::io::Write;

/// Prints the script that registers the host program's completion in `shell`.
pub fn handle(host: &Host, shell: Shell, out: &mut dyn Write) -> Result<()> {
    let script = shell
        .snippet(host.name(), &uid::executable())
        .with_context(|| format!(t!("snippet.error.generate"), shell = shell))?;
    out.write_all(script.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;

    #[test]
    fn test_snippet_names_the_host_command() {
        let host = Host::new(clap::Command::new("demo"), Registry::new());
        let mut out = Vec::new();
        handle(&host, Shell::Fish, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("complete -c demo"));
    }

    #[test]
    fn test_json_has_no_snippet() {
        let host = Host::new(clap::Command::new("demo"), Registry::new());
        let mut out = Vec::new();
        assert!(handle(&host, Shell::Json, &mut out).is_err());
        assert!(out.is_empty());
    }
}
