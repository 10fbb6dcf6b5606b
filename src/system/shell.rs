// src/system/shell.rs

//! Shell-facing glue: the output format each shell's completion function
//! expects, and the snippet that installs that function.
//!
//! All encoders treat sentinel rows the same way: separators are dropped,
//! diagnostics are shown as messages instead of insertable candidates.

use crate::constants::COMPLETION_COMMAND;
use crate::core::invoked::InvokedAction;
use crate::core::style;
use crate::models::RawValue;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Bash directive bits, appended as the last output line (`:<bits>`).
///
/// The output carries a diagnostic.
pub const DIRECTIVE_ERROR: u8 = 1;
/// The candidate is not followed by a space.
pub const DIRECTIVE_NO_SPACE: u8 = 2;
/// Bash must not fall back to file completion.
pub const DIRECTIVE_NO_FILE_COMP: u8 = 4;

/// Errors producing shell snippets.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The shell has no completion function to install.
    #[error("No completion snippet exists for '{0}'")]
    NoSnippet(Shell),
    /// The name cannot be embedded in a shell script safely.
    #[error("Invalid command name '{0}': only letters, digits, '-', '_' and '.' are allowed")]
    InvalidCommandName(String),
}

/// A shell quiver can complete for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Shell {
    /// GNU Bash, via `complete -F`.
    Bash,
    /// Zsh, via `compdef`.
    Zsh,
    /// The fish shell.
    Fish,
    /// PowerShell, via `Register-ArgumentCompleter`.
    Powershell,
    /// Nushell, as an external completer.
    Nushell,
    /// The export format, for tooling and debugging.
    Json,
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::Powershell => "powershell",
            Self::Nushell => "nushell",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PowershellEntry {
    completion_text: String,
    list_item_text: String,
    tool_tip: String,
}

#[derive(Serialize)]
struct NushellEntry {
    value: String,
    description: String,
}

impl Shell {
    /// Formats `invoked` for this shell. `current` is the word being
    /// completed; shells without a message channel get it back as the value of
    /// diagnostic rows, so selecting one changes nothing.
    pub fn encode(&self, invoked: &InvokedAction, current: &str) -> String {
        let messages = invoked.messages();
        let candidates = || invoked.raw_values().iter().filter(|v| !v.is_sentinel());
        match self {
            Self::Bash => encode_bash(invoked, &messages, candidates()),
            Self::Zsh => encode_zsh(invoked, &messages, candidates()),
            Self::Fish => {
                let mut lines: Vec<String> = messages
                    .iter()
                    .map(|m| format!("{}\tERR: {}", current, m))
                    .collect();
                lines.extend(candidates().map(|v| tab_separated(&v.value, &v.description)));
                lines.join("\n")
            }
            Self::Powershell => {
                let suffix = if invoked.nospace() { "" } else { " " };
                let mut entries: Vec<PowershellEntry> = messages
                    .iter()
                    .map(|m| PowershellEntry {
                        completion_text: current.to_string(),
                        list_item_text: format!("ERR: {}", m),
                        tool_tip: (*m).to_string(),
                    })
                    .collect();
                entries.extend(candidates().map(|v| PowershellEntry {
                    completion_text: format!("{}{}", v.value, suffix),
                    list_item_text: styled_display(v),
                    // An empty tooltip is rejected by CompletionResult.
                    tool_tip: if v.description.is_empty() {
                        v.display.clone()
                    } else {
                        v.description.clone()
                    },
                }));
                to_json(&entries)
            }
            Self::Nushell => {
                let mut entries: Vec<NushellEntry> = messages
                    .iter()
                    .map(|m| NushellEntry {
                        value: current.to_string(),
                        description: format!("ERR: {}", m),
                    })
                    .collect();
                entries.extend(candidates().map(|v| NushellEntry {
                    value: v.value.clone(),
                    description: v.description.clone(),
                }));
                to_json(&entries)
            }
            Self::Json => invoked.export_json(),
        }
    }

    /// The script registering `<executable> _quiver <shell> ...` as the
    /// completer of `command_name`.
    ///
    /// # Errors
    /// [`ShellError::NoSnippet`] for [`Shell::Json`];
    /// [`ShellError::InvalidCommandName`] for names that cannot be safely
    /// embedded in a shell function name.
    pub fn snippet(&self, command_name: &str, executable: &str) -> Result<String, ShellError> {
        let valid = |s: &str| {
            !s.is_empty()
                && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(command_name) {
            return Err(ShellError::InvalidCommandName(command_name.to_string()));
        }
        if !valid(executable) {
            return Err(ShellError::InvalidCommandName(executable.to_string()));
        }
        let func = command_name.replace(['-', '.'], "_");
        let (name, exe, comp) = (command_name, executable, COMPLETION_COMMAND);

        let script = match self {
            Self::Bash => format!(
                r#"_{func}_completion() {{
  local line="${{COMP_LINE:0:$COMP_POINT}}"
  local -a words
  read -ra words <<< "$line"
  [[ "$line" =~ [[:space:]]$ ]] && words+=("")
  local cur="${{words[-1]}}"

  local output directive
  output="$({exe} {comp} bash "${{words[@]}}" 2>/dev/null)"
  directive="${{output##*$'\n'}}"
  if [[ "$output" == *$'\n'* ]]; then output="${{output%$'\n'*}}"; else output=""; fi
  directive="${{directive#:}}"
  [[ "$directive" =~ ^[0-9]+$ ]] || directive=0

  local -a lines=()
  [[ -n "$output" ]] && mapfile -t lines <<< "$output"
  COMPREPLY=()
  if (( directive & {err} )); then
    printf '\n%s' "${{lines[@]}}" >&2
    return
  fi
  (( directive & {nospace} )) && compopt -o nospace
  local entry value
  for entry in "${{lines[@]}}"; do
    value="${{entry%%$'\t'*}}"
    [[ "$value" == "$cur"* ]] && COMPREPLY+=("$value")
  done
}}
complete -F _{func}_completion {name}
"#,
                err = DIRECTIVE_ERROR,
                nospace = DIRECTIVE_NO_SPACE,
            ),
            Self::Zsh => format!(
                r#"#compdef {name}
function _{func}_completion {{
  local -a lines
  lines=("${{(@f)$({exe} {comp} zsh "${{(@)words[1,CURRENT]}}" 2>/dev/null)}}")
  local mode="${{lines[1]}}"
  shift lines
  if [[ "$mode" == error ]]; then
    _message -r "${{(F)lines}}"
    return 1
  fi
  if [[ "$mode" == nospace ]]; then
    _describe 'values' lines -S ''
  else
    _describe 'values' lines
  fi
}}
compdef _{func}_completion {name}
"#
            ),
            Self::Fish => format!(
                r#"function __{func}_completion
    set -l words (commandline -opc) (commandline -ct)
    {exe} {comp} fish $words 2>/dev/null
end
complete -e -c {name}
complete -c {name} -f -a '(__{func}_completion)'
"#
            ),
            Self::Powershell => format!(
                r#"using namespace System.Management.Automation
using namespace System.Management.Automation.Language
Function _{func}_completer {{
    param($wordToComplete, $commandAst)
    $elems = $commandAst.CommandElements | ForEach-Object {{
        $t = $_.Extent.Text
        if ($t.StartsWith("'")) {{ $t = $t.Substring(1) }}
        if ($t.Length -gt 0 -and $t.EndsWith("'")) {{ $t = $t.Substring(0, $t.Length - 1) }}
        if ($t.Length -eq 0) {{ $t = '""' }}
        $t
    }}
    if (!$wordToComplete) {{ $elems = @($elems) + '""' }}

    $completions = @(
        {exe} {comp} powershell @elems | ConvertFrom-Json | ForEach-Object {{
            [CompletionResult]::new($_.CompletionText, $_.ListItemText, [CompletionResultType]::ParameterValue, $_.ToolTip)
        }}
    )
    if ($completions.Count -eq 0) {{
        return ""
    }}
    $completions
}}
Register-ArgumentCompleter -Native -CommandName '{name}' -ScriptBlock (Get-Item "Function:_{func}_completer").ScriptBlock
"#
            ),
            Self::Nushell => format!(
                r#"module completions {{
    def "nu-complete {name}" [line: string, pos: int] {{
        $line | str substring ..$pos | split row " " | {exe} {comp} nushell ...$in | from json
    }}

    export extern "{name}" [
        ...args: string@"nu-complete {name}"
    ]
}}
use completions *
"#
            ),
            Self::Json => return Err(ShellError::NoSnippet(*self)),
        };
        Ok(script)
    }
}

fn encode_bash<'a>(
    invoked: &InvokedAction,
    messages: &[&str],
    candidates: impl Iterator<Item = &'a RawValue>,
) -> String {
    let mut directive = DIRECTIVE_NO_FILE_COMP;
    if invoked.nospace() {
        directive |= DIRECTIVE_NO_SPACE;
    }
    let mut lines: Vec<String> = if messages.is_empty() {
        candidates.map(|v| tab_separated(&v.value, &v.description)).collect()
    } else {
        directive |= DIRECTIVE_ERROR;
        messages.iter().map(|m| (*m).to_string()).collect()
    };
    lines.push(format!(":{}", directive));
    lines.join("\n")
}

fn encode_zsh<'a>(
    invoked: &InvokedAction,
    messages: &[&str],
    candidates: impl Iterator<Item = &'a RawValue>,
) -> String {
    let mut lines = Vec::new();
    if messages.is_empty() {
        lines.push(if invoked.nospace() { "nospace" } else { "space" }.to_string());
        lines.extend(candidates.map(|v| {
            let value = v.value.replace('\\', "\\\\").replace(':', "\\:");
            if v.description.is_empty() {
                value
            } else {
                format!("{}:{}", value, single_line(&v.description))
            }
        }));
    } else {
        lines.push("error".to_string());
        lines.extend(messages.iter().map(|m| single_line(m)));
    }
    lines.join("\n")
}

fn tab_separated(value: &str, description: &str) -> String {
    if description.is_empty() {
        value.to_string()
    } else {
        format!("{}\t{}", value, single_line(description))
    }
}

/// Line based formats cannot carry newlines inside a field.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn styled_display(value: &RawValue) -> String {
    match style::to_ansi(&value.style) {
        ansi if ansi.is_empty() => value.display.clone(),
        ansi => format!("{}{}\x1b[0m", ansi, value.display),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::debug!("Failed to encode completions: {}", e);
        "[]".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(nospace: bool) -> InvokedAction {
        InvokedAction::new(
            vec![
                RawValue::described("a:b", "first\nline"),
                RawValue::separator(""),
                RawValue::new("c"),
            ],
            nospace,
            false,
        )
    }

    fn failed() -> InvokedAction {
        InvokedAction::new(vec![RawValue::diagnostic("boom", "red")], false, true)
    }

    #[test]
    fn test_bash_lines_and_directive() {
        assert_eq!(Shell::Bash.encode(&sample(true), ""), "a:b\tfirst line\nc\n:6");
        assert_eq!(Shell::Bash.encode(&failed(), ""), "boom\n:5");
        assert_eq!(
            Shell::Bash.encode(&InvokedAction::default(), ""),
            format!(":{}", DIRECTIVE_NO_FILE_COMP)
        );
    }

    #[test]
    fn test_zsh_escapes_colons() {
        assert_eq!(Shell::Zsh.encode(&sample(false), ""), "space\na\\:b:first line\nc");
        assert_eq!(Shell::Zsh.encode(&failed(), ""), "error\nboom");
    }

    #[test]
    fn test_fish_shows_diagnostics_against_current_word() {
        assert_eq!(Shell::Fish.encode(&failed(), "cur"), "cur\tERR: boom");
        assert_eq!(Shell::Fish.encode(&sample(false), ""), "a:b\tfirst line\nc");
    }

    #[test]
    fn test_powershell_json() {
        let out = Shell::Powershell.encode(&sample(false), "");
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["CompletionText"], "a:b ");
        assert_eq!(parsed[0]["ToolTip"], "first\nline");
        assert_eq!(parsed[1]["ToolTip"], "c");
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_nushell_json() {
        let out = Shell::Nushell.encode(&failed(), "x");
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["value"], "x");
        assert_eq!(parsed[0]["description"], "ERR: boom");
    }

    #[test]
    fn test_json_is_export_format() {
        let out = Shell::Json.encode(&sample(true), "");
        assert!(out.contains("\"Nospace\":true"));
        assert!(out.contains("\"RawValues\""));
    }

    #[test]
    fn test_snippets_reference_executable() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::Powershell, Shell::Nushell] {
            let script = shell.snippet("my-app", "my-app-bin").unwrap();
            assert!(script.contains("my-app-bin _quiver"), "{shell}: {script}");
        }
        assert!(matches!(Shell::Json.snippet("a", "b"), Err(ShellError::NoSnippet(Shell::Json))));
        assert!(matches!(
            Shell::Bash.snippet("a;rm", "b"),
            Err(ShellError::InvalidCommandName(_))
        ));
    }
}
