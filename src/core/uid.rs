// src/core/uid.rs
//
// Stable identifiers used as registry keys. They depend only on command names,
// so they are the same across runs and independent of registration order.

use std::env;
use std::path::Path;

/// Identifier of a command given its path from the root (`["git", "remote"]`
/// becomes `_git__remote`).
pub fn command<S: AsRef<str>>(path: &[S]) -> String {
    let names: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    format!("_{}", names.join("__"))
}

/// Identifier of a flag (by long name, or short name when it has none).
pub fn flag(command_uid: &str, name: &str) -> String {
    format!("{}##{}", command_uid, name)
}

/// Identifier of the positional argument at `index`.
pub fn positional(command_uid: &str, index: usize) -> String {
    format!("{}#{}", command_uid, index)
}

/// Identifier of the catch-all positional completion of a command.
pub fn positional_any(command_uid: &str) -> String {
    format!("{}#*", command_uid)
}

/// Identifier of the positional at `index` after a `--` separator.
pub fn dash(command_uid: &str, index: usize) -> String {
    format!("{}#--#{}", command_uid, index)
}

/// Identifier of the catch-all completion after a `--` separator.
pub fn dash_any(command_uid: &str) -> String {
    format!("{}#--#*", command_uid)
}

/// The file name of the running executable, used in snippets and cache paths.
pub fn executable() -> String {
    env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        // A shell snippet that calls `echo` fails harmlessly.
        .unwrap_or_else(|| "echo".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_uid_joins_path() {
        assert_eq!(command(&["example"]), "_example");
        assert_eq!(command(&["example", "action", "sub"]), "_example__action__sub");
    }

    #[test]
    fn test_flag_and_positional_uids_do_not_overlap() {
        let cmd = command(&["example"]);
        let ids = [
            flag(&cmd, "1"),
            positional(&cmd, 1),
            positional_any(&cmd),
            dash(&cmd, 1),
            dash_any(&cmd),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
